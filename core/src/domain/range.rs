//! Contiguous address ranges derived from a CIDR block.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

/// Every address of one CIDR network, in ascending numeric order.
///
/// The range is finite and can be iterated any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    network: IpNetwork,
    first: u128,
    last: u128,
}

impl AddressRange {
    /// The range covering `network`. Host bits of the network's address are ignored.
    pub fn new(network: IpNetwork) -> Self {
        let (first, host_bits) = match network.network() {
            IpAddr::V4(base) => (u128::from(u32::from(base)), 32 - u32::from(network.prefix())),
            IpAddr::V6(base) => (u128::from(base), 128 - u32::from(network.prefix())),
        };
        let host_mask = if host_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << host_bits) - 1
        };
        Self {
            network,
            first,
            last: first | host_mask,
        }
    }

    pub fn network(&self) -> IpNetwork {
        self.network
    }

    pub fn first(&self) -> IpAddr {
        self.to_addr(self.first)
    }

    pub fn last(&self) -> IpAddr {
        self.to_addr(self.last)
    }

    /// Number of addresses in the range. Saturates at `u128::MAX` for `::/0`.
    pub fn len(&self) -> u128 {
        (self.last - self.first).saturating_add(1)
    }

    /// Never true: a CIDR block holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> AddressIter {
        AddressIter {
            v4: self.network.is_ipv4(),
            next: Some(self.first),
            last: self.last,
        }
    }

    fn to_addr(&self, value: u128) -> IpAddr {
        numeric_to_addr(self.network.is_ipv4(), value)
    }
}

impl IntoIterator for &AddressRange {
    type Item = IpAddr;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} - {})", self.network, self.first(), self.last())
    }
}

/// Iterator over an [`AddressRange`].
#[derive(Debug, Clone)]
pub struct AddressIter {
    v4: bool,
    next: Option<u128>,
    last: u128,
}

impl Iterator for AddressIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current == self.last {
            None
        } else {
            Some(current + 1)
        };
        Some(numeric_to_addr(self.v4, current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            None => (0, Some(0)),
            Some(next) => {
                let remaining = (self.last - next).checked_add(1);
                match remaining.and_then(|r| usize::try_from(r).ok()) {
                    Some(n) => (n, Some(n)),
                    None => (usize::MAX, None),
                }
            }
        }
    }
}

fn numeric_to_addr(v4: bool, value: u128) -> IpAddr {
    if v4 {
        // Values of an IPv4 range never exceed u32::MAX.
        IpAddr::V4(Ipv4Addr::from(value as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(value))
    }
}
