//! Parsing of registration input into concrete address ranges.

use std::net::IpAddr;

use ipnetwork::IpNetwork;

use crate::domain::AddressRange;
use crate::error::{Error, Result};

/// Turns a start address plus prefix length into the set of addresses it covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationValidator;

impl RegistrationValidator {
    /// Expand `start/cidr` into every address of that block, ascending.
    ///
    /// Host bits of `start` are masked off, so `10.0.0.5` with prefix 30
    /// covers `10.0.0.4` to `10.0.0.7`. Fails with [`Error::MalformedRange`]
    /// if `start` is not an address or the prefix is out of range for its
    /// family.
    pub fn expand(start: &str, cidr: i64) -> Result<AddressRange> {
        let address: IpAddr = start.trim().parse().map_err(|_| {
            Error::MalformedRange(format!("'{}' is not a valid IP address", start))
        })?;

        let max_prefix = if address.is_ipv4() { 32 } else { 128 };
        let prefix = u8::try_from(cidr)
            .ok()
            .filter(|p| i64::from(*p) <= max_prefix)
            .ok_or_else(|| {
                Error::MalformedRange(format!(
                    "prefix length {} is out of range 0-{} for {}",
                    cidr, max_prefix, address
                ))
            })?;

        let network = IpNetwork::new(address, prefix)
            .map_err(|e| Error::MalformedRange(format!("{}/{}: {}", start, cidr, e)))?;

        Ok(AddressRange::new(network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_slash_30() {
        let range = RegistrationValidator::expand("10.0.0.0", 30).unwrap();
        let addrs: Vec<String> = range.iter().map(|a| a.to_string()).collect();
        assert_eq!(addrs, vec!["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_expand_masks_host_bits() {
        let range = RegistrationValidator::expand("10.0.0.5", 30).unwrap();
        assert_eq!(range.first().to_string(), "10.0.0.4");
        assert_eq!(range.last().to_string(), "10.0.0.7");
    }

    #[test]
    fn test_count_matches_prefix() {
        for prefix in [24i64, 28, 31, 32] {
            let range = RegistrationValidator::expand("192.168.10.0", prefix).unwrap();
            assert_eq!(range.len(), 1u128 << (32 - prefix));
        }
        let range = RegistrationValidator::expand("fd00::", 120).unwrap();
        assert_eq!(range.len(), 256);
    }

    #[test]
    fn test_ascending_without_duplicates() {
        let addrs: Vec<IpAddr> = RegistrationValidator::expand("172.16.4.0", 27)
            .unwrap()
            .iter()
            .collect();
        assert_eq!(addrs.len(), 32);
        assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_malformed_input() {
        for (start, cidr) in [
            ("not-an-ip", 24),
            ("10.0.0.0", 33),
            ("10.0.0.0", -1),
            ("::1", 129),
            ("", 8),
        ] {
            let err = RegistrationValidator::expand(start, cidr).unwrap_err();
            assert!(matches!(err, Error::MalformedRange(_)), "{start}/{cidr}");
        }
    }
}
