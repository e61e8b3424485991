//! TCP and UDP probing of a single address against the sample ladder.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use chrono::Utc;
use tokio::net::{TcpSocket, UdpSocket};
use tracing::debug;

use crate::domain::{PortScanResult, Protocol, SampleLadder, ScanRequest};
use crate::error::{Error, Result};

/// Probes every port of a [`SampleLadder`] on one address.
///
/// Ports are walked strictly in ladder order, one at a time. Concurrency
/// across addresses is the caller's business (see `ProbeWorker`).
///
/// A failed probe never fails the scan: it is recorded as a closed port.
/// Only failing to create a socket aborts, with [`Error::Resource`].
#[derive(Debug, Clone, Default)]
pub struct ProbeEngine {
    ladder: SampleLadder,
    connect_timeout: Option<Duration>,
}

impl ProbeEngine {
    /// Create an engine probing `ladder` with the platform's connect timeout.
    pub fn new(ladder: SampleLadder) -> Self {
        Self {
            ladder,
            connect_timeout: None,
        }
    }

    /// Bound each TCP connect attempt. `None` keeps the platform default.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn ladder(&self) -> &SampleLadder {
        &self.ladder
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Run the probe for `protocol`.
    pub async fn scan(&self, protocol: Protocol, request: &ScanRequest) -> Result<Vec<PortScanResult>> {
        match protocol {
            Protocol::Tcp => self.scan_tcp(request).await,
            Protocol::Udp => self.scan_udp(request).await,
        }
    }

    /// Attempt a TCP connection to every ladder port.
    ///
    /// A completed connect marks the port open; refusal, timeout or any other
    /// error marks it closed.
    pub async fn scan_tcp(&self, request: &ScanRequest) -> Result<Vec<PortScanResult>> {
        validate(request)?;
        debug!(address = %request.address, scan_id = %request.scan_id, "TCP scan started");

        let scan_date = Utc::now();
        let mut results = Vec::with_capacity(self.ladder.len());

        for &port in self.ladder.ports() {
            let socket = match request.address {
                IpAddr::V4(_) => TcpSocket::new_v4(),
                IpAddr::V6(_) => TcpSocket::new_v6(),
            }
            .map_err(Error::Resource)?;

            let is_open = match self.connect(socket, SocketAddr::new(request.address, port)).await {
                Ok(()) => true,
                Err(source) => {
                    let err = Error::Transport {
                        address: request.address,
                        port,
                        source,
                    };
                    debug!(scan_id = %request.scan_id, "TCP probe failed: {}", err);
                    false
                }
            };

            results.push(PortScanResult::for_request(
                request,
                port,
                is_open,
                Protocol::Tcp,
                scan_date,
            ));
        }

        debug!(address = %request.address, open = count_open(&results), "TCP scan finished");
        Ok(results)
    }

    /// Send a one-byte datagram to every ladder port.
    ///
    /// A send that does not error marks the port open. No reply is awaited,
    /// so filtered or closed ports usually read as open.
    pub async fn scan_udp(&self, request: &ScanRequest) -> Result<Vec<PortScanResult>> {
        validate(request)?;
        debug!(address = %request.address, scan_id = %request.scan_id, "UDP scan started");

        let scan_date = Utc::now();
        let bind_addr = match request.address {
            IpAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            IpAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(bind_addr).await.map_err(Error::Resource)?;

        let mut results = Vec::with_capacity(self.ladder.len());
        for &port in self.ladder.ports() {
            let target = SocketAddr::new(request.address, port);
            let is_open = match socket.send_to(&[0u8], target).await {
                Ok(_) => true,
                Err(source) => {
                    let err = Error::Transport {
                        address: request.address,
                        port,
                        source,
                    };
                    debug!(scan_id = %request.scan_id, "UDP probe failed: {}", err);
                    false
                }
            };

            results.push(PortScanResult::for_request(
                request,
                port,
                is_open,
                Protocol::Udp,
                scan_date,
            ));
        }

        debug!(address = %request.address, open = count_open(&results), "UDP scan finished");
        Ok(results)
    }

    /// Connect and immediately drop the stream.
    async fn connect(&self, socket: TcpSocket, target: SocketAddr) -> io::Result<()> {
        let stream = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, socket.connect(target))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??,
            None => socket.connect(target).await?,
        };
        drop(stream);
        Ok(())
    }
}

/// Reject requests whose address is unset.
fn validate(request: &ScanRequest) -> Result<()> {
    if request.address.is_unspecified() {
        return Err(Error::InvalidArgument(format!(
            "scan request {} has no target address",
            request.scan_id
        )));
    }
    Ok(())
}

fn count_open(results: &[PortScanResult]) -> usize {
    results.iter().filter(|r| r.is_open).count()
}
