//! Shared types for the certificate harvester: scan results produced by the
//! reachability scanner and the rate limiter pacing probe launches.

pub mod ratelimiter;

use std::net::IpAddr;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Reachability state of a single (address, port) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Open,
    Closed,
    /// Timed out or failed in a way that says nothing about the service
    /// (filtered, unreachable, ...).
    Other,
}

/// One result from the reachability scanner. Ephemeral: consumed by the
/// dispatcher, never stored.
#[derive(Debug, Clone, Copy)]
pub struct ScanResult {
    pub addr: IpAddr,
    pub port: u16,
    pub state: PortState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn scan_result_is_copy() {
        let r = ScanResult { addr: "10.0.0.1".parse().unwrap(), port: 443, state: PortState::Open };
        let r2 = r;
        assert_eq!(r.port, r2.port);
        assert_eq!(r.state, PortState::Open);
    }
}
