//! TCP reachability scanner: expands an address range, paces connect
//! attempts to a target rate, and streams per-target open/closed results.

use anyhow::{anyhow, Result};
use certwho_core::ratelimiter::RateLimiter;
use certwho_core::{PortState, ScanResult};
use ipnet::IpNet;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// CIDR (e.g. 10.0.0.0/24), single address, or hostname.
    pub range: String,
    pub ports: Vec<u16>,
    /// Connect attempts per second.
    pub rate: u32,
    pub timeout: Duration,
}

/// Parse a comma-separated list of ports/ranges (e.g., "443", "22,80,443", "8000-8100").
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();
    for part in spec.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let s: u16 = start.parse()?;
            let e: u16 = end.parse()?;
            if s == 0 || e == 0 || s > e {
                return Err(anyhow!("invalid port range: {}", part));
            }
            ports.extend(s..=e);
        } else {
            let p: u16 = part.parse()?;
            if p == 0 {
                return Err(anyhow!("invalid port: {}", part));
            }
            ports.push(p);
        }
    }
    if ports.is_empty() {
        return Err(anyhow!("no ports in spec: {}", spec));
    }
    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

/// Expand a CIDR, single address, or hostname into target addresses.
pub fn expand_range(range: &str) -> Result<Vec<IpAddr>> {
    if range.contains('/') {
        let net: IpNet = range.parse()?;
        let ips: Vec<IpAddr> = net.hosts().collect();
        if ips.is_empty() {
            return Err(anyhow!("range {} contains no host addresses", range));
        }
        return Ok(ips);
    }
    if let Ok(ip) = range.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }
    // best-effort hostname resolution
    let mut it = (range, 0u16)
        .to_socket_addrs()
        .map_err(|e| anyhow!("failed to resolve {}: {}", range, e))?;
    it.next()
        .map(|sa| vec![sa.ip()])
        .ok_or_else(|| anyhow!("failed to resolve {}", range))
}

/// Sweep every (address, port) pair at the configured rate, sending one
/// `ScanResult` per attempt on `tx`. The stream closes when every attempt
/// has finished; the returned `Result` is the scanner's single terminal
/// error slot (only range expansion can populate it).
pub async fn scan_range(opts: ScanOptions, tx: mpsc::Sender<ScanResult>) -> Result<()> {
    let ips = expand_range(&opts.range)?;
    let limiter = RateLimiter::new(opts.rate);

    let mut handles = Vec::with_capacity(ips.len() * opts.ports.len());
    for ip in ips {
        for &port in &opts.ports {
            let limiter = limiter.clone();
            let tx = tx.clone();
            let per_attempt = opts.timeout;
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                let state = connect_state(ip, port, per_attempt).await;
                let _ = tx.send(ScanResult { addr: ip, port, state }).await;
            }));
        }
    }
    drop(tx);
    for h in handles {
        let _ = h.await;
    }
    Ok(())
}

async fn connect_state(ip: IpAddr, port: u16, per_attempt: Duration) -> PortState {
    let addr = SocketAddr::new(ip, port);
    match timeout(per_attempt, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => PortState::Open,
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => PortState::Closed,
        Ok(Err(_)) | Err(_) => PortState::Other,
    }
}
