//! Consumes the scanner's result stream and fans out one rate-paced
//! probe -> normalize -> upsert pipeline per open target.

use anyhow::Result;
use certs_sqlite::{CertRecord, Db};
use certwho_core::ratelimiter::RateLimiter;
use certwho_core::{PortState, ScanResult};
use port_scan::ScanOptions;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sized to absorb scanner bursts: the scanner must never be blocked by slow
/// certificate work downstream.
const RESULT_CHANNEL_CAPACITY: usize = 100_000;

/// Run the scanner and dispatch one pipeline task per open result. There is
/// no upper bound on in-flight pipelines; only their start is paced, so with
/// slow handshakes more than `rate` of them can be in flight at once.
/// Per-target network failures are logged and dropped; the first store
/// failure fails the run once in-flight pipelines have finished.
pub async fn run_scan(db: Arc<Mutex<Db>>, opts: ScanOptions) -> Result<()> {
    let limiter = RateLimiter::new(opts.rate);
    let per_target = opts.timeout;
    let range = opts.range.clone();

    let (tx, mut rx) = mpsc::channel::<ScanResult>(RESULT_CHANNEL_CAPACITY);
    let scanner = tokio::spawn(port_scan::scan_range(opts, tx));

    let mut pipelines = Vec::new();
    while let Some(result) = rx.recv().await {
        match result.state {
            PortState::Open => {
                let limiter = limiter.clone();
                let db = db.clone();
                pipelines.push(tokio::spawn(async move {
                    pipeline(limiter, db, result.addr, result.port, per_target).await
                }));
            }
            PortState::Closed => info!("{} port {} closed", result.addr, result.port),
            PortState::Other => debug!("{} port {} filtered or unreachable", result.addr, result.port),
        }
    }

    let mut first_store_err = None;
    for p in pipelines {
        if let Ok(Err(e)) = p.await {
            first_store_err.get_or_insert(e);
        }
    }

    // The scanner's single terminal error slot: an early stop is logged, it
    // does not invalidate anything already stored.
    if let Ok(Err(e)) = scanner.await {
        warn!("unable to scan {}: {e:#}", range);
    }

    match first_store_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn pipeline(
    limiter: RateLimiter,
    db: Arc<Mutex<Db>>,
    addr: IpAddr,
    port: u16,
    per_target: Duration,
) -> Result<()> {
    // Pacing gates the start of the probe, not its completion.
    limiter.acquire().await;
    info!("{} port {} open", addr, port);

    let leaf = match tls_probe::probe(addr, port, per_target).await {
        Ok(leaf) => leaf,
        Err(e) => {
            warn!("{e}");
            return Ok(());
        }
    };
    let fields = match tls_probe::normalize(leaf.as_ref()) {
        Ok(fields) => fields,
        Err(e) => {
            warn!("unparseable certificate from {}:{}: {e:#}", addr, port);
            return Ok(());
        }
    };

    let record = CertRecord {
        host: addr.to_string(),
        port,
        dns_names: fields.dns_names,
        emails: fields.emails,
        ip_addrs: fields.ip_addrs,
        uris: fields.uris,
        subject_names: fields.subject_names,
    };
    // One independent upsert per probe; the store is the only serialization
    // point and a store error is fatal for the run. A panicked sibling task
    // must not wedge the store for everyone else, so ignore poisoning.
    db.lock().unwrap_or_else(|e| e.into_inner()).upsert_cert(&record)
}
