use anyhow::Result;
use certs_sqlite::Db;
use clap::{CommandFactory, Parser};
use port_scan::ScanOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod config;
mod dispatch;

#[derive(Debug, Parser)]
#[command(
    name = "certwho",
    version,
    about = "Harvest TLS certificate identities from open ports and correlate them"
)]
struct Cli {
    /// IP/CIDR range to scan
    #[arg(short = 'r', long)]
    range: Option<String>,
    /// Comma separated ports
    #[arg(short = 'p', long, default_value = "443")]
    ports: String,
    /// Timeout in milliseconds per probe
    #[arg(short = 't', long, default_value_t = 300)]
    timeout_ms: u64,
    /// Target probes per second
    #[arg(short = 'c', long, default_value_t = 500)]
    rate: u32,
    /// Run a search query on the database
    #[arg(short = 's', long)]
    search: Option<String>,
    /// Print the domains stored for a list of IPs (one per line)
    #[arg(short = 'd', long, value_name = "FILE")]
    ip_list: Option<PathBuf>,
    /// Search: print only hosts
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    /// Correlate stored hosts against the bug-bounty wildcard feed
    #[arg(short = 'b', long, default_value_t = false)]
    bounty: bool,
    /// Database path
    #[arg(long, default_value = "certwho.db")]
    db: PathBuf,
    /// Bug-bounty wildcard feed URL
    #[arg(long, default_value = correlate::DEFAULT_FEED_URL)]
    feed_url: String,
    /// Optional config file (YAML). If omitted, loads ./certwho.yaml if present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Search(String),
    Bounty,
    Reverse(PathBuf),
    Scan(String),
}

/// Modes are mutually exclusive with fixed precedence: search, bounty,
/// reverse lookup, scan. None selected means usage.
fn select_mode(cli: &Cli) -> Option<Mode> {
    if let Some(term) = &cli.search {
        return Some(Mode::Search(term.clone()));
    }
    if cli.bounty {
        return Some(Mode::Bounty);
    }
    if let Some(file) = &cli.ip_list {
        return Some(Mode::Reverse(file.clone()));
    }
    cli.range.as_ref().map(|r| Mode::Scan(r.clone()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .without_time()
        .init();

    let mut cli = Cli::parse();
    if let Some(cfg) = config::load_config(cli.config.as_deref()) {
        if let Some(s) = &cfg.scan {
            if let Some(p) = &s.ports { cli.ports = p.clone(); }
            if let Some(t) = s.timeout_ms { cli.timeout_ms = t; }
            if let Some(r) = s.rate { cli.rate = r; }
        }
        if let Some(db) = &cfg.db { cli.db = db.clone(); }
        if let Some(url) = &cfg.feed_url { cli.feed_url = url.clone(); }
    }

    let Some(mode) = select_mode(&cli) else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match mode {
        Mode::Search(term) => {
            let db = Db::open(&cli.db)?;
            for hit in correlate::search(&db, &term)? {
                if cli.quiet {
                    println!("{}", hit.host);
                } else {
                    println!("{} :", hit.host);
                    for (_name, text) in hit.fields {
                        println!("\t{}", text);
                    }
                }
            }
        }
        Mode::Bounty => {
            let db = Db::open(&cli.db)?;
            let rt = tokio::runtime::Runtime::new()?;
            for host in rt.block_on(correlate::correlate(&db, &cli.feed_url))? {
                println!("{}", host);
            }
        }
        Mode::Reverse(file) => {
            let db = Db::open(&cli.db)?;
            for hit in correlate::reverse_lookup(&db, &file)? {
                println!("{},{},{}", hit.domain, hit.ip, hit.port);
            }
        }
        Mode::Scan(range) => {
            let ports = port_scan::parse_ports(&cli.ports)?;
            let db = Arc::new(Mutex::new(Db::open_or_create(&cli.db)?));
            let opts = ScanOptions {
                range,
                ports,
                rate: cli.rate,
                timeout: Duration::from_millis(cli.timeout_ms),
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(dispatch::run_scan(db, opts))?;
        }
    }
    Ok(())
}
