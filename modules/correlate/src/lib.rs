//! Read-only correlation over the certificate store: free-text search,
//! bug-bounty wildcard-feed correlation, and IP reverse lookup for
//! virtual-host discovery.

use anyhow::{Context, Result};
use certs_sqlite::Db;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/arkadiyt/bounty-targets-data/master/data/wildcards.txt";

/// One row selected by free-text search. `fields` holds only the identity
/// columns that passed the stripped-token display test: selection and
/// display use different matching, so a selected row may carry no fields.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub host: String,
    pub fields: Vec<(&'static str, String)>,
}

/// A domain token extracted from a record stored under `ip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VhostHit {
    pub domain: String,
    pub ip: String,
    pub port: u16,
}

/// Selection: rows where any identity column contains `term` as a
/// `%`-wildcard-capable pattern. Display: for each selected row, keep the
/// columns whose raw text literally contains the alphanumeric-stripped term.
/// The two passes deliberately diverge and must stay separate.
pub fn search(db: &Db, term: &str) -> Result<Vec<SearchHit>> {
    let rows = db.query_fields_like(&format!("%{}%", term))?;
    let token = strip_display_token(term);
    let mut hits = Vec::with_capacity(rows.len());
    for rec in rows {
        let mut fields = Vec::new();
        for (name, text) in [
            ("dnsnames", rec.dns_names),
            ("emails", rec.emails),
            ("uris", rec.uris),
            ("subnames", rec.subject_names),
        ] {
            if text.contains(&token) {
                fields.push((name, text));
            }
        }
        hits.push(SearchHit { host: rec.host, fields });
    }
    Ok(hits)
}

/// Strip every non-alphanumeric character from a search term, producing the
/// token used for display containment.
pub fn strip_display_token(term: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new("[^a-zA-Z0-9]+").expect("display-token regex"));
    re.replace_all(term, "").into_owned()
}

/// Fetch the wildcard feed and correlate every line against the store. Feed
/// fetch failure is non-fatal (warn, no results); a store query failure
/// aborts the whole run.
pub async fn correlate(db: &Db, feed_url: &str) -> Result<Vec<String>> {
    let body = match fetch_feed(feed_url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("error pulling bugbounty data: {e:#}");
            return Ok(Vec::new());
        }
    };
    correlate_lines(db, body.lines())
}

async fn fetch_feed(url: &str) -> Result<String> {
    let resp = reqwest::get(url).await?.error_for_status()?;
    Ok(resp.text().await?)
}

/// One store query per feed line; hosts are emitted once per matching row
/// per line, not deduplicated across lines.
pub fn correlate_lines<'a>(db: &Db, lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
    let mut hosts = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for rec in db.query_fields_like(&feed_pattern(line))? {
            hosts.push(rec.host);
        }
    }
    Ok(hosts)
}

/// `*.example.com` -> `%.example.com%`: leading wildcards become the store's
/// multi-character token, and a trailing wildcard is appended.
pub fn feed_pattern(line: &str) -> String {
    let mut pattern = line.replace('*', "%");
    pattern.push('%');
    pattern
}

/// Read one IP per line and emit every domain-like token found in the
/// records stored under that exact host. Tokens are extracted in three
/// independent passes over dnsnames, subnames, and uris. File-open and
/// per-IP query failures are fatal; a line-scan error mid-file is logged
/// and cuts the run short.
pub fn reverse_lookup(db: &Db, ip_file: &Path) -> Result<Vec<VhostHit>> {
    let file = File::open(ip_file).with_context(|| format!("opening {}", ip_file.display()))?;
    let mut hits = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("error reading IPs from file: {e}");
                break;
            }
        };
        let ip = line.trim();
        if ip.is_empty() {
            continue;
        }
        for rec in db.query_by_host(ip)? {
            for field in [&rec.dns_names, &rec.subject_names, &rec.uris] {
                for domain in extract_domains(field) {
                    hits.push(VhostHit { domain, ip: ip.to_string(), port: rec.port });
                }
            }
        }
    }
    Ok(hits)
}

/// Domain-like tokens: dot-separated labels of 2-63 word characters.
pub fn extract_domains(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\w{2,63}\.)+\w{2,63}").expect("domain-token regex"));
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
