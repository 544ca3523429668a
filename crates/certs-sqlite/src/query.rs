use crate::{CertRecord, Db};
use anyhow::Result;
use rusqlite::Row;

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CertRecord> {
    Ok(CertRecord {
        host: row.get(0)?,
        port: row.get::<_, i64>(1)? as u16,
        dns_names: row.get(2)?,
        emails: row.get(3)?,
        ip_addrs: row.get(4)?,
        uris: row.get(5)?,
        subject_names: row.get(6)?,
    })
}

impl Db {
    /// Rows where any of the four identity text columns matches the
    /// `%`-wildcard pattern. LIKE collation is SQLite's default
    /// (case-insensitive ASCII).
    pub fn query_fields_like(&self, pattern: &str) -> Result<Vec<CertRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT host,port,dnsnames,emails,ipaddrs,uris,subnames FROM certs
             WHERE dnsnames LIKE ?1 OR emails LIKE ?1 OR uris LIKE ?1 OR subnames LIKE ?1",
        )?;
        let rows = stmt.query_map([pattern], record_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Exact-host lookup (all ports stored for that host).
    pub fn query_by_host(&self, host: &str) -> Result<Vec<CertRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT host,port,dnsnames,emails,ipaddrs,uris,subnames FROM certs WHERE host=?1",
        )?;
        let rows = stmt.query_map([host], record_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}
