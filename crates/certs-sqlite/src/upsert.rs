use crate::{CertRecord, Db};
use anyhow::Result;
use rusqlite::params;

impl Db {
    /// Full-row upsert keyed (host, port): a later successful probe of the
    /// same target overwrites every derived column. No merge, no history.
    pub fn upsert_cert(&self, rec: &CertRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO certs(host,port,dnsnames,emails,ipaddrs,uris,subnames) VALUES (?,?,?,?,?,?,?)
             ON CONFLICT(host,port) DO UPDATE SET dnsnames=excluded.dnsnames, emails=excluded.emails, ipaddrs=excluded.ipaddrs, uris=excluded.uris, subnames=excluded.subnames",
            params![rec.host, rec.port as i64, rec.dns_names, rec.emails, rec.ip_addrs, rec.uris, rec.subject_names],
        )?;
        Ok(())
    }
}
