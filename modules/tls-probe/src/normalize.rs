//! Flattens a leaf certificate's multi-valued identity fields into
//! space-joined text columns. Deliberately lossy: no escaping, no structure,
//! in exchange for plain substring/LIKE search over single columns.

use anyhow::{anyhow, Result};
use std::net::IpAddr;
use x509_parser::extensions::GeneralName;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::prelude::*;

/// The five derived text columns of a certificate record. Empty lists
/// flatten to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertFields {
    pub dns_names: String,
    pub emails: String,
    pub ip_addrs: String,
    pub uris: String,
    pub subject_names: String,
}

/// Parse a leaf certificate (DER) and flatten its SAN entries and subject
/// attributes.
pub fn normalize(leaf_der: &[u8]) -> Result<CertFields> {
    let (_, cert) = X509Certificate::from_der(leaf_der)
        .map_err(|e| anyhow!("failed to parse leaf certificate: {}", e))?;

    let mut dns_names = Vec::new();
    let mut emails = Vec::new();
    let mut ip_addrs = Vec::new();
    let mut uris = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(d) => dns_names.push(d.to_string()),
                GeneralName::RFC822Name(m) => emails.push(m.to_string()),
                GeneralName::IPAddress(b) => {
                    if let Some(ip) = ip_from_octets(b) {
                        ip_addrs.push(ip.to_string());
                    }
                }
                GeneralName::URI(u) => uris.push(u.to_string()),
                _ => {}
            }
        }
    }

    Ok(CertFields {
        dns_names: dns_names.join(" "),
        emails: emails.join(" "),
        ip_addrs: ip_addrs.join(" "),
        uris: uris.join(" "),
        subject_names: render_subject(cert.subject()),
    })
}

/// SAN iPAddress octets to canonical textual form. Anything that is not a
/// well-formed v4/v6 address is dropped.
fn ip_from_octets(octets: &[u8]) -> Option<IpAddr> {
    match octets.len() {
        4 => <[u8; 4]>::try_from(octets).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(octets).ok().map(IpAddr::from),
        _ => None,
    }
}

/// Render every subject attribute as `ABBREV=value`, space-joined. Unknown
/// attribute types fall back to the dotted OID; non-string values to a lossy
/// UTF-8 reading of the raw bytes.
fn render_subject(subject: &X509Name<'_>) -> String {
    let mut parts = Vec::new();
    for attr in subject.iter_attributes() {
        let kind = match oid2abbrev(attr.attr_type(), oid_registry()) {
            Ok(abbrev) => abbrev.to_string(),
            Err(_) => attr.attr_type().to_id_string(),
        };
        let value = match attr.as_str() {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(attr.attr_value().data).into_owned(),
        };
        parts.push(format!("{}={}", kind, value));
    }
    parts.join(" ")
}
