use serde::{Deserialize, Serialize};

/// One harvested certificate identity, keyed by (host, port). Every derived
/// field is a whitespace-joined flattening of the matching certificate list;
/// an empty list flattens to "".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRecord {
    pub host: String,
    pub port: u16,
    pub dns_names: String,
    pub emails: String,
    pub ip_addrs: String,
    pub uris: String,
    pub subject_names: String,
}
