use certs_sqlite::{CertRecord, Db};
use std::thread;

fn rec(dns: &str, email: &str) -> CertRecord {
    CertRecord {
        host: "10.0.0.1".into(),
        port: 443,
        dns_names: dns.into(),
        emails: email.into(),
        ip_addrs: String::new(),
        uris: String::new(),
        subject_names: String::new(),
    }
}

/// Two writers hammering the same (host, port) key must leave exactly one
/// whole row behind: all columns from one write, none from the other.
#[test]
fn concurrent_same_key_upserts_never_tear() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("certwho-concurrent-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    Db::open_or_create(&path).unwrap();

    let a = rec("a.example.com", "a@example.com");
    let b = rec("b.example.com", "b@example.com");

    let writers: Vec<_> = [a.clone(), b.clone()]
        .into_iter()
        .map(|r| {
            let path = path.clone();
            thread::spawn(move || {
                let db = Db::open_or_create(&path).unwrap();
                for _ in 0..50 {
                    db.upsert_cert(&r).unwrap();
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let db = Db::open_or_create(&path).unwrap();
    let rows = db.query_by_host("10.0.0.1").unwrap();
    std::fs::remove_file(&path).ok();
    let wal = path.with_extension("db-wal");
    std::fs::remove_file(wal).ok();

    assert_eq!(rows.len(), 1);
    assert!(rows[0] == a || rows[0] == b, "torn row: {:?}", rows[0]);
}
