use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use std::net::IpAddr;
use tls_probe::normalize;

fn self_signed_der(params: CertificateParams) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    cert.der().to_vec()
}

#[test]
fn all_san_kinds_flatten_space_joined() {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, "internal.corp.local");
    params.distinguished_name.push(DnType::OrganizationName, "Corp");
    params.subject_alt_names = vec![
        SanType::DnsName("a.example.com".try_into().unwrap()),
        SanType::DnsName("b.example.com".try_into().unwrap()),
        SanType::Rfc822Name("admin@example.com".try_into().unwrap()),
        SanType::IpAddress("10.0.0.5".parse::<IpAddr>().unwrap()),
        SanType::URI("https://svc.example.com/path".try_into().unwrap()),
    ];

    let fields = normalize(&self_signed_der(params)).unwrap();
    assert_eq!(fields.dns_names, "a.example.com b.example.com");
    assert_eq!(fields.emails, "admin@example.com");
    assert_eq!(fields.ip_addrs, "10.0.0.5");
    assert_eq!(fields.uris, "https://svc.example.com/path");
    assert!(fields.subject_names.contains("CN=internal.corp.local"), "{:?}", fields.subject_names);
    assert!(fields.subject_names.contains("O=Corp"), "{:?}", fields.subject_names);
}

#[test]
fn empty_identity_yields_five_empty_strings() {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.subject_alt_names = Vec::new();

    let fields = normalize(&self_signed_der(params)).unwrap();
    assert_eq!(fields.dns_names, "");
    assert_eq!(fields.emails, "");
    assert_eq!(fields.ip_addrs, "");
    assert_eq!(fields.uris, "");
    assert_eq!(fields.subject_names, "");
}

#[test]
fn ipv6_san_uses_canonical_form() {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.subject_alt_names = vec![SanType::IpAddress("2001:db8::1".parse::<IpAddr>().unwrap())];

    let fields = normalize(&self_signed_der(params)).unwrap();
    assert_eq!(fields.ip_addrs, "2001:db8::1");
}
