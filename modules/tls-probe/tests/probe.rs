use rcgen::generate_simple_self_signed;
use rustls::pki_types::PrivateKeyDer;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

async fn spawn_tls_server() -> u16 {
    let _ = rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider());
    let signed = generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_der = signed.cert.der().clone();
    let key_der = PrivateKeyDer::Pkcs8(signed.key_pair.serialize_der().into());
    let server_cfg = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der)
        .expect("invalid cert/key");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let acceptor = TlsAcceptor::from(Arc::new(server_cfg));
    tokio::spawn(async move {
        if let Ok((stream, _peer)) = listener.accept().await {
            if let Ok(mut tls) = acceptor.accept(stream).await {
                let mut buf = [0u8; 64];
                let _ = tls.read(&mut buf).await;
            }
        }
    });
    port
}

#[tokio::test]
async fn untrusted_self_signed_cert_is_returned() {
    let port = spawn_tls_server().await;
    let addr: IpAddr = "127.0.0.1".parse().unwrap();
    let leaf = tls_probe::probe(addr, port, Duration::from_millis(2000))
        .await
        .expect("probe should succeed without trust evaluation");
    let fields = tls_probe::normalize(leaf.as_ref()).expect("leaf parses");
    assert!(
        fields.dns_names.contains("localhost"),
        "dns_names={:?}",
        fields.dns_names
    );
}

#[tokio::test]
async fn refused_port_is_a_dial_failure() {
    // Bind then drop to grab a port that is very likely refused.
    let probe_sock = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe_sock.local_addr().unwrap().port();
    drop(probe_sock);

    let addr: IpAddr = "127.0.0.1".parse().unwrap();
    let err = tls_probe::probe(addr, port, Duration::from_millis(500))
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, tls_probe::ProbeError::Dial { .. }), "got {:?}", err);
}

#[tokio::test]
async fn non_tls_service_is_a_handshake_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        if let Ok((mut stream, _peer)) = listener.accept().await {
            use tokio::io::AsyncWriteExt;
            let _ = stream.write_all(b"220 mail.example.com ESMTP\r\n").await;
        }
    });

    let addr: IpAddr = "127.0.0.1".parse().unwrap();
    let err = tls_probe::probe(addr, port, Duration::from_millis(2000))
        .await
        .expect_err("plaintext banner is not a TLS server");
    assert!(matches!(err, tls_probe::ProbeError::Handshake { .. }), "got {:?}", err);
}
