//! TLS certificate prober: dial, handshake without trust evaluation, and
//! hand back the peer's leaf certificate.

pub mod normalize;

pub use normalize::{normalize, CertFields};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timeout on {addr}:{port}: {source}")]
    Dial {
        addr: IpAddr,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("cert failed on {addr}:{port}: {source}")]
    Handshake {
        addr: IpAddr,
        port: u16,
        #[source]
        source: io::Error,
    },
}

/// Dial `addr:port` and run a TLS client handshake with trust verification
/// disabled (this is a reconnaissance aid, not a trust validator). No SNI is
/// sent: the server name is the bare IP, so name-based virtual hosts may
/// answer with an unrelated default certificate. Returns the leaf (first)
/// certificate of the peer chain. No retries; failure is terminal for the
/// target.
pub async fn probe(
    addr: IpAddr,
    port: u16,
    per_target: Duration,
) -> Result<CertificateDer<'static>, ProbeError> {
    let sock = SocketAddr::new(addr, port);
    let stream = timeout(per_target, TcpStream::connect(sock))
        .await
        .map_err(|e| ProbeError::Dial { addr, port, source: io::Error::new(io::ErrorKind::TimedOut, e) })?
        .map_err(|e| ProbeError::Dial { addr, port, source: e })?;

    let connector = TlsConnector::from(insecure_config().clone());
    let server_name = ServerName::IpAddress(addr.into());
    let tls = timeout(per_target, connector.connect(server_name, stream))
        .await
        .map_err(|e| ProbeError::Handshake { addr, port, source: io::Error::new(io::ErrorKind::TimedOut, e) })?
        .map_err(|e| ProbeError::Handshake { addr, port, source: e })?;

    let (_, conn) = tls.get_ref();
    let leaf = conn
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| ProbeError::Handshake {
            addr,
            port,
            source: io::Error::new(io::ErrorKind::InvalidData, "server presented no certificate"),
        })?;
    Ok(leaf.clone().into_owned())
}

fn insecure_config() -> &'static Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        // Ensure a crypto provider is installed (ring)
        let _ = rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerify))
            .with_no_client_auth();
        Arc::new(config)
    })
}

/// Accepts any server certificate; the whole point is to read it.
#[derive(Debug)]
struct NoVerify;

impl ServerCertVerifier for NoVerify {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
        ]
    }
}
