//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Errors raised while preparing TLS for a port.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Certificate file not found: {0:?}")]
    CertNotFound(PathBuf),

    #[error("Private key file not found: {0:?}")]
    KeyNotFound(PathBuf),

    #[error("No certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("No private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("Failed to read TLS material from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn read_err(path: &Path) -> impl FnOnce(std::io::Error) -> TlsError {
    let path = path.to_path_buf();
    move |source| TlsError::Read { path, source }
}

/// Check that both files exist and hold PEM material of the right kind.
pub fn validate_pem_files(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::CertNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(TlsError::KeyNotFound(key_path.to_path_buf()));
    }

    let mut cert_reader = BufReader::new(File::open(cert_path).map_err(read_err(cert_path))?);
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err(cert_path))?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let mut key_reader = BufReader::new(File::open(key_path).map_err(read_err(key_path))?);
    if rustls_pemfile::private_key(&mut key_reader)
        .map_err(read_err(key_path))?
        .is_none()
    {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    Ok(())
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    validate_pem_files(cert_path, key_path)?;

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|source| TlsError::Read {
            path: cert_path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAKE_CERT: &str = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";

    #[test]
    fn missing_files_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cert = tmp.path().join("server.crt");
        let key = tmp.path().join("server.key");

        assert!(matches!(validate_pem_files(&cert, &key), Err(TlsError::CertNotFound(_))));

        std::fs::write(&cert, FAKE_CERT).unwrap();
        assert!(matches!(validate_pem_files(&cert, &key), Err(TlsError::KeyNotFound(_))));
    }

    #[test]
    fn files_without_pem_blocks_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cert = tmp.path().join("server.crt");
        let key = tmp.path().join("server.key");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        assert!(matches!(validate_pem_files(&cert, &key), Err(TlsError::NoCertificates(_))));

        std::fs::write(&cert, FAKE_CERT).unwrap();
        assert!(matches!(validate_pem_files(&cert, &key), Err(TlsError::NoPrivateKey(_))));
    }
}
