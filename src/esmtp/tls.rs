//! TLS acceptor construction for the dedicated ESMTP TLS port (§4.2, §5).
//! Adapted from the teacher's `load_tls_acceptor`, which loaded a
//! certificate chain and private key with `rustls-pemfile` and built a
//! `tokio_rustls::TlsAcceptor` from a `rustls::ServerConfig`.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::esmtp::error::SmtpError;

pub fn load_tls_acceptor(cert_file: &str, key_file: &str) -> Result<TlsAcceptor, SmtpError> {
    let cert_chain = load_certs(cert_file)?;
    let private_key = load_private_key(key_file)?;

    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|e| SmtpError::Tls(format!("invalid certificate/key pair: {e}")))?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, SmtpError> {
    let file = File::open(path).map_err(|e| SmtpError::Tls(format!("failed to open cert file {path}: {e}")))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SmtpError::Tls(format!("failed to parse cert file {path}: {e}")))
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, SmtpError> {
    let file = File::open(path).map_err(|e| SmtpError::Tls(format!("failed to open key file {path}: {e}")))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| SmtpError::Tls(format!("failed to parse key file {path}: {e}")))?
        .ok_or_else(|| SmtpError::Tls(format!("no private key found in {path}")))
}
