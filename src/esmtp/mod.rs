//! The ESMTP Interceptor (C5, §4.2). A raw line-oriented SMTP listener,
//! plaintext on `esmtp.port` and (optionally) TLS-wrapped on a dedicated
//! `esmtp.tls_port` — STARTTLS is advertised but refused on the plaintext
//! port so the transport doesn't need to swap stream types mid-session.
//! The listener-spawn-with-graceful-shutdown shape mirrors the teacher's
//! TCP listener task.

pub mod error;
mod session;
mod tls;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

pub use error::SmtpError;

use crate::config::EsmtpConfig;
use crate::processor::esmtp::EsmtpProcessor;

pub struct Server {
    config: EsmtpConfig,
    processor: Arc<EsmtpProcessor>,
    running: AtomicBool,
    shutdown_tx: std::sync::Mutex<Option<oneshot::Sender<()>>>,
    local_addr: std::sync::Mutex<Option<SocketAddr>>,
}

impl Server {
    pub fn new(config: EsmtpConfig, processor: Arc<EsmtpProcessor>) -> Self {
        Self {
            config,
            processor,
            running: AtomicBool::new(false),
            shutdown_tx: std::sync::Mutex::new(None),
            local_addr: std::sync::Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<(), SmtpError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let plain_addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| SmtpError::Tls("invalid bind address".to_string()))?;
        let plain_listener = TcpListener::bind(plain_addr)
            .await
            .map_err(|e| SmtpError::Bind(plain_addr, e))?;
        *self.local_addr.lock().unwrap() = plain_listener.local_addr().ok();

        let (tx, mut rx) = oneshot::channel();
        *self.shutdown_tx.lock().unwrap() = Some(tx);

        let config = self.config.clone();
        let processor = self.processor.clone();
        info!(%plain_addr, "esmtp interceptor listening");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    accepted = plain_listener.accept() => {
                        match accepted {
                            Ok((stream, peer)) => {
                                let config = config.clone();
                                let processor = processor.clone();
                                tokio::spawn(async move { handle_plain_connection(stream, peer, config, processor).await });
                            }
                            Err(e) => warn!(error = %e, "esmtp accept failed"),
                        }
                    }
                }
            }
        });

        if self.config.enable_tls {
            self.start_tls_listener().await?;
        }

        Ok(())
    }

    async fn start_tls_listener(&self) -> Result<(), SmtpError> {
        let (cert_file, key_file) = match (&self.config.cert_file, &self.config.key_file) {
            (Some(c), Some(k)) => (c.clone(), k.clone()),
            _ => return Err(SmtpError::Tls("enable_tls is set but cert_file/key_file are missing".to_string())),
        };
        let tls_port = self.config.tls_port.unwrap_or(self.config.port + 1);
        let tls_addr: SocketAddr = format!("{}:{}", self.config.host, tls_port)
            .parse()
            .map_err(|_| SmtpError::Tls("invalid tls bind address".to_string()))?;

        let acceptor = tls::load_tls_acceptor(&cert_file, &key_file)?;
        let listener = TcpListener::bind(tls_addr).await.map_err(|e| SmtpError::Bind(tls_addr, e))?;

        let config = self.config.clone();
        let processor = self.processor.clone();
        info!(%tls_addr, "esmtp tls interceptor listening");

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        let acceptor = acceptor.clone();
                        let config = config.clone();
                        let processor = processor.clone();
                        tokio::spawn(async move {
                            match acceptor.accept(stream).await {
                                Ok(tls_stream) => handle_tls_connection(tls_stream, peer, config, processor).await,
                                Err(e) => warn!(error = %e, %peer, "tls handshake failed"),
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "esmtp tls accept failed"),
                }
            }
        });

        Ok(())
    }

    pub fn stop(&self) -> Result<(), SmtpError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(tx) = self.shutdown_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
        Ok(())
    }

    /// The address actually bound by the plaintext listener. `None` until
    /// `start()` has completed; useful for tests that bind to port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }
}

async fn handle_plain_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    config: EsmtpConfig,
    processor: Arc<EsmtpProcessor>,
) {
    debug!(%peer, "esmtp connection accepted");
    let mut session = session::Session::new(stream, config, false, processor);
    drive_session(&mut session, peer).await;
}

async fn handle_tls_connection(
    stream: tokio_rustls::server::TlsStream<tokio::net::TcpStream>,
    peer: SocketAddr,
    config: EsmtpConfig,
    processor: Arc<EsmtpProcessor>,
) {
    debug!(%peer, "esmtp tls connection accepted");
    let mut session = session::Session::new(stream, config, true, processor);
    drive_session(&mut session, peer).await;
}

/// Submission to the community client happens inside the session itself, at
/// `DATA` time, so the `250`/`451` reply can reflect the outcome — all that's
/// left here is accounting for how many messages the connection accepted.
async fn drive_session<S>(session: &mut session::Session<S>, peer: SocketAddr)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    match session.run().await {
        Ok(vectors) => {
            debug!(%peer, accepted = vectors.len(), "esmtp session closed");
        }
        Err(e) => error!(%peer, error = %e, "esmtp session ended with error"),
    }
}
