use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),
    #[error("tls configuration error: {0}")]
    Tls(String),
    #[error("session io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message exceeded the configured size limit")]
    MessageTooLarge,
    #[error("malformed command: {0}")]
    MalformedCommand(String),
}
