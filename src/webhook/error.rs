use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus is already running")]
    AlreadyRunning,
    #[error("bus is not running")]
    NotRunning,
    #[error("failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),
    #[error("request body exceeded the configured size limit")]
    PayloadTooLarge,
    #[error("no processor registered for tag '{0}'")]
    UnknownTag(String),
    #[error("webhook path is missing its tag segment")]
    MissingTag,
}

impl warp::reject::Reject for BusError {}
