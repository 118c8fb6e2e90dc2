//! Error taxonomy (§7). Each subsystem owns a `thiserror` enum in the same
//! style as the teacher's `MqttProtocolError`/`OperatorError`; this module
//! only holds the top-level aggregate used by `main` and the input manager.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("bus error: {0}")]
    Bus(#[from] crate::webhook::BusError),

    #[error("esmtp error: {0}")]
    Esmtp(#[from] crate::esmtp::SmtpError),

    #[error("community client error: {0}")]
    Community(#[from] crate::ai::CommunityError),
}
