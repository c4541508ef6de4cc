//! Error taxonomy for the orchestrator core.
//!
//! The Scheduler's isolation boundary catches every variant here and turns
//! it into a `WorkflowLog` row (`Failed` for the first four, `Error` for
//! `Internal`); no variant may abort a tick.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AreaError>;

#[derive(Debug, Error)]
pub enum AreaError {
    /// The workflow's `action_config`/`reaction_config` is missing a
    /// required field, or holds a value of the wrong shape.
    #[error("config error: {0}")]
    Config(String),

    /// No `UserServiceConnection` exists for the workflow's provider, or the
    /// stored token is expired and the refresh attempt failed.
    #[error("{service} not connected")]
    ConnectionMissing { service: String },

    /// A `ProviderClient` call returned a 4xx/5xx or a network failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The dispatcher received an `action.name`/`reaction.name` with no
    /// registered handler.
    #[error("Unknown action/reaction type: {0}")]
    UnknownKind(String),

    /// Any other failure escaping a Checker/Executor.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AreaError {
    pub fn config(msg: impl Into<String>) -> Self {
        AreaError::Config(msg.into())
    }

    pub fn connection_missing(service: impl Into<String>) -> Self {
        AreaError::ConnectionMissing {
            service: service.into(),
        }
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        AreaError::Provider(msg.into())
    }

    pub fn unknown_kind(name: impl Into<String>) -> Self {
        AreaError::UnknownKind(name.into())
    }
}
