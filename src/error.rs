use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// The mutation that failed, carried in [`StoreError::OperationFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Toggle,
    Edit,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Add => "add",
            Operation::Toggle => "toggle",
            Operation::Edit => "edit",
            Operation::Remove => "remove",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("session rejected, sign in again")]
    Unauthorized,
    #[error("no active session")]
    NoSession,
    #[error("todo list is not loaded yet")]
    NotReady,
    #[error("store was reset before the request completed")]
    Discarded,
    #[error("failed to load todos: {0}")]
    Load(GatewayError),
    #[error("{op} failed: {source}")]
    OperationFailed {
        op: Operation,
        #[source]
        source: GatewayError,
    },
}

impl StoreError {
    pub(crate) fn load(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => StoreError::Unauthorized,
            other => StoreError::Load(other),
        }
    }

    pub(crate) fn failed(op: Operation, err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => StoreError::Unauthorized,
            source => StoreError::OperationFailed { op, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be an http(s) URL, got `{value}`")]
    InvalidUrl { name: &'static str, value: String },
}
