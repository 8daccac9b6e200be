//! Error types for the searchd client.
use std::io;

use thiserror::Error;

/// Failures a client call can surface.
///
/// Server warnings are not errors; they are carried on the returned
/// [`ResultSet`](crate::ResultSet) or [`Reply`](crate::protocol::Reply).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller supplied parameters were rejected before any I/O took place.
    #[error("{0}")]
    Validation(String),

    #[error("connection to {addr} failed: {source}")]
    Network {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The daemon spoke something this client does not understand.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("searchd error: {0}")]
    Server(String),

    /// The daemon asked for a retry; the client reports it and does not retry.
    #[error("temporary searchd error: {0}")]
    Retry(String),

    #[error("incomplete reply")]
    IncompleteReply,
}

impl ClientError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        ClientError::Validation(reason.into())
    }

    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        ClientError::Protocol(reason.into())
    }
}

/// Ensures `condition` holds, otherwise fails with a validation error.
pub(crate) fn ensure(condition: bool, reason: &str) -> Result<(), ClientError> {
    if condition {
        Ok(())
    } else {
        Err(ClientError::validation(reason))
    }
}
