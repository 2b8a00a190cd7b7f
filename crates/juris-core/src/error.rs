//! Typed errors surfaced by the core library.

use thiserror::Error;

/// Everything that can go wrong while exchanging one query with the
/// answering service. The UI collapses all of these into one fallback reply.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("answering service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode answer: {0}")]
    Decode(String),

    /// The background task running the request died before reporting.
    #[error("request task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}' (expected naive, advanced or compare)")]
pub struct ParseModeError(pub String);
