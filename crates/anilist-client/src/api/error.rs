//! Errors surfaced by the API layer.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The endpoint answered with a non-success status, or not at all
    #[error("no data returned for {operation}")]
    NoData { operation: String },

    /// The endpoint answered but reported GraphQL errors
    #[error("{operation} failed: {messages}")]
    GraphQl { operation: String, messages: String },

    /// The operation needs an access token
    #[error("{0} requires a logged-in user")]
    NotAuthenticated(&'static str),
}
