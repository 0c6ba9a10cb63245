//! Collection sweep errors

use thiserror::Error;

/// Error produced by one collection sweep
#[derive(Debug, Error)]
pub enum CollectError {
    /// The sweep context was cancelled mid-iteration
    #[error("collection sweep cancelled")]
    Cancelled,

    /// One or more callbacks failed; the sweep still ran every live callback
    #[error("{} callback error(s): {}", .errors.len(), .errors.join("; "))]
    Callbacks { errors: Vec<String> },
}
