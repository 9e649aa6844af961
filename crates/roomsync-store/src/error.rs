/// Errors that can occur in the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    /// Callers treat this as transient; nothing retries automatically.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The operation is not allowed at this path (e.g. a write at the root).
    #[error("invalid path: {0}")]
    InvalidPath(String),
}
