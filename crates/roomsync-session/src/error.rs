//! Error types for the session layer.

/// Errors that can occur while editing the local identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The confirmed nickname is empty after trimming.
    #[error("nickname must not be empty")]
    EmptyNickname,

    /// The confirmed nickname is longer than allowed.
    #[error("nickname is longer than {max} characters")]
    NicknameTooLong { max: usize },
}
