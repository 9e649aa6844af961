//! Draft-then-confirm nickname editing.
//!
//! The edit flow keeps a draft separate from the live nickname:
//!
//! ```text
//! set_draft("Jo") ──→ confirm() ──→ nickname = "Jo"
//!        │
//!        └──────────→ cancel()  ──→ draft reverts to nickname
//! ```

use crate::{Identity, SessionError};

/// Longest nickname accepted, in characters.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// Edits the nickname of an [`Identity`].
#[derive(Debug)]
pub struct NicknameEditor {
    identity: Identity,
    draft: String,
}

impl NicknameEditor {
    /// Starts editing with the draft equal to the current nickname.
    pub fn new(identity: Identity) -> Self {
        let draft = identity.nickname();
        Self { identity, draft }
    }

    /// Returns `true` when the participant has not chosen a nickname yet,
    /// i.e. the caller should prompt for one.
    pub fn needs_nickname(&self) -> bool {
        !self.identity.has_nickname()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Makes the trimmed draft the live nickname.
    ///
    /// # Errors
    /// - [`SessionError::EmptyNickname`] if the draft is blank.
    /// - [`SessionError::NicknameTooLong`] if it exceeds
    ///   [`MAX_NICKNAME_CHARS`].
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        let nickname = self.draft.trim().to_string();
        if nickname.is_empty() {
            return Err(SessionError::EmptyNickname);
        }
        if nickname.chars().count() > MAX_NICKNAME_CHARS {
            return Err(SessionError::NicknameTooLong {
                max: MAX_NICKNAME_CHARS,
            });
        }
        self.draft.clone_from(&nickname);
        self.identity.replace_nickname(nickname);
        tracing::info!(
            participant = %self.identity.participant_id(),
            nickname = %self.draft,
            "nickname changed"
        );
        Ok(())
    }

    /// Throws the draft away.
    pub fn cancel(&mut self) {
        self.draft = self.identity.nickname();
    }
}
