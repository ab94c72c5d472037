//! Error types for pbsync-build

use crate::syntax::Position;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{pos}: {message}")]
    Syntax { pos: Position, message: String },
}

impl Error {
    pub(crate) fn syntax(pos: Position, message: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            message: message.into(),
        }
    }

    /// Location of the error in the source text.
    pub fn position(&self) -> Position {
        match self {
            Self::Syntax { pos, .. } => *pos,
        }
    }

    /// The message without the position prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. } => message,
        }
    }
}
