//! Token Kind Value Object
//!
//! Every signed token carries its kind; verification fails closed when
//! the expected kind does not match.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The two credential kinds the token service issues
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived, sent with each API request
    #[display("access")]
    Access,
    /// Longer-lived, exchanged for a new pair; bound to a revocable session
    #[display("refresh")]
    Refresh,
}

impl TokenKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}
