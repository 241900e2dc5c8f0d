//! Display Name Value Object
//!
//! 表示名はポータル画面に出すユーザーの名前。ログイン識別子ではない
//! （ログインはメールアドレスで行う）ため、日本語を含む任意の文字を
//! 受け付ける。
//!
//! ## 不変条件
//! - NFKC正規化・trim後に空でない
//! - 1〜100文字
//! - 制御文字を含まない

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

pub const DISPLAY_NAME_MAX_LENGTH: usize = 100;

/// Error returned when display name validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayNameError {
    Empty,
    TooLong { length: usize, max: usize },
    ContainsControlCharacter,
}

impl fmt::Display for DisplayNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Display name cannot be empty"),
            Self::TooLong { length, max } => {
                write!(f, "Display name is too long ({length} chars, maximum {max})")
            }
            Self::ContainsControlCharacter => {
                write!(f, "Display name cannot contain control characters")
            }
        }
    }
}

impl std::error::Error for DisplayNameError {}

/// Validated, normalized display name
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new DisplayName from raw input (NFKC normalize, trim, validate)
    pub fn new(input: impl AsRef<str>) -> Result<Self, DisplayNameError> {
        let normalized = input.as_ref().nfkc().collect::<String>().trim().to_string();

        if normalized.is_empty() {
            return Err(DisplayNameError::Empty);
        }

        let length = normalized.chars().count();
        if length > DISPLAY_NAME_MAX_LENGTH {
            return Err(DisplayNameError::TooLong {
                length,
                max: DISPLAY_NAME_MAX_LENGTH,
            });
        }

        if normalized.chars().any(char::is_control) {
            return Err(DisplayNameError::ContainsControlCharacter);
        }

        Ok(Self(normalized))
    }

    /// Create from database value (assumes already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DisplayName").field(&self.0).finish()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = DisplayNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_unicode() {
        let name = DisplayName::new("橋本 花子").unwrap();
        assert_eq!(name.as_str(), "橋本 花子");
    }

    #[test]
    fn test_trims_and_normalizes() {
        let name = DisplayName::new("  Ｈanako  ").unwrap();
        // Full-width characters become ASCII after NFKC
        assert_eq!(name.as_str(), "Hanako");
    }

    #[test]
    fn test_empty_fails() {
        assert_eq!(DisplayName::new("   "), Err(DisplayNameError::Empty));
    }

    #[test]
    fn test_too_long_fails() {
        let input = "あ".repeat(DISPLAY_NAME_MAX_LENGTH + 1);
        assert!(matches!(
            DisplayName::new(&input),
            Err(DisplayNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_control_characters_fail() {
        assert_eq!(
            DisplayName::new("Alice\u{0}Bob"),
            Err(DisplayNameError::ContainsControlCharacter)
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let name = DisplayName::new("Alice").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Alice\"");
        let back: DisplayName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
