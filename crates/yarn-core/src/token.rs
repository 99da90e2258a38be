//! Yarn tokens and their identifiers.
//!
//! Tokens live in a per-level arena owned by the engine. A token never owns
//! its slot: `containing_slot` is a plain [`SlotId`] kept in step with the
//! slot's own sequence.

use crate::slot::SlotId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a token: its creation order within the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub usize);

impl TokenId {
    /// Index into the engine's token arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque colour category. Level files use CSS hex strings, but nothing in
/// the rules interprets the value beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single ball of yarn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub color: Color,
    /// Slot currently holding this token, if any
    pub containing_slot: Option<SlotId>,
    /// Set while the presentation layer is dragging the token. Not a rule input.
    pub is_being_moved: bool,
}

impl Token {
    pub fn new(id: TokenId, color: Color) -> Self {
        Self {
            id,
            color,
            containing_slot: None,
            is_being_moved: false,
        }
    }

    /// Creation order within the level
    pub fn original_index(&self) -> usize {
        self.id.0
    }
}
