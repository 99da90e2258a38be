//! Commands a presentation layer can issue, and the events they produce.

use crate::score::LevelResult;
use crate::slot::SlotId;
use crate::token::TokenId;
use serde::{Deserialize, Serialize};

/// All commands the engine accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleAction {
    /// Move a top token onto another slot
    Move { token: TokenId, to: SlotId },
    /// Reverse the most recent move
    Undo,
    /// Reload the current level
    Reset,
    /// Load the level after the current one
    NextLevel,
    /// Jump to an unlocked level
    SelectLevel(u32),
    /// Ask for a legal move
    Hint,
}

/// A legal move: `token` is the top of `source` and `destination` accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub source: SlotId,
    pub token: TokenId,
    pub destination: SlotId,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleEvent {
    /// A token moved between slots
    TokenMoved {
        token: TokenId,
        from: SlotId,
        to: SlotId,
    },

    /// The last move was reversed; `from`/`to` describe the reversal itself
    MoveUndone {
        token: TokenId,
        from: SlotId,
        to: SlotId,
    },

    /// A level was (re)loaded
    LevelLoaded { level: u32, name: String },

    /// Every target slot is complete; score finalized
    LevelCompleted(LevelResult),

    /// A legal move exists
    HintFound(Hint),

    /// No legal move anywhere on the board
    NoHintAvailable,

    /// The level sequence is exhausted
    AllLevelsComplete,
}
