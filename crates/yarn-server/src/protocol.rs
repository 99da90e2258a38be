//! WebSocket protocol messages for Yarn Sort sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yarn_core::{Hint, LevelResult, PuzzleEvent, PuzzleSnapshot, SlotId, TokenId};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Load an unlocked level
    StartLevel { level: u32 },

    /// Move a top token onto another slot
    Move { token: TokenId, to: SlotId },

    /// Reverse the last move
    Undo,

    /// Restart the current level
    Reset,

    /// Advance to the next level
    NextLevel,

    /// Ask for a legal move
    Hint,

    /// Request the level list
    ListLevels,

    /// Request the current board
    GetState,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned session ID
    Welcome { session_id: Uuid },

    /// Current board
    State { snapshot: PuzzleSnapshot },

    /// Outcome of a command; rejected moves come back with no events
    ActionResult {
        accepted: bool,
        events: Vec<PuzzleEvent>,
    },

    /// Every target slot is full and uniform
    LevelComplete { result: LevelResult },

    /// There is no level after the last one
    AllLevelsComplete,

    /// A legal move
    HintResult { hint: Hint },

    /// The board has no legal move
    NoHint { message: String },

    /// Levels in the catalog with their lock state
    LevelList { levels: Vec<LevelInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Level information for the level-select screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub number: u32,
    pub name: String,
    pub target_slots: usize,
    pub temp_slots: usize,
    pub token_count: usize,
    pub unlocked: bool,
    pub current: bool,
}
