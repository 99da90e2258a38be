//! Yarn Sort - rule engine for a casual yarn-sorting puzzle
//!
//! Coloured yarn balls sit in stacks. The player drags the top ball of one
//! stack onto another until every target stack is full of a single colour.
//!
//! This crate holds the rules only:
//! - Tokens and capacity-bounded slots with stack discipline
//! - Reversible move history
//! - The puzzle state machine with win detection, scoring and hints
//! - Level catalogs
//!
//! # Architecture
//!
//! The engine is platform-agnostic. Rendering and input belong to a
//! presentation layer, which talks to [`PuzzleEngine`] through
//! [`PuzzleAction`]s, a [`HitTest`] and read-only [`PuzzleSnapshot`]s. It can
//! be compiled to:
//! - Native Rust for the session server
//! - WebAssembly for an in-browser game (feature `wasm`)
//!
//! # Modules
//!
//! - [`token`], [`slot`]: the data model
//! - [`history`]: undo stack
//! - [`game`]: the puzzle engine
//! - [`score`]: level scoring
//! - [`level`]: level definitions and catalogs
//! - [`layout`]: reference canvas geometry and hit-testing
//! - [`autoplay`]: automatic players and solver

pub mod actions;
pub mod autoplay;
pub mod game;
pub mod history;
pub mod layout;
pub mod level;
pub mod score;
pub mod slot;
pub mod token;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{Hint, PuzzleAction, PuzzleEvent};
pub use autoplay::{solve, AutoPlayer, Strategy};
pub use game::{PuzzleEngine, PuzzleError, PuzzlePhase, PuzzleSnapshot, SlotView, TokenView};
pub use history::{MoveHistory, MoveRecord};
pub use layout::{BoardLayout, HitTest, Point, Rect};
pub use level::{LevelCatalog, LevelDefinition, LevelSource, TokenPlacement};
pub use score::{compute_score, LevelResult, LevelScore};
pub use slot::{Slot, SlotId, SlotKind};
pub use token::{Color, Token, TokenId};
