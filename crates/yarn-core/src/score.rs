//! Level scoring.

use serde::{Deserialize, Serialize};

/// Score before penalties
pub const BASE_SCORE: u32 = 1000;

/// Penalty per move taken
pub const MOVE_PENALTY: u32 = 5;

/// Cap on the total move penalty
pub const MAX_MOVE_PENALTY: u32 = 500;

/// Floor applied before the level bonus
pub const MIN_SCORE: u32 = 100;

/// Bonus per level number
pub const LEVEL_BONUS: u32 = 100;

/// Extra moves allowed over the level number for a perfect clear
pub const PERFECT_MOVE_ALLOWANCE: u32 = 5;

/// Bonus for a perfect clear
pub const PERFECT_BONUS: u32 = 500;

/// Result of scoring one completed level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScore {
    pub score: u32,
    pub is_perfect: bool,
}

/// Score a level solved in `move_count` moves.
pub fn compute_score(move_count: u32, level_number: u32) -> LevelScore {
    let moves_penalty = move_count.saturating_mul(MOVE_PENALTY).min(MAX_MOVE_PENALTY);
    let level_bonus = level_number.saturating_mul(LEVEL_BONUS);
    let is_perfect = move_count <= level_number.saturating_add(PERFECT_MOVE_ALLOWANCE);

    let mut score = (BASE_SCORE - moves_penalty)
        .max(MIN_SCORE)
        .saturating_add(level_bonus);
    if is_perfect {
        score = score.saturating_add(PERFECT_BONUS);
    }

    LevelScore { score, is_perfect }
}

/// What the player sees on the level-complete screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub level: u32,
    pub moves_taken: u32,
    pub score: u32,
    pub is_perfect: bool,
}
