//! Puzzle engine.
//!
//! `PuzzleEngine` is the only owner of slots, tokens and move history. Every
//! public call either applies completely or leaves the state as it was.

use crate::actions::{Hint, PuzzleAction, PuzzleEvent};
use crate::history::{MoveHistory, MoveRecord};
use crate::layout::{HitTest, Point};
use crate::level::{LevelDefinition, LevelSource};
use crate::score::{compute_score, LevelResult};
use crate::slot::{Slot, SlotId, SlotKind};
use crate::token::{Color, Token, TokenId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

/// Per-level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzlePhase {
    /// No level populated yet
    Loading,
    /// Accepting moves
    Playing,
    /// All targets complete and score finalized. Terminal until the next load.
    Complete,
}

/// Errors raised by the engine
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PuzzleError {
    #[error("Destination cannot accept that token")]
    InvalidMove,

    #[error("Slot is empty")]
    EmptyState,

    #[error("No level {level}: the level sequence is exhausted")]
    LevelNotFound { level: u32 },

    #[error("Level {level} is malformed: {reason}")]
    MalformedLevel { level: u32, reason: String },

    #[error("Level {level} is locked")]
    LevelLocked { level: u32 },

    #[error("No legal move available")]
    HintUnavailable,

    #[error("No level loaded")]
    NoLevelLoaded,

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// Read-only view of one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub id: TokenId,
    pub color: Color,
    pub being_moved: bool,
}

/// Read-only view of one slot, tokens bottom to top
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: SlotId,
    pub kind: SlotKind,
    pub capacity: usize,
    pub required_color: Option<Color>,
    pub complete: bool,
    pub tokens: Vec<TokenView>,
}

/// Everything a presentation layer needs to draw the board and HUD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSnapshot {
    pub level: u32,
    pub level_name: String,
    pub phase: PuzzlePhase,
    pub move_count: u32,
    pub score: u32,
    pub total_score: u32,
    pub completed_levels: u32,
    pub targets: Vec<SlotView>,
    pub temps: Vec<SlotView>,
    pub result: Option<LevelResult>,
    pub can_undo: bool,
}

/// The puzzle state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleEngine {
    /// Current 1-based level number, 0 before the first load
    level: u32,
    level_name: String,
    phase: PuzzlePhase,
    targets: Vec<Slot>,
    temps: Vec<Slot>,
    tokens: Vec<Token>,
    history: MoveHistory,
    /// Moves and undos taken on this level
    move_count: u32,
    /// Finalized score of this level, 0 until complete
    score: u32,
    result: Option<LevelResult>,
    total_score: u32,
    completed_levels: u32,
    highest_completed: u32,
}

/// Freshly built per-level collections, swapped in as a unit
struct LevelArena {
    targets: Vec<Slot>,
    temps: Vec<Slot>,
    tokens: Vec<Token>,
}

impl LevelArena {
    fn build(number: u32, definition: &LevelDefinition) -> Result<Self, PuzzleError> {
        definition.validate(number)?;

        let capacity = definition.slot_capacity;
        let targets: Vec<Slot> = (0..definition.target_slots)
            .map(|i| Slot::new(SlotId::target(i), capacity, definition.required_color(i).cloned()))
            .collect();
        let mut temps: Vec<Slot> = (0..definition.temp_slots)
            .map(|i| Slot::new(SlotId::temporary(i), capacity, None))
            .collect();

        let mut tokens = Vec::with_capacity(definition.tokens.len());
        for (index, placement) in definition.tokens.iter().enumerate() {
            let mut token = Token::new(TokenId(index), placement.color.clone());
            let slot = definition
                .start_slot_of(placement)
                .and_then(|i| temps.get_mut(i))
                .ok_or_else(|| PuzzleError::MalformedLevel {
                    level: number,
                    reason: format!("token {} has no temporary slot", index),
                })?;
            slot.push(&mut token).map_err(|e| PuzzleError::MalformedLevel {
                level: number,
                reason: format!("token {} cannot be placed: {}", index, e),
            })?;
            tokens.push(token);
        }

        Ok(Self {
            targets,
            temps,
            tokens,
        })
    }
}

impl PuzzleEngine {
    /// An engine with no level loaded
    pub fn new() -> Self {
        Self {
            level: 0,
            level_name: String::new(),
            phase: PuzzlePhase::Loading,
            targets: Vec::new(),
            temps: Vec::new(),
            tokens: Vec::new(),
            history: MoveHistory::new(),
            move_count: 0,
            score: 0,
            result: None,
            total_score: 0,
            completed_levels: 0,
            highest_completed: 0,
        }
    }

    // ==================== Queries ====================

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    pub fn phase(&self) -> PuzzlePhase {
        self.phase
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Finalized score of the current level (0 until complete)
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Sum of every finalized level score in this session
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    /// Score shown in the HUD
    pub fn displayed_score(&self) -> u32 {
        self.total_score.saturating_add(self.score)
    }

    pub fn completed_levels(&self) -> u32 {
        self.completed_levels
    }

    pub fn result(&self) -> Option<LevelResult> {
        self.result
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn targets(&self) -> &[Slot] {
        &self.targets
    }

    pub fn temps(&self) -> &[Slot] {
        &self.temps
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        match id.kind {
            SlotKind::Target => self.targets.get(id.index),
            SlotKind::Temporary => self.temps.get(id.index),
        }
    }

    /// Every slot: targets then temporaries, each in index order
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.targets.iter().chain(self.temps.iter())
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots().map(|s| s.id)
    }

    /// Whether `token` is the top of the slot holding it
    pub fn is_top(&self, token: TokenId) -> bool {
        self.token(token)
            .and_then(|t| t.containing_slot)
            .and_then(|id| self.slot(id))
            .is_some_and(|slot| slot.peek_top() == Some(token))
    }

    /// Level `number` may be selected once the level before it has been cleared.
    pub fn is_level_unlocked(&self, number: u32) -> bool {
        number >= 1 && number <= self.highest_completed + 1
    }

    // ==================== Level Loading ====================

    /// Replace the whole puzzle with level `number` from `source`.
    ///
    /// On failure nothing changes, including the current phase.
    pub fn load_level<S: LevelSource + ?Sized>(
        &mut self,
        source: &S,
        number: u32,
    ) -> Result<(), PuzzleError> {
        let definition = source
            .level(number)
            .ok_or(PuzzleError::LevelNotFound { level: number })?;
        self.load_definition(number, definition)
    }

    /// Replace the whole puzzle with `definition`, numbered `number`.
    pub fn load_definition(
        &mut self,
        number: u32,
        definition: &LevelDefinition,
    ) -> Result<(), PuzzleError> {
        debug!("Loading level {}", number);
        let arena = LevelArena::build(number, definition)?;

        self.phase = PuzzlePhase::Loading;
        self.level = number;
        self.level_name = definition.name.clone();
        self.targets = arena.targets;
        self.temps = arena.temps;
        self.tokens = arena.tokens;
        self.history.clear();
        self.move_count = 0;
        self.score = 0;
        self.result = None;
        self.phase = PuzzlePhase::Playing;

        info!(
            "Level {} loaded: {} target slots, {} temporary slots, {} tokens",
            number,
            self.targets.len(),
            self.temps.len(),
            self.tokens.len()
        );
        debug_assert!(self.check_invariants().is_ok());
        Ok(())
    }

    /// Reload the current level from scratch
    pub fn reset<S: LevelSource + ?Sized>(&mut self, source: &S) -> Result<(), PuzzleError> {
        if self.level == 0 {
            return Err(PuzzleError::NoLevelLoaded);
        }
        self.load_level(source, self.level)
    }

    /// Load the level after the current one, once it is unlocked
    pub fn next_level<S: LevelSource + ?Sized>(&mut self, source: &S) -> Result<(), PuzzleError> {
        let next = self.next_level_number()?;
        self.load_level(source, next)
    }

    fn next_level_number(&self) -> Result<u32, PuzzleError> {
        let next = self.level.saturating_add(1);
        if self.level != 0 && !self.is_level_unlocked(next) {
            return Err(PuzzleError::LevelLocked { level: next });
        }
        Ok(next)
    }

    /// Load `number` if it is unlocked
    pub fn select_level<S: LevelSource + ?Sized>(
        &mut self,
        source: &S,
        number: u32,
    ) -> Result<(), PuzzleError> {
        if !self.is_level_unlocked(number) {
            return Err(PuzzleError::LevelLocked { level: number });
        }
        self.load_level(source, number)
    }

    // ==================== Moves ====================

    /// Token under `pos`, if it is the top of its slot. Marks it as being moved.
    pub fn pick_up<H: HitTest + ?Sized>(&mut self, pos: Point, hit: &H) -> Option<TokenId> {
        if self.phase != PuzzlePhase::Playing {
            return None;
        }
        let token = hit.token_at(self, pos)?;
        if !self.is_top(token) {
            return None;
        }
        // only one token is held at a time
        self.cancel_drag();
        self.tokens.get_mut(token.index())?.is_being_moved = true;
        Some(token)
    }

    /// Drop a picked-up token on whatever slot is under `pos`. Tokens that
    /// were not picked up are ignored.
    pub fn drop_at<H: HitTest + ?Sized>(&mut self, token: TokenId, pos: Point, hit: &H) -> bool {
        if !self.token(token).is_some_and(|t| t.is_being_moved) {
            return false;
        }
        let moved = match hit.slot_at(self, pos) {
            Some(destination) => self.attempt_move(token, destination),
            None => false,
        };
        if let Some(t) = self.tokens.get_mut(token.index()) {
            t.is_being_moved = false;
        }
        moved
    }

    /// Clear every drag flag
    pub fn cancel_drag(&mut self) {
        for token in &mut self.tokens {
            token.is_being_moved = false;
        }
    }

    /// Whether `attempt_move(token, destination)` would succeed
    pub fn can_move(&self, token: TokenId, destination: SlotId) -> bool {
        if self.phase != PuzzlePhase::Playing {
            return false;
        }
        let Some(t) = self.token(token) else {
            return false;
        };
        let Some(source) = t.containing_slot else {
            return false;
        };
        if source == destination || !self.is_top(token) {
            return false;
        }
        self.slot(destination).is_some_and(|d| d.can_accept(t))
    }

    /// Move a top token onto `destination`. Returns false and changes nothing
    /// if the move is not legal.
    pub fn attempt_move(&mut self, token: TokenId, destination: SlotId) -> bool {
        if !self.can_move(token, destination) {
            return false;
        }
        let Some(source) = self.token(token).and_then(|t| t.containing_slot) else {
            return false;
        };

        if let Err(e) = self.transfer(token, source, destination) {
            error!("Move of {} from {} to {} failed: {}", token, source, destination, e);
            return false;
        }

        self.history.push(MoveRecord {
            token,
            from: source,
            to: destination,
        });
        self.move_count += 1;
        debug!("Moved {} from {} to {}", token, source, destination);
        debug_assert!(self.check_invariants().is_ok());

        self.finalize_if_solved();
        true
    }

    /// Reverse the last move. Counts as a move.
    pub fn undo(&mut self) -> bool {
        if self.phase != PuzzlePhase::Playing {
            return false;
        }
        let Some(record) = self.history.pop() else {
            return false;
        };

        if let Err(e) = self.transfer(record.token, record.to, record.from) {
            error!("Undo of {} failed: {}", record.token, e);
            self.history.push(record);
            return false;
        }

        self.move_count += 1;
        debug!("Undid move of {} back to {}", record.token, record.from);
        debug_assert!(self.check_invariants().is_ok());
        true
    }

    fn slot_and_tokens(&mut self, id: SlotId) -> Result<(&mut Slot, &mut [Token]), PuzzleError> {
        let slots = match id.kind {
            SlotKind::Target => &mut self.targets,
            SlotKind::Temporary => &mut self.temps,
        };
        let slot = slots
            .get_mut(id.index)
            .ok_or_else(|| PuzzleError::InvariantViolation(format!("no slot {}", id)))?;
        Ok((slot, &mut self.tokens))
    }

    /// Pop `token` off `from` and push it onto `to`, all or nothing.
    fn transfer(&mut self, token: TokenId, from: SlotId, to: SlotId) -> Result<(), PuzzleError> {
        {
            let accepts = match (self.slot(to), self.token(token)) {
                (Some(dest), Some(t)) => dest.can_accept(t),
                _ => false,
            };
            if !accepts || self.slot(from).and_then(Slot::peek_top) != Some(token) {
                return Err(PuzzleError::InvalidMove);
            }
        }

        let (source, tokens) = self.slot_and_tokens(from)?;
        let popped = source.pop(tokens)?;

        let (dest, tokens) = self.slot_and_tokens(to)?;
        let pushed = match tokens.get_mut(popped.index()) {
            Some(t) => dest.push(t),
            None => Err(PuzzleError::InvariantViolation(format!(
                "unknown token {}",
                popped
            ))),
        };

        if let Err(e) = pushed {
            // put it back where it was
            let (source, tokens) = self.slot_and_tokens(from)?;
            if let Some(t) = tokens.get_mut(popped.index()) {
                source.push(t)?;
            }
            return Err(e);
        }
        Ok(())
    }

    // ==================== Win & Score ====================

    /// Every target slot is complete. Pure query.
    pub fn is_solved(&self) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(|s| s.is_complete(&self.tokens))
    }

    /// Whether the level is won. Finalizes the score the first time it is.
    pub fn check_win(&mut self) -> bool {
        let won = self.is_solved();
        if won {
            self.finalize_if_solved();
        }
        won
    }

    /// Finalize score once per level; returns the result only on the call that finalizes.
    fn finalize_if_solved(&mut self) -> Option<LevelResult> {
        if self.phase != PuzzlePhase::Playing || !self.is_solved() {
            return None;
        }

        let scored = compute_score(self.move_count, self.level);
        let result = LevelResult {
            level: self.level,
            moves_taken: self.move_count,
            score: scored.score,
            is_perfect: scored.is_perfect,
        };

        self.score = scored.score;
        self.total_score = self.total_score.saturating_add(scored.score);
        self.completed_levels += 1;
        self.highest_completed = self.highest_completed.max(self.level);
        self.result = Some(result);
        self.phase = PuzzlePhase::Complete;

        info!(
            "Level {} complete in {} moves: score {}{}",
            self.level,
            self.move_count,
            scored.score,
            if scored.is_perfect { " (perfect)" } else { "" }
        );
        Some(result)
    }

    // ==================== Hints ====================

    fn candidate_moves(&self) -> impl Iterator<Item = Hint> + '_ {
        let playing = self.phase == PuzzlePhase::Playing;
        self.slots().filter(move |_| playing).flat_map(move |source| {
            let top = source.peek_top().and_then(|id| self.token(id));
            self.slots().filter_map(move |dest| {
                let token = top?;
                (dest.id != source.id && dest.can_accept(token)).then_some(Hint {
                    source: source.id,
                    token: token.id,
                    destination: dest.id,
                })
            })
        })
    }

    /// Every legal move, in hint order. Empty unless the level is being played.
    pub fn legal_moves(&self) -> Vec<Hint> {
        self.candidate_moves().collect()
    }

    /// First legal move in slot order, or `None` if the board is stuck.
    pub fn find_hint(&self) -> Option<Hint> {
        self.candidate_moves().next()
    }

    pub fn hint(&self) -> Result<Hint, PuzzleError> {
        self.find_hint().ok_or(PuzzleError::HintUnavailable)
    }

    // ==================== Actions ====================

    /// Apply a command from a presentation layer.
    ///
    /// Illegal moves and undo with no history produce no events rather than
    /// an error.
    pub fn apply_action<S: LevelSource + ?Sized>(
        &mut self,
        source: &S,
        action: PuzzleAction,
    ) -> Result<Vec<PuzzleEvent>, PuzzleError> {
        let mut events = Vec::new();

        match action {
            PuzzleAction::Move { token, to } => {
                if self.level == 0 {
                    return Err(PuzzleError::NoLevelLoaded);
                }
                let from = self.token(token).and_then(|t| t.containing_slot);
                if let Some(from) = from {
                    if self.attempt_move(token, to) {
                        events.push(PuzzleEvent::TokenMoved { token, from, to });
                        if let (PuzzlePhase::Complete, Some(result)) = (self.phase, self.result) {
                            events.push(PuzzleEvent::LevelCompleted(result));
                        }
                    }
                }
            }

            PuzzleAction::Undo => {
                if self.level == 0 {
                    return Err(PuzzleError::NoLevelLoaded);
                }
                let last = self.history.last().copied();
                if let Some(record) = last {
                    if self.undo() {
                        events.push(PuzzleEvent::MoveUndone {
                            token: record.token,
                            from: record.to,
                            to: record.from,
                        });
                    }
                }
            }

            PuzzleAction::Reset => {
                self.reset(source)?;
                events.push(self.loaded_event());
            }

            PuzzleAction::NextLevel => {
                let next = self.next_level_number()?;
                events.push(self.load_or_finish(source, next)?);
            }

            PuzzleAction::SelectLevel(number) => {
                if !self.is_level_unlocked(number) {
                    return Err(PuzzleError::LevelLocked { level: number });
                }
                events.push(self.load_or_finish(source, number)?);
            }

            PuzzleAction::Hint => match self.find_hint() {
                Some(hint) => events.push(PuzzleEvent::HintFound(hint)),
                None => events.push(PuzzleEvent::NoHintAvailable),
            },
        }

        Ok(events)
    }

    fn loaded_event(&self) -> PuzzleEvent {
        PuzzleEvent::LevelLoaded {
            level: self.level,
            name: self.level_name.clone(),
        }
    }

    fn load_or_finish<S: LevelSource + ?Sized>(
        &mut self,
        source: &S,
        number: u32,
    ) -> Result<PuzzleEvent, PuzzleError> {
        match self.load_level(source, number) {
            Ok(()) => Ok(self.loaded_event()),
            Err(PuzzleError::LevelNotFound { level }) => {
                info!("No level {}: all levels completed", level);
                Ok(PuzzleEvent::AllLevelsComplete)
            }
            Err(e) => Err(e),
        }
    }

    // ==================== Snapshot & Invariants ====================

    fn slot_view(&self, slot: &Slot) -> SlotView {
        SlotView {
            id: slot.id,
            kind: slot.kind(),
            capacity: slot.capacity,
            required_color: slot.required_color.clone(),
            complete: slot.is_complete(&self.tokens),
            tokens: slot
                .tokens()
                .iter()
                .filter_map(|&id| self.token(id))
                .map(|t| TokenView {
                    id: t.id,
                    color: t.color.clone(),
                    being_moved: t.is_being_moved,
                })
                .collect(),
        }
    }

    pub fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot {
            level: self.level,
            level_name: self.level_name.clone(),
            phase: self.phase,
            move_count: self.move_count,
            score: self.score,
            total_score: self.total_score,
            completed_levels: self.completed_levels,
            targets: self.targets.iter().map(|s| self.slot_view(s)).collect(),
            temps: self.temps.iter().map(|s| self.slot_view(s)).collect(),
            result: self.result,
            can_undo: self.phase == PuzzlePhase::Playing && !self.history.is_empty(),
        }
    }

    /// Verify capacity, colour and membership consistency across all slots and tokens.
    pub fn check_invariants(&self) -> Result<(), PuzzleError> {
        let violation = |msg: String| Err(PuzzleError::InvariantViolation(msg));
        let mut seen = vec![false; self.tokens.len()];

        for slot in self.slots() {
            if slot.len() > slot.capacity {
                return violation(format!("{} over capacity", slot.id));
            }
            for &id in slot.tokens() {
                let Some(token) = self.token(id) else {
                    return violation(format!("{} holds unknown token {}", slot.id, id));
                };
                if seen[id.index()] {
                    return violation(format!("token {} held twice", id));
                }
                seen[id.index()] = true;
                if token.containing_slot != Some(slot.id) {
                    return violation(format!(
                        "token {} in {} but points at {:?}",
                        id, slot.id, token.containing_slot
                    ));
                }
                if let Some(required) = &slot.required_color {
                    if *required != token.color {
                        return violation(format!("token {} has wrong colour for {}", id, slot.id));
                    }
                }
            }
        }

        for token in &self.tokens {
            if !seen[token.id.index()] {
                return violation(format!("token {} is in no slot", token.id));
            }
        }
        Ok(())
    }
}

impl Default for PuzzleEngine {
    fn default() -> Self {
        Self::new()
    }
}
