//! Automatic players and a shortest-path solver.
//!
//! - Random: any legal move
//! - Greedy: prefer moves that build uniform target stacks
//! - [`solve`]: breadth-first search for a shortest winning sequence

use crate::actions::Hint;
use crate::game::PuzzleEngine;
use crate::slot::{SlotId, SlotKind};
use crate::token::Color;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// How an [`AutoPlayer`] picks among legal moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Random,
    Greedy,
}

/// A player that chooses moves on its own
pub struct AutoPlayer {
    pub strategy: Strategy,
    rng: StdRng,
}

impl AutoPlayer {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible player
    pub fn with_seed(strategy: Strategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a legal move, or `None` if there is none
    pub fn choose_move(&mut self, engine: &PuzzleEngine) -> Option<Hint> {
        let moves = engine.legal_moves();
        match self.strategy {
            Strategy::Random => moves.choose(&mut self.rng).copied(),
            Strategy::Greedy => self.choose_greedy(engine, &moves),
        }
    }

    /// Choose and apply a move. Returns the move if one was made.
    pub fn play_turn(&mut self, engine: &mut PuzzleEngine) -> Option<Hint> {
        let chosen = self.choose_move(engine)?;
        engine
            .attempt_move(chosen.token, chosen.destination)
            .then_some(chosen)
    }

    fn choose_greedy(&mut self, engine: &PuzzleEngine, moves: &[Hint]) -> Option<Hint> {
        let best = moves.iter().map(|m| rank_move(engine, m)).max()?;
        let top: Vec<&Hint> = moves
            .iter()
            .filter(|m| rank_move(engine, m) == best)
            .collect();
        top.choose(&mut self.rng).map(|m| **m)
    }
}

/// Whether every token in `slot` has `color`
fn uniform_with(engine: &PuzzleEngine, slot: SlotId, color: &Color, skip_top: bool) -> bool {
    let Some(slot) = engine.slot(slot) else {
        return false;
    };
    let tokens = slot.tokens();
    let tokens = if skip_top && !tokens.is_empty() {
        &tokens[..tokens.len() - 1]
    } else {
        tokens
    };
    tokens
        .iter()
        .all(|&id| engine.token(id).is_some_and(|t| t.color == *color))
}

fn rank_move(engine: &PuzzleEngine, hint: &Hint) -> i32 {
    let Some(color) = engine.token(hint.token).map(|t| &t.color) else {
        return i32::MIN;
    };
    let mut rank = 0;

    if hint.destination.kind == SlotKind::Target && uniform_with(engine, hint.destination, color, false) {
        rank += 3;
    }
    // leaving a clean target stack undoes progress
    if hint.source.kind == SlotKind::Target && uniform_with(engine, hint.source, color, true) {
        rank -= 3;
    }
    // digging out a mixed temporary stack helps
    if hint.source.kind == SlotKind::Temporary && !uniform_with(engine, hint.source, color, true) {
        rank += 1;
    }
    rank
}

type BoardKey = Vec<Vec<u16>>;

/// Shortest winning move sequence from the current position, searching at
/// most `max_states` distinct positions. `Some(vec![])` if already solved.
pub fn solve(engine: &PuzzleEngine, max_states: usize) -> Option<Vec<Hint>> {
    if engine.is_solved() {
        return Some(Vec::new());
    }

    let ids: Vec<SlotId> = engine.slot_ids().collect();
    let mut palette: Vec<Color> = Vec::new();
    let mut index_of = |color: &Color| -> u16 {
        match palette.iter().position(|c| c == color) {
            Some(i) => i as u16,
            None => {
                palette.push(color.clone());
                (palette.len() - 1) as u16
            }
        }
    };

    let mut start: BoardKey = Vec::with_capacity(ids.len());
    let mut capacity = Vec::with_capacity(ids.len());
    let mut required = Vec::with_capacity(ids.len());
    for slot in engine.slots() {
        let mut stack = Vec::with_capacity(slot.capacity);
        for &id in slot.tokens() {
            stack.push(index_of(&engine.token(id)?.color));
        }
        start.push(stack);
        capacity.push(slot.capacity);
        required.push(slot.required_color.as_ref().map(&mut index_of));
    }
    let targets = engine.targets().len();

    let solved = |board: &BoardKey| {
        targets > 0
            && board[..targets].iter().zip(&capacity).all(|(stack, &cap)| {
                stack.len() == cap && stack.windows(2).all(|w| w[0] == w[1])
            })
    };

    let mut parents: HashMap<BoardKey, (BoardKey, (usize, usize))> = HashMap::new();
    let mut queue = VecDeque::from([start.clone()]);
    let mut found = None;

    'search: while let Some(board) = queue.pop_front() {
        for from in 0..board.len() {
            let Some(&color) = board[from].last() else {
                continue;
            };
            for to in 0..board.len() {
                if to == from
                    || board[to].len() >= capacity[to]
                    || required[to].is_some_and(|r| r != color)
                {
                    continue;
                }
                let mut next = board.clone();
                next[from].pop();
                next[to].push(color);
                if next == start || parents.contains_key(&next) {
                    continue;
                }
                parents.insert(next.clone(), (board.clone(), (from, to)));
                if solved(&next) {
                    found = Some(next);
                    break 'search;
                }
                if parents.len() >= max_states {
                    return None;
                }
                queue.push_back(next);
            }
        }
    }

    let mut steps = Vec::new();
    let mut cursor = found?;
    while let Some((prev, step)) = parents.get(&cursor) {
        steps.push(*step);
        cursor = prev.clone();
    }
    steps.reverse();

    // Replay on a copy to recover token identities
    let mut replay = engine.clone();
    let mut hints = Vec::with_capacity(steps.len());
    for (from, to) in steps {
        let token = replay.slot(ids[from])?.peek_top()?;
        hints.push(Hint {
            source: ids[from],
            token,
            destination: ids[to],
        });
        if !replay.attempt_move(token, ids[to]) {
            return None;
        }
    }
    Some(hints)
}
