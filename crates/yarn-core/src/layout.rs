//! Screen geometry and hit-testing.
//!
//! The engine never reads coordinates itself; it asks a [`HitTest`] what is
//! under the pointer. [`BoardLayout`] is the reference implementation: two
//! centred rows of slots, targets at the top and temporary slots at the
//! bottom, with tokens stacked upwards from the bottom of each slot.

use crate::game::PuzzleEngine;
use crate::slot::{SlotId, SlotKind};
use crate::token::TokenId;
use serde::{Deserialize, Serialize};

pub const SLOT_WIDTH: f32 = 70.0;
pub const SLOT_HEIGHT: f32 = 130.0;
pub const SLOT_SPACING: f32 = 18.0;
pub const TOKEN_RADIUS: f32 = 22.0;
pub const TOKEN_SPACING: f32 = 35.0;
/// Distance from the slot's bottom edge to the lowest token's centre
pub const TOKEN_BASE_OFFSET: f32 = 35.0;
pub const TARGET_ROW_Y: f32 = 50.0;
/// Temporary row sits this far above the bottom of the canvas
pub const TEMP_ROW_OFFSET: f32 = 170.0;

/// A logical canvas position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Edges inclusive
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Resolves pointer positions to slots and tokens.
pub trait HitTest {
    fn slot_at(&self, engine: &PuzzleEngine, pos: Point) -> Option<SlotId>;

    /// Any token under `pos`, buried or not. The engine decides selectability.
    fn token_at(&self, engine: &PuzzleEngine, pos: Point) -> Option<TokenId>;
}

/// Reference canvas layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub width: f32,
    pub height: f32,
}

impl BoardLayout {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn row_y(&self, kind: SlotKind) -> f32 {
        match kind {
            SlotKind::Target => TARGET_ROW_Y,
            SlotKind::Temporary => self.height - TEMP_ROW_OFFSET,
        }
    }

    fn row_start_x(&self, count: usize) -> f32 {
        let total_width = count as f32 * (SLOT_WIDTH + SLOT_SPACING);
        (self.width - total_width) / 2.0
    }

    pub fn slot_rect(&self, engine: &PuzzleEngine, id: SlotId) -> Option<Rect> {
        let count = match id.kind {
            SlotKind::Target => engine.targets().len(),
            SlotKind::Temporary => engine.temps().len(),
        };
        if id.index >= count {
            return None;
        }
        Some(Rect {
            x: self.row_start_x(count) + id.index as f32 * (SLOT_WIDTH + SLOT_SPACING),
            y: self.row_y(id.kind),
            width: SLOT_WIDTH,
            height: SLOT_HEIGHT,
        })
    }

    /// Resting centre of a token inside its slot
    pub fn token_center(&self, engine: &PuzzleEngine, token: TokenId) -> Option<Point> {
        let slot_id = engine.token(token)?.containing_slot?;
        let depth = engine.slot(slot_id)?.position_of(token)?;
        let rect = self.slot_rect(engine, slot_id)?;
        Some(Point {
            x: rect.x + rect.width / 2.0,
            y: rect.y + rect.height - TOKEN_BASE_OFFSET - depth as f32 * TOKEN_SPACING,
        })
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl HitTest for BoardLayout {
    fn slot_at(&self, engine: &PuzzleEngine, pos: Point) -> Option<SlotId> {
        engine
            .slot_ids()
            .find(|&id| self.slot_rect(engine, id).is_some_and(|r| r.contains(pos)))
    }

    fn token_at(&self, engine: &PuzzleEngine, pos: Point) -> Option<TokenId> {
        // Stacked tokens overlap; prefer the higher one.
        engine.slot_ids().find_map(|id| {
            engine.slot(id)?.tokens().iter().rev().copied().find(|&token| {
                self.token_center(engine, token)
                    .is_some_and(|c| c.distance(pos) < TOKEN_RADIUS)
            })
        })
    }
}
