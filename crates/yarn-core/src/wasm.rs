//! WebAssembly bindings for the Yarn Sort engine.
//!
//! The browser owns the canvas and pointer events; this wrapper owns the
//! engine, the level catalog and the reference layout used for hit-testing.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::PuzzleAction;
#[cfg(feature = "wasm")]
use crate::game::{PuzzleEngine, PuzzlePhase};
#[cfg(feature = "wasm")]
use crate::layout::{BoardLayout, Point};
#[cfg(feature = "wasm")]
use crate::level::{LevelCatalog, LevelSource};
#[cfg(feature = "wasm")]
use crate::slot::SlotId;
#[cfg(feature = "wasm")]
use crate::token::TokenId;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed puzzle wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmPuzzle {
    engine: PuzzleEngine,
    catalog: LevelCatalog,
    layout: BoardLayout,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmPuzzle {
    /// Create a puzzle from a `levels.json` document; empty string uses the built-in levels
    #[wasm_bindgen(constructor)]
    pub fn new(levels_json: &str, width: f32, height: f32) -> Result<WasmPuzzle, JsValue> {
        let catalog = if levels_json.trim().is_empty() {
            LevelCatalog::builtin()
        } else {
            LevelCatalog::from_json(levels_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid levels JSON: {}", e)))?
        };

        Ok(WasmPuzzle {
            engine: PuzzleEngine::new(),
            catalog,
            layout: BoardLayout::new(width, height),
        })
    }

    #[wasm_bindgen(js_name = levelCount)]
    pub fn level_count(&self) -> u32 {
        self.catalog.level_count()
    }

    #[wasm_bindgen]
    pub fn resize(&mut self, width: f32, height: f32) {
        self.layout.resize(width, height);
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: PuzzleAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.engine.apply_action(&self.catalog, action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Action failed: {}", e))),
        }
    }

    /// Load a level by number. Returns false once the level sequence is exhausted.
    #[wasm_bindgen(js_name = loadLevel)]
    pub fn load_level(&mut self, level: u32) -> Result<bool, JsValue> {
        self.run(PuzzleAction::SelectLevel(level))
    }

    #[wasm_bindgen(js_name = nextLevel)]
    pub fn next_level(&mut self) -> Result<bool, JsValue> {
        self.run(PuzzleAction::NextLevel)
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.engine
            .reset(&self.catalog)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Pointer down: the top token under the pointer, if any
    #[wasm_bindgen(js_name = pickUp)]
    pub fn pick_up(&mut self, x: f32, y: f32) -> Option<usize> {
        self.engine
            .pick_up(Point::new(x, y), &self.layout)
            .map(|t| t.index())
    }

    /// Pointer up: drop the held token on the slot under the pointer
    #[wasm_bindgen(js_name = dropAt)]
    pub fn drop_at(&mut self, token: usize, x: f32, y: f32) -> bool {
        self.engine
            .drop_at(TokenId(token), Point::new(x, y), &self.layout)
    }

    #[wasm_bindgen(js_name = cancelDrag)]
    pub fn cancel_drag(&mut self) {
        self.engine.cancel_drag();
    }

    /// Move without coordinates: `target` selects the target row, else the temporary row
    #[wasm_bindgen(js_name = moveToken)]
    pub fn move_token(&mut self, token: usize, target: bool, index: usize) -> bool {
        let destination = if target {
            SlotId::target(index)
        } else {
            SlotId::temporary(index)
        };
        self.engine.attempt_move(TokenId(token), destination)
    }

    #[wasm_bindgen]
    pub fn undo(&mut self) -> bool {
        self.engine.undo()
    }

    /// Hint as JSON, or "null" when no move exists
    #[wasm_bindgen]
    pub fn hint(&self) -> String {
        match self.engine.find_hint() {
            Some(hint) => serde_json::to_string(&hint).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Get the current snapshot as JSON (for rendering)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.engine.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Slot rectangles and token centres for the current layout, as JSON
    #[wasm_bindgen(js_name = getLayout)]
    pub fn get_layout(&self) -> String {
        let slots: Vec<_> = self
            .engine
            .slot_ids()
            .filter_map(|id| self.layout.slot_rect(&self.engine, id).map(|r| (id, r)))
            .collect();
        let tokens: Vec<_> = self
            .engine
            .tokens()
            .iter()
            .filter_map(|t| self.layout.token_center(&self.engine, t.id).map(|c| (t.id, c)))
            .collect();
        serde_json::json!({ "slots": slots, "tokens": tokens }).to_string()
    }

    #[wasm_bindgen(js_name = isComplete)]
    pub fn is_complete(&self) -> bool {
        self.engine.phase() == PuzzlePhase::Complete
    }

    /// `{level, moves_taken, score, is_perfect}` once the level is complete
    #[wasm_bindgen(js_name = getResult)]
    pub fn get_result(&self) -> String {
        match self.engine.result() {
            Some(result) => serde_json::to_string(&result).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    #[wasm_bindgen(js_name = isLevelUnlocked)]
    pub fn is_level_unlocked(&self, level: u32) -> bool {
        self.engine.is_level_unlocked(level)
    }
}

#[cfg(feature = "wasm")]
impl WasmPuzzle {
    /// Returns false when the action ran past the last level
    fn run(&mut self, action: PuzzleAction) -> Result<bool, JsValue> {
        let events = self
            .engine
            .apply_action(&self.catalog, action)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(!events
            .iter()
            .any(|e| matches!(e, crate::actions::PuzzleEvent::AllLevelsComplete)))
    }
}
