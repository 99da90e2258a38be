//! Level definitions and the level source contract.
//!
//! Level data is a static catalog keyed by 1-based level number. The JSON
//! form uses the field names of the shipped `levels.json`.

use crate::game::PuzzleError;
use crate::token::Color;
use serde::{Deserialize, Serialize};

/// Initial placement of one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPlacement {
    pub color: Color,
    /// Temporary slot index, taken modulo the temporary slot count
    pub start_slot: usize,
}

impl TokenPlacement {
    pub fn new(color: impl Into<String>, start_slot: usize) -> Self {
        Self {
            color: Color::new(color),
            start_slot,
        }
    }
}

/// Immutable description of one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDefinition {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub target_slots: usize,
    pub temp_slots: usize,
    pub slot_capacity: usize,
    /// Per-target fixed colours. Missing or null entries leave the slot unrestricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_colors: Option<Vec<Option<Color>>>,
    #[serde(rename = "yarns")]
    pub tokens: Vec<TokenPlacement>,
}

impl LevelDefinition {
    /// Fixed colour for target slot `index`, if configured
    pub fn required_color(&self, index: usize) -> Option<&Color> {
        self.slot_colors
            .as_ref()
            .and_then(|colors| colors.get(index))
            .and_then(|c| c.as_ref())
    }

    /// Temporary slot that token descriptor `placement` starts in
    pub fn start_slot_of(&self, placement: &TokenPlacement) -> Option<usize> {
        if self.temp_slots == 0 {
            None
        } else {
            Some(placement.start_slot % self.temp_slots)
        }
    }

    /// Reject definitions that cannot be loaded without breaking slot invariants.
    pub fn validate(&self, level: u32) -> Result<(), PuzzleError> {
        let malformed = |reason: String| PuzzleError::MalformedLevel { level, reason };

        if self.target_slots == 0 {
            return Err(malformed("level has no target slots".into()));
        }
        if self.slot_capacity == 0 {
            return Err(malformed("slot capacity must be at least 1".into()));
        }
        if let Some(colors) = &self.slot_colors {
            if colors.len() > self.target_slots {
                return Err(malformed(format!(
                    "{} slot colours for {} target slots",
                    colors.len(),
                    self.target_slots
                )));
            }
        }
        if self.tokens.is_empty() {
            return Ok(());
        }
        if self.temp_slots == 0 {
            return Err(malformed("tokens given but no temporary slots".into()));
        }

        let mut fill = vec![0usize; self.temp_slots];
        for placement in &self.tokens {
            let slot = placement.start_slot % self.temp_slots;
            fill[slot] += 1;
            if fill[slot] > self.slot_capacity {
                return Err(malformed(format!(
                    "temporary slot {} holds more than {} tokens",
                    slot, self.slot_capacity
                )));
            }
        }
        Ok(())
    }
}

/// Supplies level definitions by 1-based number.
pub trait LevelSource {
    /// `None` once the level sequence is exhausted. Repeated queries for the
    /// same number return the same definition.
    fn level(&self, number: u32) -> Option<&LevelDefinition>;

    fn level_count(&self) -> u32;
}

/// An ordered list of levels, as stored in `levels.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub levels: Vec<LevelDefinition>,
}

const PINK: &str = "#FF6B9D";
const TEAL: &str = "#4ECDC4";
const YELLOW: &str = "#FFD93D";
const MINT: &str = "#A8E6CF";
const CORAL: &str = "#FF8B94";

impl LevelCatalog {
    pub fn new(levels: Vec<LevelDefinition>) -> Self {
        Self { levels }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Catalog used when no level file is available
    pub fn builtin() -> Self {
        let colors = |list: &[&str]| -> Option<Vec<Option<Color>>> {
            Some(list.iter().map(|c| Some(Color::from(*c))).collect())
        };

        Self::new(vec![
            LevelDefinition {
                id: 1,
                name: "Getting Started".into(),
                target_slots: 2,
                temp_slots: 2,
                slot_capacity: 3,
                slot_colors: None,
                tokens: vec![
                    TokenPlacement::new(PINK, 0),
                    TokenPlacement::new(TEAL, 0),
                    TokenPlacement::new(PINK, 0),
                    TokenPlacement::new(TEAL, 1),
                    TokenPlacement::new(PINK, 1),
                    TokenPlacement::new(TEAL, 1),
                ],
            },
            LevelDefinition {
                id: 2,
                name: "Color Mix".into(),
                target_slots: 3,
                temp_slots: 3,
                slot_capacity: 2,
                slot_colors: colors(&[PINK, TEAL, YELLOW]),
                tokens: vec![
                    TokenPlacement::new(PINK, 0),
                    TokenPlacement::new(TEAL, 0),
                    TokenPlacement::new(YELLOW, 1),
                    TokenPlacement::new(PINK, 1),
                    TokenPlacement::new(TEAL, 2),
                    TokenPlacement::new(YELLOW, 2),
                ],
            },
            LevelDefinition {
                id: 3,
                name: "Rainbow Challenge".into(),
                target_slots: 4,
                temp_slots: 4,
                slot_capacity: 2,
                slot_colors: None,
                tokens: vec![
                    TokenPlacement::new(PINK, 0),
                    TokenPlacement::new(TEAL, 0),
                    TokenPlacement::new(TEAL, 1),
                    TokenPlacement::new(YELLOW, 1),
                    TokenPlacement::new(YELLOW, 2),
                    TokenPlacement::new(MINT, 2),
                    TokenPlacement::new(MINT, 3),
                    TokenPlacement::new(PINK, 3),
                ],
            },
            LevelDefinition {
                id: 4,
                name: "Full Spectrum".into(),
                target_slots: 5,
                temp_slots: 5,
                slot_capacity: 3,
                slot_colors: colors(&[PINK, TEAL, YELLOW, MINT, CORAL]),
                tokens: [PINK, TEAL, YELLOW, MINT, CORAL]
                    .iter()
                    .enumerate()
                    .flat_map(|(i, color)| (0..3).map(move |k| TokenPlacement::new(*color, i + k)))
                    .collect(),
            },
        ])
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelSource for LevelCatalog {
    fn level(&self, number: u32) -> Option<&LevelDefinition> {
        let index = (number as usize).checked_sub(1)?;
        self.levels.get(index)
    }

    fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_are_valid() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.level_count(), 4);
        for (i, level) in catalog.levels.iter().enumerate() {
            level.validate(i as u32 + 1).unwrap();
        }
    }

    #[test]
    fn test_shipped_file_matches_builtin() {
        let shipped = LevelCatalog::from_json(include_str!("../../../levels/levels.json")).unwrap();
        assert_eq!(shipped, LevelCatalog::builtin());
    }

    #[test]
    fn test_level_numbers_are_one_based() {
        let catalog = LevelCatalog::builtin();
        assert!(catalog.level(0).is_none());
        assert_eq!(catalog.level(1).unwrap().name, "Getting Started");
        assert!(catalog.level(5).is_none());
    }

    #[test]
    fn test_parse_level_file_field_names() {
        let json = r##"{
            "levels": [{
                "id": 7,
                "name": "Tiny",
                "targetSlots": 1,
                "tempSlots": 1,
                "slotCapacity": 2,
                "slotColors": ["#FF6B9D", null],
                "yarns": [{ "color": "#FF6B9D", "startSlot": 3 }]
            }]
        }"##;
        let catalog = LevelCatalog::from_json(json).unwrap();
        let level = catalog.level(1).unwrap();
        assert_eq!(level.required_color(0), Some(&Color::from("#FF6B9D")));
        assert_eq!(level.required_color(1), None);
        assert_eq!(level.start_slot_of(&level.tokens[0]), Some(0));
        // two colours for one target slot
        assert!(matches!(
            level.validate(1),
            Err(PuzzleError::MalformedLevel { level: 1, .. })
        ));
    }

    #[test]
    fn test_overfull_temp_slot_is_malformed() {
        let level = LevelDefinition {
            id: 1,
            name: String::new(),
            target_slots: 1,
            temp_slots: 2,
            slot_capacity: 1,
            slot_colors: None,
            tokens: vec![TokenPlacement::new(PINK, 0), TokenPlacement::new(PINK, 2)],
        };
        assert!(matches!(
            level.validate(3),
            Err(PuzzleError::MalformedLevel { level: 3, .. })
        ));
    }

    #[test]
    fn test_tokens_without_temp_slots_is_malformed() {
        let level = LevelDefinition {
            id: 1,
            name: String::new(),
            target_slots: 1,
            temp_slots: 0,
            slot_capacity: 1,
            slot_colors: None,
            tokens: vec![TokenPlacement::new(PINK, 0)],
        };
        assert!(level.validate(1).is_err());
        assert_eq!(level.start_slot_of(&level.tokens[0]), None);
    }
}
