//! Reversible move history.

use crate::slot::SlotId;
use crate::token::TokenId;
use serde::{Deserialize, Serialize};

/// One successful player move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub token: TokenId,
    pub from: SlotId,
    pub to: SlotId,
}

/// LIFO stack of applied moves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistory {
    records: Vec<MoveRecord>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<MoveRecord> {
        self.records.pop()
    }

    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &MoveRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_lifo() {
        let mut history = MoveHistory::new();
        let first = MoveRecord {
            token: TokenId(0),
            from: SlotId::temporary(0),
            to: SlotId::target(0),
        };
        let second = MoveRecord {
            token: TokenId(1),
            from: SlotId::temporary(1),
            to: SlotId::target(0),
        };
        history.push(first);
        history.push(second);

        assert_eq!(history.len(), 2);
        assert_eq!(history.pop(), Some(second));
        assert_eq!(history.pop(), Some(first));
        assert_eq!(history.pop(), None);
        assert!(history.is_empty());
    }
}
