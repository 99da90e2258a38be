//! Capacity-bounded token stacks.
//!
//! A slot's `sequence` is the single source of truth for membership. Every
//! push and pop updates the moved token's `containing_slot` in the same call
//! so the two never disagree.

use crate::game::PuzzleError;
use crate::token::{Color, Token, TokenId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotKind {
    /// Counts toward the win condition
    Target,
    /// Staging area, never "complete"
    Temporary,
}

/// Slot address: kind plus index within that kind's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId {
    pub kind: SlotKind,
    pub index: usize,
}

impl SlotId {
    pub fn target(index: usize) -> Self {
        Self {
            kind: SlotKind::Target,
            index,
        }
    }

    pub fn temporary(index: usize) -> Self {
        Self {
            kind: SlotKind::Temporary,
            index,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SlotKind::Target => write!(f, "target[{}]", self.index),
            SlotKind::Temporary => write!(f, "temp[{}]", self.index),
        }
    }
}

/// An ordered stack of tokens. The last element of `sequence` is the top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub capacity: usize,
    /// Fixed accepted colour (target slots only)
    pub required_color: Option<Color>,
    sequence: Vec<TokenId>,
}

impl Slot {
    pub fn new(id: SlotId, capacity: usize, required_color: Option<Color>) -> Self {
        // A temporary slot never carries a colour restriction.
        let required_color = match id.kind {
            SlotKind::Target => required_color,
            SlotKind::Temporary => None,
        };
        Self {
            id,
            capacity,
            required_color,
            sequence: Vec::with_capacity(capacity),
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.id.kind
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sequence.len() >= self.capacity
    }

    /// Tokens bottom to top
    pub fn tokens(&self) -> &[TokenId] {
        &self.sequence
    }

    pub fn contains(&self, token: TokenId) -> bool {
        self.sequence.contains(&token)
    }

    /// Position of `token` counted from the bottom
    pub fn position_of(&self, token: TokenId) -> Option<usize> {
        self.sequence.iter().position(|&t| t == token)
    }

    pub fn peek_top(&self) -> Option<TokenId> {
        self.sequence.last().copied()
    }

    /// Whether `token` could be pushed right now. Looks at this slot only.
    ///
    /// Slots without a fixed colour accept any colour up to capacity; no
    /// colour is inferred from the tokens already present.
    pub fn can_accept(&self, token: &Token) -> bool {
        if self.is_full() {
            return false;
        }
        match &self.required_color {
            Some(required) => *required == token.color,
            None => true,
        }
    }

    /// Push a token onto the top and record this slot on the token.
    pub fn push(&mut self, token: &mut Token) -> Result<(), PuzzleError> {
        if !self.can_accept(token) {
            return Err(PuzzleError::InvalidMove);
        }
        if let Some(holder) = token.containing_slot {
            return Err(PuzzleError::InvariantViolation(format!(
                "token {} pushed onto {} while still held by {}",
                token.id, self.id, holder
            )));
        }
        self.sequence.push(token.id);
        token.containing_slot = Some(self.id);
        Ok(())
    }

    /// Remove the top token and clear its back-reference.
    pub fn pop(&mut self, tokens: &mut [Token]) -> Result<TokenId, PuzzleError> {
        let top = self.sequence.pop().ok_or(PuzzleError::EmptyState)?;
        match tokens.get_mut(top.index()) {
            Some(token) => {
                token.containing_slot = None;
                Ok(top)
            }
            None => Err(PuzzleError::InvariantViolation(format!(
                "{} held unknown token {}",
                self.id, top
            ))),
        }
    }

    /// Full to capacity with a single colour. Temporary slots are never complete.
    pub fn is_complete(&self, tokens: &[Token]) -> bool {
        if self.kind() != SlotKind::Target || self.capacity == 0 || !self.is_full() {
            return false;
        }
        let mut colors = self
            .sequence
            .iter()
            .map(|id| tokens.get(id.index()).map(|t| &t.color));
        let first = match colors.next() {
            Some(Some(color)) => color,
            _ => return false,
        };
        colors.all(|c| c == Some(first))
            && self.required_color.as_ref().map_or(true, |r| r == first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(colors: &[&str]) -> Vec<Token> {
        colors
            .iter()
            .enumerate()
            .map(|(i, c)| Token::new(TokenId(i), Color::from(*c)))
            .collect()
    }

    #[test]
    fn test_push_pop_keeps_back_reference() {
        let mut tokens = tokens(&["red", "blue"]);
        let mut slot = Slot::new(SlotId::temporary(0), 3, None);

        slot.push(&mut tokens[0]).unwrap();
        slot.push(&mut tokens[1]).unwrap();
        assert_eq!(slot.peek_top(), Some(TokenId(1)));
        assert_eq!(tokens[1].containing_slot, Some(SlotId::temporary(0)));

        let popped = slot.pop(&mut tokens).unwrap();
        assert_eq!(popped, TokenId(1));
        assert!(tokens[1].containing_slot.is_none());
        assert_eq!(slot.tokens(), &[TokenId(0)]);
    }

    #[test]
    fn test_pop_empty_is_empty_state() {
        let mut tokens = tokens(&[]);
        let mut slot = Slot::new(SlotId::target(0), 3, None);
        assert!(matches!(slot.pop(&mut tokens), Err(PuzzleError::EmptyState)));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut tokens = tokens(&["red", "red"]);
        let mut slot = Slot::new(SlotId::target(0), 1, None);
        slot.push(&mut tokens[0]).unwrap();

        assert!(!slot.can_accept(&tokens[1]));
        assert!(matches!(
            slot.push(&mut tokens[1]),
            Err(PuzzleError::InvalidMove)
        ));
        assert!(tokens[1].containing_slot.is_none());
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn test_required_color_applies_even_when_empty() {
        let tokens = tokens(&["red", "blue"]);
        let slot = Slot::new(SlotId::target(0), 3, Some(Color::from("red")));
        assert!(slot.can_accept(&tokens[0]));
        assert!(!slot.can_accept(&tokens[1]));
    }

    #[test]
    fn test_unrestricted_slot_accepts_mixed_colors() {
        let mut tokens = tokens(&["red", "blue", "green"]);
        let mut slot = Slot::new(SlotId::target(0), 3, None);
        for token in tokens.iter_mut() {
            slot.push(token).unwrap();
        }
        assert!(slot.is_full());
        assert!(!slot.is_complete(&tokens));
    }

    #[test]
    fn test_temporary_slot_drops_required_color() {
        let slot = Slot::new(SlotId::temporary(1), 3, Some(Color::from("red")));
        assert!(slot.required_color.is_none());
    }

    #[test]
    fn test_completion() {
        let mut tokens = tokens(&["red", "red", "red"]);
        let mut target = Slot::new(SlotId::target(0), 3, None);
        let mut temp = Slot::new(SlotId::temporary(0), 3, None);

        for i in 0..3 {
            target.push(&mut tokens[i]).unwrap();
            if i < 2 {
                assert!(!target.is_complete(&tokens));
            }
        }
        assert!(target.is_complete(&tokens));

        for _ in 0..3 {
            target.pop(&mut tokens).unwrap();
        }
        for token in tokens.iter_mut() {
            temp.push(token).unwrap();
        }
        assert!(!temp.is_complete(&tokens));
    }

    #[test]
    fn test_push_rejects_token_held_elsewhere() {
        let mut tokens = tokens(&["red"]);
        let mut a = Slot::new(SlotId::temporary(0), 3, None);
        let mut b = Slot::new(SlotId::temporary(1), 3, None);
        a.push(&mut tokens[0]).unwrap();
        assert!(matches!(
            b.push(&mut tokens[0]),
            Err(PuzzleError::InvariantViolation(_))
        ));
        assert!(b.is_empty());
    }
}
