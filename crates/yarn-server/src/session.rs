//! Puzzle session management.
//!
//! Every connection owns one session, and every session owns one engine.

use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;
use yarn_core::{LevelCatalog, LevelSource, PuzzleAction, PuzzleEngine, PuzzleError, PuzzleEvent};

use crate::protocol::{ClientMessage, LevelInfo, ServerMessage};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Level {0} does not exist")]
    UnknownLevel(u32),

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
}

/// One player's puzzle run.
pub struct PuzzleSession {
    pub id: Uuid,
    pub engine: PuzzleEngine,
    pub started_at: Instant,
    /// Commands handled, including rejected ones
    pub commands: u64,
}

impl PuzzleSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            engine: PuzzleEngine::new(),
            started_at: Instant::now(),
            commands: 0,
        }
    }

    /// Load level `level`, which must exist and be unlocked.
    pub fn start_level(
        &mut self,
        catalog: &LevelCatalog,
        level: u32,
    ) -> Result<Vec<PuzzleEvent>, SessionError> {
        if level == 0 || level > catalog.level_count() {
            return Err(SessionError::UnknownLevel(level));
        }
        Ok(self
            .engine
            .apply_action(catalog, PuzzleAction::SelectLevel(level))?)
    }

    pub fn apply_action(
        &mut self,
        catalog: &LevelCatalog,
        action: PuzzleAction,
    ) -> Result<Vec<PuzzleEvent>, SessionError> {
        Ok(self.engine.apply_action(catalog, action)?)
    }

    pub fn level_list(&self, catalog: &LevelCatalog) -> Vec<LevelInfo> {
        (1..=catalog.level_count())
            .filter_map(|number| {
                let definition = catalog.level(number)?;
                Some(LevelInfo {
                    number,
                    name: definition.name.clone(),
                    target_slots: definition.target_slots,
                    temp_slots: definition.temp_slots,
                    token_count: definition.tokens.len(),
                    unlocked: self.engine.is_level_unlocked(number),
                    current: self.engine.level() == number,
                })
            })
            .collect()
    }

    /// Handle one client command and build the replies for it.
    pub fn handle(&mut self, catalog: &LevelCatalog, msg: ClientMessage) -> Vec<ServerMessage> {
        self.commands += 1;

        let result = match msg {
            ClientMessage::StartLevel { level } => self.start_level(catalog, level),
            ClientMessage::Move { token, to } => {
                self.apply_action(catalog, PuzzleAction::Move { token, to })
            }
            ClientMessage::Undo => self.apply_action(catalog, PuzzleAction::Undo),
            ClientMessage::Reset => self.apply_action(catalog, PuzzleAction::Reset),
            ClientMessage::NextLevel => self.apply_action(catalog, PuzzleAction::NextLevel),
            ClientMessage::Hint => {
                return match self.engine.hint() {
                    Ok(hint) => vec![ServerMessage::HintResult { hint }],
                    Err(e) => vec![ServerMessage::NoHint {
                        message: e.to_string(),
                    }],
                };
            }
            ClientMessage::ListLevels => {
                return vec![ServerMessage::LevelList {
                    levels: self.level_list(catalog),
                }];
            }
            ClientMessage::GetState => {
                return vec![ServerMessage::State {
                    snapshot: self.engine.snapshot(),
                }];
            }
            ClientMessage::Ping => return vec![ServerMessage::Pong],
        };

        match result {
            Ok(events) => self.replies_for(events),
            Err(e) => vec![ServerMessage::Error {
                message: e.to_string(),
            }],
        }
    }

    fn replies_for(&self, events: Vec<PuzzleEvent>) -> Vec<ServerMessage> {
        let mut replies = Vec::new();
        let mut finished = Vec::new();

        for event in &events {
            match event {
                PuzzleEvent::LevelCompleted(result) => {
                    finished.push(ServerMessage::LevelComplete { result: *result })
                }
                PuzzleEvent::AllLevelsComplete => finished.push(ServerMessage::AllLevelsComplete),
                _ => {}
            }
        }

        replies.push(ServerMessage::ActionResult {
            accepted: !events.is_empty(),
            events,
        });
        replies.push(ServerMessage::State {
            snapshot: self.engine.snapshot(),
        });
        replies.extend(finished);
        replies
    }
}
