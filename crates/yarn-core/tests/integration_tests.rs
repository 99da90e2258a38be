//! Integration tests for the Yarn Sort engine.
//!
//! These tests drive complete levels through the public API and check the
//! engine's invariants over long random move sequences.

use pretty_assertions::assert_eq;
use rand::prelude::*;
use yarn_core::*;

const PINK: &str = "#FF6B9D";
const TEAL: &str = "#4ECDC4";
const YELLOW: &str = "#FFD93D";

fn contents(engine: &PuzzleEngine) -> Vec<Vec<TokenId>> {
    engine.slots().map(|s| s.tokens().to_vec()).collect()
}

fn load(definition: &LevelDefinition) -> PuzzleEngine {
    let mut engine = PuzzleEngine::new();
    engine.load_definition(1, definition).unwrap();
    engine
}

/// Three pink, two teal, one yellow: no target can ever be completed
/// alongside the other, so random play never ends the level.
fn unwinnable_level() -> LevelDefinition {
    LevelDefinition {
        id: 1,
        name: "Endless".into(),
        target_slots: 2,
        temp_slots: 3,
        slot_capacity: 3,
        slot_colors: None,
        tokens: vec![
            TokenPlacement::new(PINK, 0),
            TokenPlacement::new(TEAL, 0),
            TokenPlacement::new(PINK, 1),
            TokenPlacement::new(YELLOW, 1),
            TokenPlacement::new(TEAL, 2),
            TokenPlacement::new(PINK, 2),
        ],
    }
}

fn assert_capacities(engine: &PuzzleEngine) {
    for slot in engine.slots() {
        assert!(slot.len() <= slot.capacity, "{} over capacity", slot.id);
    }
}

/// Brute force: does any pair of distinct slots admit a move?
fn any_legal_pair(engine: &PuzzleEngine) -> bool {
    engine.slots().any(|s| {
        s.peek_top()
            .and_then(|id| engine.token(id))
            .is_some_and(|t| engine.slots().any(|d| d.id != s.id && d.can_accept(t)))
    })
}

#[test]
fn test_single_target_scenario() {
    let definition = LevelDefinition {
        id: 1,
        name: "One colour".into(),
        target_slots: 1,
        temp_slots: 1,
        slot_capacity: 3,
        slot_colors: Some(vec![Some(Color::from(PINK))]),
        tokens: vec![
            TokenPlacement::new(PINK, 0),
            TokenPlacement::new(PINK, 0),
            TokenPlacement::new(PINK, 0),
        ],
    };
    let mut engine = load(&definition);

    for _ in 0..3 {
        let top = engine.temps()[0].peek_top().unwrap();
        assert!(engine.attempt_move(top, SlotId::target(0)));
    }

    assert!(engine.check_win());
    assert_eq!(
        compute_score(3, 1),
        LevelScore {
            score: 1585,
            is_perfect: true
        }
    );
    assert_eq!(
        engine.result(),
        Some(LevelResult {
            level: 1,
            moves_taken: 3,
            score: 1585,
            is_perfect: true
        })
    );
}

#[test]
fn test_slow_clear_score() {
    assert_eq!(
        compute_score(20, 1),
        LevelScore {
            score: 1000,
            is_perfect: false
        }
    );
}

#[test]
fn test_full_target_rejects_move() {
    let definition = LevelDefinition {
        id: 1,
        name: "Full".into(),
        target_slots: 1,
        temp_slots: 2,
        slot_capacity: 2,
        slot_colors: None,
        tokens: vec![
            TokenPlacement::new(PINK, 0),
            TokenPlacement::new(TEAL, 0),
            TokenPlacement::new(YELLOW, 1),
        ],
    };
    let mut engine = load(&definition);
    assert!(engine.attempt_move(TokenId(1), SlotId::target(0)));
    assert!(engine.attempt_move(TokenId(2), SlotId::target(0)));
    assert!(engine.targets()[0].is_full());

    let before = contents(&engine);
    let moves = engine.move_count();
    assert!(!engine.attempt_move(TokenId(0), SlotId::target(0)));
    assert_eq!(contents(&engine), before);
    assert_eq!(engine.move_count(), moves);
}

#[test]
fn test_undo_on_fresh_level() {
    let mut engine = PuzzleEngine::new();
    engine.load_level(&LevelCatalog::builtin(), 1).unwrap();
    assert!(!engine.undo());
    assert_eq!(engine.move_count(), 0);
    assert_eq!(engine.score(), 0);
}

#[test]
fn test_random_play_preserves_invariants_and_undo_round_trips() {
    let definition = unwinnable_level();

    for seed in 0..25 {
        let mut engine = load(&definition);
        let initial = contents(&engine);
        let mut player = AutoPlayer::with_seed(Strategy::Random, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xA5A5);
        let mut made = 0;

        for _ in 0..60 {
            // a random, possibly illegal, move must not change anything when rejected
            let token = TokenId(rng.gen_range(0..engine.tokens().len()));
            let ids: Vec<SlotId> = engine.slot_ids().collect();
            let destination = *ids.choose(&mut rng).unwrap();
            if !engine.can_move(token, destination) {
                let before = contents(&engine);
                assert!(!engine.attempt_move(token, destination));
                assert_eq!(contents(&engine), before);
            } else {
                assert!(engine.attempt_move(token, destination));
                made += 1;
            }

            assert_eq!(engine.find_hint().is_some(), any_legal_pair(&engine));
            if player.play_turn(&mut engine).is_some() {
                made += 1;
            }

            engine.check_invariants().unwrap();
            assert_capacities(&engine);
            assert_eq!(engine.phase(), PuzzlePhase::Playing);
        }

        assert_eq!(engine.history().len(), made);
        let moves_before_undo = engine.move_count();
        for _ in 0..made {
            assert!(engine.undo());
            engine.check_invariants().unwrap();
        }
        assert!(!engine.undo());
        assert_eq!(contents(&engine), initial, "seed {}", seed);
        assert_eq!(engine.move_count(), moves_before_undo + made as u32);
    }
}

#[test]
fn test_back_references_match_sequences() {
    let mut engine = PuzzleEngine::new();
    engine.load_level(&LevelCatalog::builtin(), 3).unwrap();
    let mut player = AutoPlayer::with_seed(Strategy::Random, 99);

    for _ in 0..30 {
        if engine.phase() != PuzzlePhase::Playing || player.play_turn(&mut engine).is_none() {
            break;
        }
        for token in engine.tokens() {
            let slot = engine.slot(token.containing_slot.unwrap()).unwrap();
            assert!(slot.contains(token.id));
        }
        for slot in engine.slots() {
            for &id in slot.tokens() {
                assert_eq!(engine.token(id).unwrap().containing_slot, Some(slot.id));
            }
        }
    }
}

#[test]
fn test_drag_and_drop_through_layout() {
    let mut engine = PuzzleEngine::new();
    engine.load_level(&LevelCatalog::builtin(), 1).unwrap();
    let layout = BoardLayout::new(800.0, 600.0);

    // buried token under the pointer is not selectable
    let bottom = engine.temps()[0].tokens()[0];
    let bottom_center = layout.token_center(&engine, bottom).unwrap();
    assert_eq!(engine.pick_up(bottom_center, &layout), None);

    let top = engine.temps()[0].peek_top().unwrap();
    let center = layout.token_center(&engine, top).unwrap();
    assert_eq!(engine.pick_up(center, &layout), Some(top));
    assert!(engine.token(top).unwrap().is_being_moved);

    // dropping outside any slot does nothing
    assert!(!engine.drop_at(top, Point::new(5.0, 5.0), &layout));
    assert!(!engine.token(top).unwrap().is_being_moved);
    assert_eq!(engine.move_count(), 0);

    engine.pick_up(center, &layout).unwrap();
    let target = layout.slot_rect(&engine, SlotId::target(0)).unwrap();
    let drop = Point::new(target.x + target.width / 2.0, target.y + target.height / 2.0);
    assert!(engine.drop_at(top, drop, &layout));
    assert_eq!(engine.targets()[0].tokens(), &[top]);
    assert!(!engine.token(top).unwrap().is_being_moved);
}

#[test]
fn test_full_campaign() {
    let catalog = LevelCatalog::builtin();
    let mut engine = PuzzleEngine::new();

    // Level 1: shortest solution from the solver
    engine.apply_action(&catalog, PuzzleAction::SelectLevel(1)).unwrap();
    for hint in solve(&engine, 100_000).unwrap() {
        engine
            .apply_action(
                &catalog,
                PuzzleAction::Move {
                    token: hint.token,
                    to: hint.destination,
                },
            )
            .unwrap();
    }
    assert_eq!(engine.result().unwrap().score, 1570);
    assert!(engine.is_level_unlocked(2));

    // Level 2: every colour has a fixed target, greedy play is optimal
    let events = engine.apply_action(&catalog, PuzzleAction::NextLevel).unwrap();
    assert_eq!(
        events,
        vec![PuzzleEvent::LevelLoaded {
            level: 2,
            name: "Color Mix".into()
        }]
    );
    let mut player = AutoPlayer::with_seed(Strategy::Greedy, 5);
    while engine.phase() == PuzzlePhase::Playing {
        player.play_turn(&mut engine).unwrap();
    }
    assert_eq!(engine.result().unwrap().score, 1670);

    // Level 3 by hand
    engine.apply_action(&catalog, PuzzleAction::NextLevel).unwrap();
    let plan = [
        (1, SlotId::target(0)),
        (3, SlotId::target(1)),
        (2, SlotId::target(0)),
        (5, SlotId::target(2)),
        (4, SlotId::target(1)),
        (7, SlotId::target(3)),
        (6, SlotId::target(2)),
    ];
    for (token, to) in plan {
        let events = engine
            .apply_action(
                &catalog,
                PuzzleAction::Move {
                    token: TokenId(token),
                    to,
                },
            )
            .unwrap();
        assert_eq!(events.len(), 1);
    }
    let events = engine
        .apply_action(
            &catalog,
            PuzzleAction::Move {
                token: TokenId(0),
                to: SlotId::target(3),
            },
        )
        .unwrap();
    let expected = LevelResult {
        level: 3,
        moves_taken: 8,
        score: 1760,
        is_perfect: true,
    };
    assert_eq!(events[1], PuzzleEvent::LevelCompleted(expected));
    // completion is reported once
    assert!(engine.check_win());
    assert_eq!(engine.completed_levels(), 3);

    // Level 4: fifteen tokens, too many moves for a perfect clear
    engine.apply_action(&catalog, PuzzleAction::NextLevel).unwrap();
    while engine.phase() == PuzzlePhase::Playing {
        player.play_turn(&mut engine).unwrap();
    }
    let result = engine.result().unwrap();
    assert_eq!(result.moves_taken, 15);
    assert!(!result.is_perfect);
    assert_eq!(result.score, 1325);

    assert_eq!(engine.total_score(), 1570 + 1670 + 1760 + 1325);
    assert_eq!(engine.displayed_score(), engine.total_score() + 1325);

    let events = engine.apply_action(&catalog, PuzzleAction::NextLevel).unwrap();
    assert_eq!(events, vec![PuzzleEvent::AllLevelsComplete]);
    assert_eq!(engine.level(), 4);
    assert_eq!(engine.phase(), PuzzlePhase::Complete);
}

#[test]
fn test_reset_restores_level_but_keeps_session_totals() {
    let catalog = LevelCatalog::builtin();
    let mut engine = PuzzleEngine::new();
    engine.load_level(&catalog, 1).unwrap();
    let initial = contents(&engine);

    let hint = engine.find_hint().unwrap();
    engine.attempt_move(hint.token, hint.destination);
    engine.apply_action(&catalog, PuzzleAction::Reset).unwrap();

    assert_eq!(contents(&engine), initial);
    assert_eq!(engine.move_count(), 0);
    assert!(engine.history().is_empty());
    assert_eq!(engine.phase(), PuzzlePhase::Playing);
}

#[test]
fn test_hint_action_reports_absence() {
    let definition = LevelDefinition {
        id: 1,
        name: "Stuck".into(),
        target_slots: 1,
        temp_slots: 1,
        slot_capacity: 1,
        slot_colors: Some(vec![Some(Color::from(PINK))]),
        tokens: vec![TokenPlacement::new(TEAL, 0)],
    };
    let mut engine = load(&definition);
    let events = engine
        .apply_action(&LevelCatalog::builtin(), PuzzleAction::Hint)
        .unwrap();
    assert_eq!(events, vec![PuzzleEvent::NoHintAvailable]);
}

#[test]
fn test_snapshot_serializes() {
    let mut engine = PuzzleEngine::new();
    engine.load_level(&LevelCatalog::builtin(), 2).unwrap();
    let json = serde_json::to_value(engine.snapshot()).unwrap();

    assert_eq!(json["level"], 2);
    assert_eq!(json["phase"], "Playing");
    assert_eq!(json["targets"][0]["required_color"], PINK);
    assert_eq!(json["temps"][0]["tokens"].as_array().unwrap().len(), 2);
}
