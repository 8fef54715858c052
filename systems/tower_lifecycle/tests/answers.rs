use std::time::Duration;

use quiz_defence_core::{
    CellCoord, Command, Event, GameConfig, Occupant, Prompt, PromptProvider, Tier, Validation,
};
use quiz_defence_system_tower_lifecycle::{AnswerOutcome, PromptRotation, TowerLifecycle};
use quiz_defence_world::{self as world, query, World};

/// Provider whose prompts all share one answer and which awards a bonus on exact case.
struct SharedAnswer {
    answer: &'static str,
    generated: Vec<Tier>,
}

impl SharedAnswer {
    fn new(answer: &'static str) -> Self {
        Self {
            answer,
            generated: Vec::new(),
        }
    }
}

impl PromptProvider for SharedAnswer {
    fn generate(&mut self, tier: Tier) -> Prompt {
        self.generated.push(tier);
        Prompt::with_answer(format!("{} prompt", tier.label()), self.answer)
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        let expected = prompt.primary_answer();
        if expected == input {
            Validation {
                bonus_points: 10,
                ..Validation::correct(expected)
            }
        } else if expected.eq_ignore_ascii_case(input) {
            Validation::correct(expected)
        } else {
            Validation::incorrect(expected)
        }
    }
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn board_with_tower_in_lane_two(provider: &mut SharedAnswer) -> World {
    let config = GameConfig::default();
    let mut world = World::new(&config);
    let mut commands = vec![Command::SetVisibleColumns { columns: 1 }];
    for lane in 0..3 {
        let cell = CellCoord::new(lane, 0);
        let tier = config.board.tier_for(cell);
        commands.push(Command::PlaceSlot {
            cell,
            tier,
            prompt: Prompt::with_answer("other", "other"),
        });
    }
    commands.push(Command::ActivateTower {
        cell: CellCoord::new(2, 0),
        prompt: provider.generate(Tier::Hard),
    });
    commands.push(Command::AssignPrompt {
        cell: CellCoord::new(0, 0),
        prompt: provider.generate(Tier::Easy),
    });
    let _ = apply_all(&mut world, commands);
    world
}

#[test]
fn one_answer_activates_slot_and_upgrades_tower() {
    let mut provider = SharedAnswer::new("hablo");
    let mut world = board_with_tower_in_lane_two(&mut provider);
    let mut lifecycle = TowerLifecycle::new();
    let mut commands = Vec::new();

    let view = query::prompt_view(&world);
    assert_eq!(view.get(CellCoord::new(0, 0)).map(|s| s.occupant), Some(Occupant::Slot));
    assert_eq!(view.get(CellCoord::new(2, 0)).map(|s| s.occupant), Some(Occupant::Tower));

    let outcome = lifecycle.on_answer_submitted("hablo", &view, &mut provider, &mut commands);
    assert_eq!(
        outcome,
        AnswerOutcome {
            any_correct: true,
            bonus_points: 20,
            matches: 2,
        }
    );
    assert!(matches!(
        commands.as_slice(),
        [
            Command::ActivateTower { cell: first, .. },
            Command::UpgradeTower { cell: second, .. },
        ] if *first == CellCoord::new(0, 0) && *second == CellCoord::new(2, 0)
    ));

    let events = apply_all(&mut world, commands);
    assert!(events.contains(&Event::TowerActivated {
        cell: CellCoord::new(0, 0),
        tier: Tier::Easy,
    }));
    assert!(events.contains(&Event::TowerUpgraded {
        cell: CellCoord::new(2, 0),
        level: 1,
    }));
    let untouched = query::prompt_view(&world);
    assert_eq!(
        untouched.get(CellCoord::new(1, 0)).map(|s| s.occupant),
        Some(Occupant::Slot)
    );
}

#[test]
fn wrong_answer_changes_nothing() {
    let mut provider = SharedAnswer::new("hablo");
    let world = board_with_tower_in_lane_two(&mut provider);
    let mut commands = Vec::new();
    let outcome = TowerLifecycle::new().on_answer_submitted(
        "comer",
        &query::prompt_view(&world),
        &mut provider,
        &mut commands,
    );
    assert_eq!(outcome, AnswerOutcome::default());
    assert!(commands.is_empty());
}

#[test]
fn revealed_prompts_do_not_accept_answers() {
    let mut provider = SharedAnswer::new("hablo");
    let mut world = board_with_tower_in_lane_two(&mut provider);
    let _ = apply_all(
        &mut world,
        vec![Command::RevealAnswer {
            cell: CellCoord::new(0, 0),
        }],
    );

    let mut commands = Vec::new();
    let outcome = TowerLifecycle::new().on_answer_submitted(
        "HABLO",
        &query::prompt_view(&world),
        &mut provider,
        &mut commands,
    );
    assert_eq!(outcome.matches, 1);
    assert_eq!(outcome.bonus_points, 0);
    assert!(matches!(commands.as_slice(), [Command::UpgradeTower { .. }]));
}

#[test]
fn reverted_towers_receive_fresh_prompts() {
    let mut provider = SharedAnswer::new("hablo");
    let mut world = board_with_tower_in_lane_two(&mut provider);
    let events = apply_all(
        &mut world,
        vec![Command::Tick {
            dt: Duration::from_millis(20_000),
        }],
    );
    let reverted = CellCoord::new(2, 0);
    assert!(events.contains(&Event::TowerReverted {
        cell: reverted,
        tier: Tier::Hard,
    }));

    let mut commands = Vec::new();
    TowerLifecycle::new().on_events(&events, &mut provider, &mut commands);
    assert_eq!(commands.len(), 1);
    let _ = apply_all(&mut world, commands);

    let view = query::prompt_view(&world);
    let snapshot = view.get(reverted).expect("slot regained a prompt");
    assert_eq!(snapshot.occupant, Occupant::Slot);
    assert_eq!(snapshot.set_at, Duration::from_millis(20_000));
}

#[test]
fn stale_prompt_is_revealed_through_the_world() {
    let mut provider = SharedAnswer::new("hablo");
    let mut world = board_with_tower_in_lane_two(&mut provider);
    let _ = apply_all(
        &mut world,
        vec![Command::Tick {
            dt: Duration::from_millis(19_000),
        }],
    );
    let mut rotation = PromptRotation::new(&GameConfig::default().prompts);
    let mut commands = Vec::new();
    assert!(rotation
        .handle(query::now(&world), &query::prompt_view(&world), &mut commands)
        .is_none());

    let _ = apply_all(
        &mut world,
        vec![Command::Tick {
            dt: Duration::from_millis(1_500),
        }],
    );
    let rotated = rotation.handle(query::now(&world), &query::prompt_view(&world), &mut commands);
    assert_eq!(rotated, Some(CellCoord::new(0, 0)));

    let events = apply_all(&mut world, commands);
    assert_eq!(
        events,
        vec![Event::AnswerRevealed {
            cell: CellCoord::new(0, 0),
            correct_form: "hablo".to_owned(),
        }]
    );
}
