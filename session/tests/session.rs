use std::time::Duration;

use quiz_defence_core::{CellCoord, Event, GameConfig, Prompt, PromptProvider, Tier, Validation};
use quiz_defence_session::{Battlefield, MonsterId, MonsterKill, Session, SessionEvent};
use quiz_defence_system_tower_combat::Volley;
use quiz_defence_world::query;

/// Prompts whose answer is the tier label, so tests can target tiers.
struct TierLabels;

impl PromptProvider for TierLabels {
    fn generate(&mut self, tier: Tier) -> Prompt {
        Prompt::with_answer(format!("type {}", tier.label()), tier.label())
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        if prompt.primary_answer() == input.trim() {
            Validation::correct(prompt.primary_answer())
        } else {
            Validation::incorrect(prompt.primary_answer())
        }
    }
}

/// Battlefield that only moves when the test tells it to.
#[derive(Default)]
struct ScriptedField {
    next_id: u64,
    monsters: Vec<(MonsterId, Tier)>,
    escaping: Vec<MonsterId>,
    kill_on_advance: bool,
    volleys: Vec<Volley>,
    frozen: bool,
}

impl ScriptedField {
    fn escape_all(&mut self) {
        self.escaping = self.monsters.iter().map(|(id, _)| *id).collect();
    }
}

impl Battlefield for ScriptedField {
    fn spawn_monster(&mut self, _lane: u32, tier: Tier) -> MonsterId {
        let id = MonsterId::new(self.next_id);
        self.next_id += 1;
        self.monsters.push((id, tier));
        id
    }

    fn spawn_volley(&mut self, volley: &Volley) {
        self.volleys.push(volley.clone());
    }

    fn advance(&mut self, _dt: Duration) -> Vec<MonsterKill> {
        if !std::mem::take(&mut self.kill_on_advance) {
            return Vec::new();
        }
        self.monsters
            .drain(..)
            .map(|(id, tier)| MonsterKill { id, tier })
            .collect()
    }

    fn escaped_monsters(&self) -> Vec<MonsterId> {
        self.escaping
            .iter()
            .copied()
            .filter(|id| self.monsters.iter().any(|(alive, _)| alive == id))
            .collect()
    }

    fn remove_monster(&mut self, id: MonsterId) {
        self.monsters.retain(|(alive, _)| *alive != id);
        self.escaping.retain(|escaping| *escaping != id);
    }

    fn alive_monsters(&self) -> usize {
        self.monsters.len()
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }
}

fn small_wave_config(monsters: u32, interval_ms: u64) -> GameConfig {
    let mut config = GameConfig::default();
    config.wave.starting_monsters = monsters;
    config.wave.min_interval_ms = interval_ms;
    config.wave.max_interval_ms = interval_ms;
    config
}

fn started(config: GameConfig) -> Session<TierLabels> {
    let mut session = Session::new(config, TierLabels, 21).expect("valid config");
    let _ = session.start();
    session
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn spawned(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SessionEvent::MonsterSpawned { .. }))
        .count()
}

#[test]
fn escaped_monsters_count_as_kills_and_advance_the_wave() {
    let mut session = started(small_wave_config(2, 200));
    let mut field = ScriptedField::default();

    assert_eq!(spawned(&session.tick(Duration::ZERO, &mut field)), 1);
    field.escape_all();
    let events = session.tick(ms(200), &mut field);
    assert_eq!(spawned(&events), 1);
    assert!(!events
        .iter()
        .any(|event| matches!(event, SessionEvent::WaveAdvanced { .. })));

    field.escape_all();
    let events = session.tick(ms(16), &mut field);
    assert!(events.contains(&SessionEvent::WaveAdvanced { wave: 2 }));

    let stats = session.stats();
    assert_eq!(stats.lives, 8);
    assert_eq!(stats.score, 0);
    assert_eq!(stats.wave.wave, 2);
    assert_eq!(stats.wave.monsters_per_wave, 7);
}

#[test]
fn losing_every_life_freezes_the_session() {
    let mut config = small_wave_config(5, 200);
    config.lives = 1;
    let mut session = started(config);
    let mut field = ScriptedField::default();

    let _ = session.tick(Duration::ZERO, &mut field);
    field.escape_all();
    let events = session.tick(ms(16), &mut field);

    assert_eq!(events.last(), Some(&SessionEvent::GameOver { final_score: 0 }));
    assert!(field.frozen);
    assert!(session.is_game_over());
    assert_eq!(session.stats().final_score, Some(0));
    assert!(session.tick(ms(1_000), &mut field).is_empty());
    assert!(!session.submit_answer("easy").outcome.any_correct);
}

#[test]
fn fatal_escape_ends_the_game_before_the_wave_completes() {
    let mut config = small_wave_config(1, 200);
    config.lives = 1;
    let mut session = started(config);
    let mut field = ScriptedField::default();

    assert_eq!(spawned(&session.tick(Duration::ZERO, &mut field)), 1);
    field.escape_all();
    let events = session.tick(ms(16), &mut field);

    assert!(matches!(
        events.first(),
        Some(SessionEvent::MonsterEscaped { lives: 0, .. })
    ));
    assert_eq!(events.last(), Some(&SessionEvent::GameOver { final_score: 0 }));
    assert!(!events.iter().any(|event| matches!(
        event,
        SessionEvent::WaveAdvanced { .. } | SessionEvent::World(Event::SlotPlaced { .. })
    )));

    let stats = session.stats();
    assert_eq!(stats.wave.wave, 1);
    assert_eq!(stats.final_score, Some(0));
    assert_eq!(session.pending_actions(), 0);
}

#[test]
fn kills_award_tier_points() {
    let config = small_wave_config(5, 200);
    let mut session = started(config.clone());
    let mut field = ScriptedField::default();

    let _ = session.tick(Duration::ZERO, &mut field);
    let tier = field.monsters[0].1;
    field.kill_on_advance = true;
    let events = session.tick(ms(16), &mut field);

    let points = config.monsters.stats(tier).points;
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::MonsterKilled { points: awarded, .. } if *awarded == points
    )));
    assert_eq!(session.stats().score, u64::from(points));
}

#[test]
fn clearing_the_field_fast_forwards_the_next_spawn() {
    let mut session = started(small_wave_config(3, 10_000));
    let mut field = ScriptedField::default();

    let _ = session.tick(Duration::ZERO, &mut field);
    assert_eq!(session.pending_actions(), 1);

    field.kill_on_advance = true;
    let events = session.tick(ms(16), &mut field);
    let kill_index = events
        .iter()
        .position(|event| matches!(event, SessionEvent::MonsterKilled { .. }))
        .expect("kill reported");
    let spawn_index = events
        .iter()
        .position(|event| matches!(event, SessionEvent::MonsterSpawned { .. }))
        .expect("fast-forwarded spawn");
    assert!(spawn_index > kill_index);
    assert_eq!(session.pending_actions(), 1, "spawn timer was replaced, not duplicated");
    assert_eq!(session.stats().wave.spawned, 2);
}

#[test]
fn answers_activate_matching_slots_which_then_fire() {
    let mut session = started(GameConfig::default());
    let mut field = ScriptedField::default();

    let result = session.submit_answer("easy");
    assert_eq!(result.outcome.matches, 2);
    assert!(result.events.contains(&SessionEvent::World(Event::TowerActivated {
        cell: CellCoord::new(0, 0),
        tier: Tier::Easy,
    })));
    assert!(result.events.contains(&SessionEvent::World(Event::TowerActivated {
        cell: CellCoord::new(4, 0),
        tier: Tier::Easy,
    })));

    let _ = session.tick(ms(16), &mut field);
    assert_eq!(field.volleys.len(), 2);
    assert!(field.volleys.iter().all(|volley| volley.tier == Tier::Easy));
}

#[test]
fn expired_towers_become_slots_with_fresh_prompts() {
    let mut session = started(GameConfig::default());
    let mut field = ScriptedField::default();
    let _ = session.submit_answer("hard");
    let cell = CellCoord::new(2, 0);

    let mut reverted = Vec::new();
    for _ in 0..21 {
        reverted.extend(session.tick(ms(1_000), &mut field));
    }
    let revert_index = reverted
        .iter()
        .position(|event| {
            *event
                == SessionEvent::World(Event::TowerReverted {
                    cell,
                    tier: Tier::Hard,
                })
        })
        .expect("hard tower expires after 20 seconds");
    assert_eq!(
        reverted.get(revert_index + 1),
        Some(&SessionEvent::World(Event::PromptAssigned { cell }))
    );
}

#[test]
fn stale_prompts_are_revealed_then_replaced() {
    let mut session = started(GameConfig::default());
    let mut field = ScriptedField::default();

    let mut timeline = Vec::new();
    for step in 1..=46 {
        for event in session.tick(ms(500), &mut field) {
            timeline.push((step * 500, event));
        }
    }

    let revealed_at = timeline
        .iter()
        .find_map(|(at, event)| match event {
            SessionEvent::World(Event::AnswerRevealed { cell, correct_form })
                if *cell == CellCoord::new(0, 0) =>
            {
                assert_eq!(correct_form, "easy");
                Some(*at)
            }
            _ => None,
        })
        .expect("oldest prompt revealed");
    assert_eq!(revealed_at, 20_500);

    let replaced_at = timeline
        .iter()
        .find_map(|(at, event)| match event {
            SessionEvent::World(Event::PromptAssigned { cell }) if *cell == CellCoord::new(0, 0) => {
                Some(*at)
            }
            _ => None,
        })
        .expect("revealed prompt replaced");
    assert_eq!(replaced_at, 22_500);

    let reveals = timeline
        .iter()
        .filter(|(_, event)| matches!(event, SessionEvent::World(Event::AnswerRevealed { .. })))
        .count();
    assert_eq!(reveals, 1, "only one reveal per cooldown window");
}

#[test]
fn rotation_skips_prompts_replaced_by_a_wave_reset() {
    let mut session = started(small_wave_config(1, 200));
    let mut field = ScriptedField::default();
    let cell = CellCoord::new(0, 0);

    let mut revealed = false;
    for _ in 0..42 {
        revealed |= session.tick(ms(500), &mut field).iter().any(|event| {
            matches!(event, SessionEvent::World(Event::AnswerRevealed { cell: at, .. }) if *at == cell)
        });
    }
    assert!(revealed, "oldest prompt revealed before the wave ends");

    field.escape_all();
    let events = session.tick(ms(500), &mut field);
    assert!(events.contains(&SessionEvent::WaveAdvanced { wave: 2 }));
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::World(Event::SlotPlaced { cell: at, .. }) if *at == cell
    )));

    let mut later = Vec::new();
    for _ in 0..3 {
        later.extend(session.tick(ms(500), &mut field));
    }
    assert!(!later
        .iter()
        .any(|event| *event == SessionEvent::World(Event::PromptAssigned { cell })));
    assert!(!query::prompt_view(session.world())
        .get(cell)
        .expect("fresh slot prompt")
        .showing_answer);
}
