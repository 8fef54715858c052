#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game loop coordination for a single Quiz Defence session.
//!
//! [`Session`] owns the world, every system and the discrete-event
//! scheduler. Each call to [`Session::tick`] runs the frame in a fixed order:
//! tower expiry and firing, due scheduled actions, the battlefield step,
//! escapes, the game-over check and finally throttled prompt rotation.

mod battlefield;
pub mod timers;

use std::time::Duration;

use quiz_defence_core::{CellCoord, Command, ConfigError, Event, GameConfig, PromptProvider, Tier};
use quiz_defence_system_column_progression::ColumnProgression;
use quiz_defence_system_tower_combat::{TowerCombat, Volley};
use quiz_defence_system_tower_lifecycle::{AnswerOutcome, PromptRotation, TowerLifecycle};
use quiz_defence_system_wave_scheduler::{KillOutcome, WaveScheduler, WaveState};
use quiz_defence_world::{self as world, query, World};

pub use battlefield::{Battlefield, MonsterId, MonsterKill};
use timers::{Scheduler, TimerId};

/// Notifications produced while the session advances.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Event reported by the world.
    World(Event),
    /// A monster entered the field.
    MonsterSpawned {
        /// Battlefield identifier of the monster.
        id: MonsterId,
        /// Lane the monster entered.
        lane: u32,
        /// Tier of the monster.
        tier: Tier,
    },
    /// A monster was destroyed by a tower.
    MonsterKilled {
        /// Battlefield identifier of the monster.
        id: MonsterId,
        /// Tier of the monster.
        tier: Tier,
        /// Points added to the score.
        points: u32,
    },
    /// A monster reached the base.
    MonsterEscaped {
        /// Battlefield identifier of the monster.
        id: MonsterId,
        /// Lives remaining after the escape.
        lives: u32,
    },
    /// The previous wave completed and a new one began.
    WaveAdvanced {
        /// One-based number of the new wave.
        wave: u32,
    },
    /// Lives ran out; the session is frozen.
    GameOver {
        /// Score at the moment the game ended.
        final_score: u64,
    },
}

/// Result of submitting an answer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerResult {
    /// Aggregated validation outcome across all visible cells.
    pub outcome: AnswerOutcome,
    /// Events reported while applying the resulting commands.
    pub events: Vec<SessionEvent>,
}

/// Score, lives and wave counters exposed to adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStats {
    /// Points accumulated from kills and answer bonuses.
    pub score: u64,
    /// Lives remaining.
    pub lives: u32,
    /// Progress of the wave in progress.
    pub wave: WaveState,
    /// Simulation time since the session started.
    pub elapsed: Duration,
    /// Score frozen at game over.
    pub final_score: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Spawn,
    /// Replaces the revealed prompt that was assigned at `set_at`.
    RotatePrompt { cell: CellCoord, set_at: Duration },
}

/// Coordinates the world, systems and scheduler for one game.
#[derive(Debug)]
pub struct Session<P> {
    config: GameConfig,
    world: World,
    provider: P,
    waves: WaveScheduler,
    columns: ColumnProgression,
    lifecycle: TowerLifecycle,
    rotation: PromptRotation,
    combat: TowerCombat,
    timers: Scheduler<Action>,
    spawn_timer: Option<TimerId>,
    since_rotation_check: Duration,
    score: u64,
    lives: u32,
    final_score: Option<u64>,
    started: bool,
    commands: Vec<Command>,
    world_events: Vec<Event>,
    volleys: Vec<Volley>,
}

impl<P: PromptProvider> Session<P> {
    /// Creates a session after validating the configuration.
    pub fn new(config: GameConfig, provider: P, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world: World::new(&config),
            waves: WaveScheduler::new(&config.wave, config.board.lanes, seed),
            columns: ColumnProgression::new(&config.columns),
            lifecycle: TowerLifecycle::new(),
            rotation: PromptRotation::new(&config.prompts),
            combat: TowerCombat::new(),
            timers: Scheduler::new(),
            spawn_timer: None,
            since_rotation_check: Duration::ZERO,
            score: 0,
            lives: config.lives,
            final_score: None,
            started: false,
            commands: Vec::new(),
            world_events: Vec::new(),
            volleys: Vec::new(),
            provider,
            config,
        })
    }

    /// Builds the first-wave board and schedules the first spawn.
    ///
    /// Calling this more than once has no further effect.
    pub fn start(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        if self.started {
            return out;
        }
        self.started = true;
        log::info!("session started: wave 1, {} lives", self.lives);
        self.prepare_wave(1, &mut out);
        out
    }

    /// Advances the session by `dt`.
    pub fn tick<B>(&mut self, dt: Duration, battlefield: &mut B) -> Vec<SessionEvent>
    where
        B: Battlefield + ?Sized,
    {
        let mut out = Vec::new();
        if !self.started || self.is_game_over() {
            return out;
        }

        self.advance_world(dt, battlefield, &mut out);
        self.run_due_actions(battlefield, &mut out);

        for kill in battlefield.advance(dt) {
            let points = self.config.monsters.stats(kill.tier).points;
            self.score = self.score.saturating_add(u64::from(points));
            out.push(SessionEvent::MonsterKilled {
                id: kill.id,
                tier: kill.tier,
                points,
            });
            let outcome = self.waves.on_monster_killed(battlefield.alive_monsters());
            self.handle_kill_outcome(outcome, battlefield, &mut out);
        }

        for id in battlefield.escaped_monsters() {
            battlefield.remove_monster(id);
            self.lives = self.lives.saturating_sub(1);
            out.push(SessionEvent::MonsterEscaped {
                id,
                lives: self.lives,
            });
            if self.lives == 0 {
                self.end_game(battlefield, &mut out);
                return out;
            }
            // Escapes count towards wave completion just like kills.
            let outcome = self.waves.on_monster_killed(battlefield.alive_monsters());
            self.handle_kill_outcome(outcome, battlefield, &mut out);
        }

        self.since_rotation_check = self.since_rotation_check.saturating_add(dt);
        if self.since_rotation_check >= self.config.prompts.rotation_check_interval() {
            self.since_rotation_check = Duration::ZERO;
            self.rotate_prompts(&mut out);
        }

        out
    }

    /// Validates an answer against every visible prompt and applies the effects.
    pub fn submit_answer(&mut self, answer: &str) -> AnswerResult {
        if !self.started || self.is_game_over() {
            return AnswerResult::default();
        }

        let view = query::prompt_view(&self.world);
        let outcome = self.lifecycle.on_answer_submitted(
            answer,
            &view,
            &mut self.provider,
            &mut self.commands,
        );
        self.score = self.score.saturating_add(u64::from(outcome.bonus_points));

        let mut events = Vec::new();
        self.flush_commands(&mut events);
        AnswerResult { outcome, events }
    }

    /// Current score, lives and wave counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            score: self.score,
            lives: self.lives,
            wave: self.waves.state(),
            elapsed: query::now(&self.world),
            final_score: self.final_score,
        }
    }

    /// Reports whether lives ran out.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.final_score.is_some()
    }

    /// Provides read-only access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the session was created with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of actions waiting in the scheduler.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.timers.len()
    }

    fn advance_world<B>(&mut self, dt: Duration, battlefield: &mut B, out: &mut Vec<SessionEvent>)
    where
        B: Battlefield + ?Sized,
    {
        self.world_events.clear();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.world_events);

        self.lifecycle
            .on_events(&self.world_events, &mut self.provider, &mut self.commands);
        self.volleys.clear();
        self.combat.handle(&self.world_events, &mut self.volleys);
        for volley in &self.volleys {
            battlefield.spawn_volley(volley);
        }

        out.extend(
            self.world_events
                .drain(..)
                .filter(|event| !matches!(event, Event::TimeAdvanced { .. }))
                .map(SessionEvent::World),
        );
        self.flush_commands(out);
    }

    fn run_due_actions<B>(&mut self, battlefield: &mut B, out: &mut Vec<SessionEvent>)
    where
        B: Battlefield + ?Sized,
    {
        let now = query::now(&self.world);
        for action in self.timers.drain_due(now) {
            match action {
                Action::Spawn => {
                    self.spawn_timer = None;
                    self.spawn_next(battlefield, out);
                }
                Action::RotatePrompt { cell, set_at } => {
                    let still_revealed = query::prompt_view(&self.world)
                        .get(cell)
                        .is_some_and(|pending| pending.showing_answer && pending.set_at == set_at);
                    if !still_revealed {
                        log::debug!("prompt at {cell:?} already replaced, skipping rotation");
                        continue;
                    }
                    let Some(tier) = query::tier(&self.world, cell) else {
                        continue;
                    };
                    let prompt = self.provider.generate(tier);
                    self.commands.push(Command::AssignPrompt { cell, prompt });
                    self.flush_commands(out);
                }
            }
        }
    }

    fn spawn_next<B>(&mut self, battlefield: &mut B, out: &mut Vec<SessionEvent>)
    where
        B: Battlefield + ?Sized,
    {
        let Some(order) = self.waves.spawn() else {
            return;
        };
        let id = battlefield.spawn_monster(order.lane, order.tier);
        out.push(SessionEvent::MonsterSpawned {
            id,
            lane: order.lane,
            tier: order.tier,
        });
        if let Some(delay) = order.next_delay {
            let fire_at = query::now(&self.world).saturating_add(delay);
            self.spawn_timer = Some(self.timers.schedule(fire_at, Action::Spawn));
        }
    }

    fn end_game<B>(&mut self, battlefield: &mut B, out: &mut Vec<SessionEvent>)
    where
        B: Battlefield + ?Sized,
    {
        battlefield.freeze();
        self.cancel_spawn_timer();
        self.final_score = Some(self.score);
        log::info!("game over with score {}", self.score);
        out.push(SessionEvent::GameOver {
            final_score: self.score,
        });
    }

    fn cancel_spawn_timer(&mut self) {
        if let Some(id) = self.spawn_timer.take() {
            let _ = self.timers.cancel(id);
        }
    }

    fn handle_kill_outcome<B>(
        &mut self,
        outcome: KillOutcome,
        battlefield: &mut B,
        out: &mut Vec<SessionEvent>,
    ) where
        B: Battlefield + ?Sized,
    {
        if let Some(wave) = outcome.wave_completed {
            out.push(SessionEvent::WaveAdvanced { wave });
            self.prepare_wave(wave, out);
        } else if outcome.fast_forward {
            log::debug!("field cleared early, spawning next monster immediately");
            self.cancel_spawn_timer();
            self.spawn_next(battlefield, out);
        }
    }

    fn prepare_wave(&mut self, wave: u32, out: &mut Vec<SessionEvent>) {
        let layout = query::layout(&self.world).clone();
        self.columns
            .on_wave_changed(wave, &layout, &mut self.provider, &mut self.commands);
        self.flush_commands(out);

        self.cancel_spawn_timer();
        let now = query::now(&self.world);
        self.spawn_timer = Some(self.timers.schedule(now, Action::Spawn));
    }

    fn rotate_prompts(&mut self, out: &mut Vec<SessionEvent>) {
        let now = query::now(&self.world);
        let view = query::prompt_view(&self.world);
        let Some(revealed) = self.rotation.handle(now, &view, &mut self.commands) else {
            return;
        };
        let set_at = view.get(revealed).map_or(now, |pending| pending.set_at);

        let reveal_at = now.saturating_add(self.config.prompts.reveal_duration());
        let mut events = Vec::new();
        self.flush_commands(&mut events);
        for event in &events {
            if let SessionEvent::World(Event::AnswerRevealed { cell, .. }) = event {
                let _ = self
                    .timers
                    .schedule(reveal_at, Action::RotatePrompt { cell: *cell, set_at });
            }
        }
        out.extend(events);
    }

    fn flush_commands(&mut self, out: &mut Vec<SessionEvent>) {
        let mut events = Vec::new();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }
        out.extend(events.into_iter().map(SessionEvent::World));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{Prompt, Validation};

    struct Echo;

    impl PromptProvider for Echo {
        fn generate(&mut self, tier: Tier) -> Prompt {
            Prompt::with_answer(tier.label(), tier.label())
        }

        fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
            if prompt.primary_answer() == input {
                Validation::correct(input)
            } else {
                Validation::incorrect(prompt.primary_answer())
            }
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig {
            lives: 0,
            ..GameConfig::default()
        };
        assert!(Session::new(config, Echo, 0).is_err());
    }

    #[test]
    fn start_is_idempotent() {
        let mut session = Session::new(GameConfig::default(), Echo, 0).expect("valid config");
        let first = session.start();
        assert!(first.contains(&SessionEvent::World(Event::ColumnsRevealed {
            previous: 0,
            visible: 1,
        })));
        assert!(session.start().is_empty());
        assert_eq!(session.pending_actions(), 1);
    }
}
