#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave pacing and difficulty-mix scheduling.
//!
//! The scheduler decides how many monsters a wave contains, which lane and
//! tier each spawn uses, and how long to wait before the next spawn. It owns
//! no timers: callers schedule the returned delays themselves.

use std::time::Duration;

use quiz_defence_core::{Tier, WaveTuning};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of monsters in the given one-based wave.
#[must_use]
pub fn monsters_for_wave(tuning: &WaveTuning, wave: u32) -> u32 {
    let extra_waves = wave.saturating_sub(1);
    tuning
        .starting_monsters
        .saturating_add(extra_waves.saturating_mul(tuning.additional_monsters_per_wave))
}

/// Delay between spawns once `spawned` of `total` monsters have entered the field.
///
/// Non-finite or non-positive rates produce the maximum interval.
#[must_use]
pub fn spawn_interval(tuning: &WaveTuning, spawned: u32, total: u32) -> Duration {
    let min = tuning.min_interval_ms.min(tuning.max_interval_ms);
    let max = tuning.max_interval_ms;
    let progress = progress(spawned, total);
    let rate = lerp(tuning.spawn_rate_start, tuning.spawn_rate_end, progress);
    let per_wave = rate * f64::from(total);
    if !per_wave.is_finite() || per_wave <= 0.0 {
        return Duration::from_millis(max);
    }

    let interval_ms = 1_000.0 / per_wave;
    if !interval_ms.is_finite() || interval_ms >= max as f64 {
        return Duration::from_millis(max);
    }
    if interval_ms <= min as f64 {
        return Duration::from_millis(min);
    }
    Duration::from_millis(interval_ms.round() as u64)
}

/// Interpolated `[easy, medium, hard]` weights at the given wave progress.
///
/// The weights are deliberately not renormalised; see [`pick_tier`].
#[must_use]
pub fn difficulty_weights(tuning: &WaveTuning, progress: f64) -> [f64; 3] {
    let progress = progress.clamp(0.0, 1.0);
    let mut weights = [0.0; 3];
    for (index, weight) in weights.iter_mut().enumerate() {
        *weight = lerp(
            tuning.difficulty_start[index],
            tuning.difficulty_end[index],
            progress,
        );
    }
    weights
}

/// Selects a monster tier by walking cumulative weight thresholds.
///
/// `draw` is a uniform sample in `[0, 1)`. Any mass the weights leave
/// uncovered falls to the last tier.
#[must_use]
pub fn pick_tier(weights: [f64; 3], draw: f64) -> Tier {
    let mut threshold = 0.0;
    for (tier, weight) in Tier::MONSTER_TIERS.into_iter().zip(weights) {
        threshold += weight;
        if draw < threshold {
            return tier;
        }
    }
    Tier::Hard
}

fn progress(spawned: u32, total: u32) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (f64::from(spawned) / f64::from(total)).clamp(0.0, 1.0)
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

/// Spawn decision for a single monster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnOrder {
    /// Lane the monster enters.
    pub lane: u32,
    /// Tier of the monster.
    pub tier: Tier,
    /// Delay until the next spawn, or `None` once the wave has spawned everything.
    pub next_delay: Option<Duration>,
}

/// Consequence of a monster leaving the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KillOutcome {
    /// New wave number when this kill completed the wave.
    pub wave_completed: Option<u32>,
    /// Set when the field is empty while the wave still has monsters to spawn.
    pub fast_forward: bool,
}

/// Counters describing the wave in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveState {
    /// One-based wave number.
    pub wave: u32,
    /// Total monsters in the wave.
    pub monsters_per_wave: u32,
    /// Monsters spawned so far.
    pub spawned: u32,
    /// Monsters killed or escaped so far.
    pub killed: u32,
}

/// Stateful spawn scheduler for the wave in progress.
#[derive(Debug)]
pub struct WaveScheduler {
    tuning: WaveTuning,
    lanes: u32,
    state: WaveState,
    rng: ChaCha8Rng,
}

impl WaveScheduler {
    /// Creates a scheduler positioned at the start of wave one.
    #[must_use]
    pub fn new(tuning: &WaveTuning, lanes: u32, seed: u64) -> Self {
        Self {
            tuning: tuning.clone(),
            lanes: lanes.max(1),
            state: WaveState {
                wave: 1,
                monsters_per_wave: monsters_for_wave(tuning, 1),
                spawned: 0,
                killed: 0,
            },
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Counters of the wave in progress.
    #[must_use]
    pub const fn state(&self) -> WaveState {
        self.state
    }

    /// One-based number of the wave in progress.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.state.wave
    }

    /// Reports whether every monster of the wave has been spawned.
    #[must_use]
    pub const fn is_spawning_complete(&self) -> bool {
        self.state.spawned >= self.state.monsters_per_wave
    }

    /// Difficulty weights the next spawn will be drawn from.
    #[must_use]
    pub fn current_weights(&self) -> [f64; 3] {
        difficulty_weights(
            &self.tuning,
            progress(self.state.spawned, self.state.monsters_per_wave),
        )
    }

    /// Interval that applies at the current spawn count.
    #[must_use]
    pub fn current_interval(&self) -> Duration {
        spawn_interval(&self.tuning, self.state.spawned, self.state.monsters_per_wave)
    }

    /// Spawns the next monster of the wave, if any remain.
    pub fn spawn(&mut self) -> Option<SpawnOrder> {
        if self.is_spawning_complete() {
            return None;
        }

        let lane = self.rng.gen_range(0..self.lanes);
        let weights = self.current_weights();
        let tier = pick_tier(weights, self.rng.gen::<f64>());
        self.state.spawned += 1;

        let next_delay = (!self.is_spawning_complete()).then(|| self.current_interval());
        log::debug!(
            "wave {} spawn {}/{}: {} monster in lane {lane}",
            self.state.wave,
            self.state.spawned,
            self.state.monsters_per_wave,
            tier.label()
        );
        Some(SpawnOrder {
            lane,
            tier,
            next_delay,
        })
    }

    /// Records a monster leaving the field, either killed or escaped.
    ///
    /// `alive` is the number of monsters remaining on the field afterwards.
    pub fn on_monster_killed(&mut self, alive: usize) -> KillOutcome {
        if self.state.killed < self.state.spawned {
            self.state.killed += 1;
        }

        let total = self.state.monsters_per_wave;
        if self.state.spawned == total && self.state.killed == total {
            let wave = self.state.wave.saturating_add(1);
            self.state = WaveState {
                wave,
                monsters_per_wave: monsters_for_wave(&self.tuning, wave),
                spawned: 0,
                killed: 0,
            };
            log::info!("wave {wave} begins with {} monsters", self.state.monsters_per_wave);
            return KillOutcome {
                wave_completed: Some(wave),
                fast_forward: false,
            };
        }

        KillOutcome {
            wave_completed: None,
            fast_forward: alive == 0 && !self.is_spawning_complete(),
        }
    }
}
