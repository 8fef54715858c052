//! Immutable session configuration.
//!
//! A [`GameConfig`] is assembled once when a session starts (from defaults,
//! a TOML document, and the menu's speed selection) and then handed by
//! reference to every system constructor. Nothing mutates it afterwards.

use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, StatOverride, Tier, TowerArchetype, TowerProfile, TowerStats};

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}")]
    Io {
        /// Location of the file that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration document is not valid TOML for this schema.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    /// A field holds a value the engine cannot run with.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human readable description of the constraint.
        reason: &'static str,
    },
}

/// Complete tuning for one game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Lane/slot grid layout.
    pub board: BoardLayout,
    /// Lives the player starts with.
    pub lives: u32,
    /// Wave pacing and difficulty mix.
    pub wave: WaveTuning,
    /// Column unlock pacing.
    pub columns: ColumnTuning,
    /// Per-tier tower profiles.
    pub towers: TowerTable,
    /// Monster durability, rewards, and movement.
    pub monsters: MonsterTuning,
    /// Prompt lifetime and rotation cadence.
    pub prompts: PromptTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board: BoardLayout::default(),
            lives: 10,
            wave: WaveTuning::default(),
            columns: ColumnTuning::default(),
            towers: TowerTable::default(),
            monsters: MonsterTuning::default(),
            prompts: PromptTuning::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a configuration from a TOML document.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serialises the configuration into a TOML document.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Applies the menu's game speed selection.
    ///
    /// Spawn rates and monster movement scale with the speed multiplier.
    #[must_use]
    pub fn with_speed(mut self, speed: GameSpeed) -> Self {
        let multiplier = speed.multiplier();
        self.wave.spawn_rate_start *= multiplier;
        self.wave.spawn_rate_end *= multiplier;
        self.monsters.speed *= multiplier as f32;
        self
    }

    /// Checks every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.lanes == 0 {
            return Err(invalid("board.lanes", "must be at least 1"));
        }
        if self.board.slots_per_lane == 0 {
            return Err(invalid("board.slots_per_lane", "must be at least 1"));
        }
        if self.board.slot_pattern.is_empty() {
            return Err(invalid("board.slot_pattern", "must name at least one tier"));
        }
        if self.lives == 0 {
            return Err(invalid("lives", "must be at least 1"));
        }
        if self.wave.starting_monsters == 0 {
            return Err(invalid("wave.starting_monsters", "must be at least 1"));
        }
        if self.wave.min_interval_ms == 0 {
            return Err(invalid("wave.min_interval_ms", "must be positive"));
        }
        if self.wave.min_interval_ms > self.wave.max_interval_ms {
            return Err(invalid(
                "wave.min_interval_ms",
                "must not exceed wave.max_interval_ms",
            ));
        }
        let rates = [self.wave.spawn_rate_start, self.wave.spawn_rate_end];
        if rates.iter().any(|rate| !rate.is_finite() || *rate < 0.0) {
            return Err(invalid("wave.spawn_rate", "must be finite and non-negative"));
        }
        let weights = self
            .wave
            .difficulty_start
            .iter()
            .chain(self.wave.difficulty_end.iter());
        for weight in weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(invalid("wave.difficulty", "weights must be non-negative"));
            }
        }
        if self.columns.waves_per_column == 0 {
            return Err(invalid("columns.waves_per_column", "must be at least 1"));
        }
        if self.columns.max_columns == 0 {
            return Err(invalid("columns.max_columns", "must be at least 1"));
        }
        for tier in Tier::ALL {
            let profile = self.towers.get(tier);
            if profile.base_stats.fire_period_ms == 0 {
                return Err(invalid("towers.base_stats.fire_period_ms", "must be positive"));
            }
            if profile.upgrades.iter().any(|step| step.fire_period_ms == Some(0)) {
                return Err(invalid("towers.upgrades.fire_period_ms", "must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Game speed chosen from the menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSpeed {
    /// Slower spawns and monsters.
    Relaxed,
    /// Reference pacing.
    #[default]
    Normal,
    /// Faster spawns and monsters.
    Fast,
}

impl GameSpeed {
    /// Factor applied to spawn rates and monster speed.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Relaxed => 0.75,
            Self::Normal => 1.0,
            Self::Fast => 1.5,
        }
    }
}

/// Dimensions of the lane/slot grid and the tier assigned to each cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardLayout {
    /// Number of lanes monsters travel along.
    pub lanes: u32,
    /// Number of tower slots per lane; also the number of columns.
    pub slots_per_lane: u32,
    /// Tier pattern, rotated by `(lane + slot) % len` for each cell.
    pub slot_pattern: Vec<Tier>,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            lanes: 5,
            slots_per_lane: 5,
            slot_pattern: vec![Tier::Easy, Tier::Medium, Tier::Hard, Tier::Cluster, Tier::Easy],
        }
    }
}

impl BoardLayout {
    /// Number of cells on the board.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.lanes) * u64::from(self.slots_per_lane);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the coordinate lies on the board.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.lane() < self.lanes && cell.slot() < self.slots_per_lane
    }

    /// Dense row-major index of the cell, lane by lane.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let lane = usize::try_from(cell.lane()).ok()?;
        let slot = usize::try_from(cell.slot()).ok()?;
        let width = usize::try_from(self.slots_per_lane).ok()?;
        Some(lane * width + slot)
    }

    /// Tier of the slot occupying the cell.
    #[must_use]
    pub fn tier_for(&self, cell: CellCoord) -> Tier {
        if self.slot_pattern.is_empty() {
            return Tier::Easy;
        }
        let offset = u64::from(cell.lane()) + u64::from(cell.slot());
        let index = offset % self.slot_pattern.len() as u64;
        self.slot_pattern[index as usize]
    }

    /// Every cell in the first `columns` columns, lane by lane.
    pub fn cells_in_columns(&self, columns: u32) -> impl Iterator<Item = CellCoord> {
        let columns = columns.min(self.slots_per_lane);
        let lanes = self.lanes;
        (0..lanes).flat_map(move |lane| (0..columns).map(move |slot| CellCoord::new(lane, slot)))
    }
}

/// Wave size, pacing, and difficulty-mix tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Monsters in wave 1.
    pub starting_monsters: u32,
    /// Additional monsters for every subsequent wave.
    pub additional_monsters_per_wave: u32,
    /// Fraction of the wave spawned per second at the start of a wave.
    pub spawn_rate_start: f64,
    /// Fraction of the wave spawned per second at the end of a wave.
    pub spawn_rate_end: f64,
    /// Easy/medium/hard weights at the start of a wave.
    pub difficulty_start: [f64; 3],
    /// Easy/medium/hard weights at the end of a wave.
    pub difficulty_end: [f64; 3],
    /// Lower clamp for the spawn interval in milliseconds.
    pub min_interval_ms: u64,
    /// Upper clamp for the spawn interval in milliseconds.
    pub max_interval_ms: u64,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            starting_monsters: 30,
            additional_monsters_per_wave: 5,
            spawn_rate_start: 0.01,
            spawn_rate_end: 0.05,
            difficulty_start: [0.9, 0.08, 0.02],
            difficulty_end: [0.0, 0.5, 0.5],
            min_interval_ms: 200,
            max_interval_ms: 10_000,
        }
    }
}

/// Column unlock pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnTuning {
    /// Waves played before another column unlocks.
    pub waves_per_column: u32,
    /// Upper bound on unlocked columns.
    pub max_columns: u32,
}

impl Default for ColumnTuning {
    fn default() -> Self {
        Self {
            waves_per_column: 3,
            max_columns: 5,
        }
    }
}

/// Tower profiles for every tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    /// Profile of easy towers.
    pub easy: TowerProfile,
    /// Profile of medium towers.
    pub medium: TowerProfile,
    /// Profile of hard towers.
    pub hard: TowerProfile,
    /// Profile of cluster towers.
    pub cluster: TowerProfile,
}

impl TowerTable {
    /// Profile associated with the tier.
    #[must_use]
    pub fn get(&self, tier: Tier) -> &TowerProfile {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Medium => &self.medium,
            Tier::Hard => &self.hard,
            Tier::Cluster => &self.cluster,
        }
    }
}

impl Default for TowerTable {
    fn default() -> Self {
        Self {
            easy: TowerProfile {
                name: "Turret".to_owned(),
                archetype: TowerArchetype::Standard,
                base_stats: TowerStats {
                    damage: 1,
                    fire_period_ms: 2_000,
                    projectile_speed: 300.0,
                    range: 1_000.0,
                    projectile_count: 1,
                    spread_angle_deg: 0.0,
                    cluster_count: 0,
                },
                upgrade_duration_ms: 60_000,
                upgrades: [1_000, 666, 500, 400]
                    .into_iter()
                    .map(|fire_period_ms| StatOverride {
                        fire_period_ms: Some(fire_period_ms),
                        ..StatOverride::default()
                    })
                    .collect(),
            },
            medium: TowerProfile {
                name: "Multi-Shot".to_owned(),
                archetype: TowerArchetype::Spread,
                base_stats: TowerStats {
                    damage: 2,
                    fire_period_ms: 2_000,
                    projectile_speed: 300.0,
                    range: 1_000.0,
                    projectile_count: 3,
                    spread_angle_deg: 32.5,
                    cluster_count: 0,
                },
                upgrade_duration_ms: 30_000,
                upgrades: [(4, 45.0), (5, 57.5), (6, 70.0)]
                    .into_iter()
                    .map(|(count, angle)| StatOverride {
                        projectile_count: Some(count),
                        spread_angle_deg: Some(angle),
                        ..StatOverride::default()
                    })
                    .collect(),
            },
            hard: TowerProfile {
                name: "Sniper".to_owned(),
                archetype: TowerArchetype::Sniper,
                base_stats: TowerStats {
                    damage: 3,
                    fire_period_ms: 3_000,
                    projectile_speed: 600.0,
                    range: 2_000.0,
                    projectile_count: 1,
                    spread_angle_deg: 0.0,
                    cluster_count: 0,
                },
                upgrade_duration_ms: 20_000,
                upgrades: [(4, 750.0), (5, 900.0), (6, 1_050.0)]
                    .into_iter()
                    .map(|(damage, speed)| StatOverride {
                        damage: Some(damage),
                        projectile_speed: Some(speed),
                        ..StatOverride::default()
                    })
                    .collect(),
            },
            cluster: TowerProfile {
                name: "Cluster".to_owned(),
                archetype: TowerArchetype::Cluster,
                base_stats: TowerStats {
                    damage: 1,
                    fire_period_ms: 2_500,
                    projectile_speed: 250.0,
                    range: 1_000.0,
                    projectile_count: 1,
                    spread_angle_deg: 0.0,
                    cluster_count: 4,
                },
                upgrade_duration_ms: 30_000,
                upgrades: [6, 8, 10]
                    .into_iter()
                    .map(|cluster_count| StatOverride {
                        cluster_count: Some(cluster_count),
                        ..StatOverride::default()
                    })
                    .collect(),
            },
        }
    }
}

/// Durability and reward of a monster tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStats {
    /// Damage required to destroy the monster.
    pub health: u32,
    /// Score awarded when the monster is destroyed.
    pub points: u32,
}

/// Monster tuning consumed by battlefield collaborators and scoring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterTuning {
    /// Easy monsters.
    pub easy: MonsterStats,
    /// Medium monsters.
    pub medium: MonsterStats,
    /// Hard monsters.
    pub hard: MonsterStats,
    /// Walking speed in world units per second.
    pub speed: f32,
}

impl MonsterTuning {
    /// Stats of the tier; cluster monsters are never spawned and share the hard profile.
    #[must_use]
    pub const fn stats(&self, tier: Tier) -> MonsterStats {
        match tier {
            Tier::Easy => self.easy,
            Tier::Medium => self.medium,
            Tier::Hard | Tier::Cluster => self.hard,
        }
    }
}

impl Default for MonsterTuning {
    fn default() -> Self {
        Self {
            easy: MonsterStats {
                health: 1,
                points: 10,
            },
            medium: MonsterStats {
                health: 4,
                points: 25,
            },
            hard: MonsterStats {
                health: 9,
                points: 50,
            },
            speed: 30.0,
        }
    }
}

/// Prompt lifetime and rotation cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTuning {
    /// Age after which an unanswered prompt is rotated, in milliseconds.
    pub lifetime_ms: u64,
    /// Minimum gap between two rotations, in milliseconds.
    pub rotation_cooldown_ms: u64,
    /// How long the correct answer stays on screen, in milliseconds.
    pub reveal_ms: u64,
    /// How often the game loop looks for expired prompts, in milliseconds.
    pub rotation_check_interval_ms: u64,
}

impl PromptTuning {
    /// Age after which an unanswered prompt is rotated.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Minimum gap between two rotations.
    #[must_use]
    pub const fn rotation_cooldown(&self) -> Duration {
        Duration::from_millis(self.rotation_cooldown_ms)
    }

    /// How long the correct answer stays on screen.
    #[must_use]
    pub const fn reveal_duration(&self) -> Duration {
        Duration::from_millis(self.reveal_ms)
    }

    /// How often the game loop looks for expired prompts.
    #[must_use]
    pub const fn rotation_check_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_check_interval_ms)
    }
}

impl Default for PromptTuning {
    fn default() -> Self {
        Self {
            lifetime_ms: 20_000,
            rotation_cooldown_ms: 3_000,
            reveal_ms: 2_000,
            rotation_check_interval_ms: 500,
        }
    }
}
