#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Quiz Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations of the lane/slot grid, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values for systems to react to deterministically. Tuning lives in the
//! immutable [`GameConfig`] handed to every constructor at session start.

mod config;
mod prompt;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{
    BoardLayout, ColumnTuning, ConfigError, GameConfig, GameSpeed, MonsterStats, MonsterTuning,
    PromptTuning, TowerTable, WaveTuning,
};
pub use prompt::{Prompt, PromptProvider, Validation};

/// Difficulty classification shared by monsters, towers, and prompts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Entry level tier.
    Easy,
    /// Intermediate tier.
    Medium,
    /// Advanced tier.
    Hard,
    /// Support tier whose towers fire fragmenting projectiles.
    Cluster,
}

impl Tier {
    /// Every tier in declaration order.
    pub const ALL: [Tier; 4] = [Tier::Easy, Tier::Medium, Tier::Hard, Tier::Cluster];

    /// Tiers that monsters may be spawned in, matching the difficulty-mix tuple.
    pub const MONSTER_TIERS: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    /// Tower archetype built when a slot of this tier is activated.
    #[must_use]
    pub const fn archetype(self) -> TowerArchetype {
        match self {
            Self::Easy => TowerArchetype::Standard,
            Self::Medium => TowerArchetype::Spread,
            Self::Hard => TowerArchetype::Sniper,
            Self::Cluster => TowerArchetype::Cluster,
        }
    }

    /// Relative prompt difficulty of the tier.
    ///
    /// Cluster prompts are as demanding as hard ones.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard | Self::Cluster => 2,
        }
    }

    /// Clamps the tier down to `base` whenever it would exceed the player's selection.
    #[must_use]
    pub const fn clamp_to(self, base: Tier) -> Tier {
        if self.rank() > base.rank() {
            base
        } else {
            self
        }
    }

    /// Lowercase label used in logs and adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Cluster => "cluster",
        }
    }
}

/// Firing behaviour families available to towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerArchetype {
    /// Single straight projectile.
    Standard,
    /// Fan of projectiles spread around the firing axis.
    Spread,
    /// Single fast, hard-hitting projectile.
    Sniper,
    /// Single projectile that bursts into fragments on impact.
    Cluster,
}

impl TowerArchetype {
    /// Dense index of the archetype, suitable for lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Standard => 0,
            Self::Spread => 1,
            Self::Sniper => 2,
            Self::Cluster => 3,
        }
    }
}

/// Location of a single grid cell expressed as lane and slot indices.
///
/// The slot index doubles as the column index used for progressive unlocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    lane: u32,
    slot: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(lane: u32, slot: u32) -> Self {
        Self { lane, slot }
    }

    /// Zero-based lane index of the cell.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.lane
    }

    /// Zero-based slot (column) index of the cell.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }
}

/// Complete stat bundle describing how a tower fires.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Damage dealt by each projectile (or each fragment for cluster towers).
    pub damage: u32,
    /// Period between consecutive shots in milliseconds.
    pub fire_period_ms: u64,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Maximum travel distance of a projectile in world units.
    pub range: f32,
    /// Number of projectiles fired per volley.
    pub projectile_count: u32,
    /// Total angle covered by a spread volley, in degrees.
    pub spread_angle_deg: f32,
    /// Number of fragments released when a cluster projectile bursts.
    pub cluster_count: u32,
}

impl TowerStats {
    /// Returns a copy of the stats with every field named by `step` overwritten.
    #[must_use]
    pub fn merged(mut self, step: &StatOverride) -> Self {
        if let Some(damage) = step.damage {
            self.damage = damage;
        }
        if let Some(fire_period_ms) = step.fire_period_ms {
            self.fire_period_ms = fire_period_ms;
        }
        if let Some(projectile_speed) = step.projectile_speed {
            self.projectile_speed = projectile_speed;
        }
        if let Some(range) = step.range {
            self.range = range;
        }
        if let Some(projectile_count) = step.projectile_count {
            self.projectile_count = projectile_count;
        }
        if let Some(spread_angle_deg) = step.spread_angle_deg {
            self.spread_angle_deg = spread_angle_deg;
        }
        if let Some(cluster_count) = step.cluster_count {
            self.cluster_count = cluster_count;
        }
        self
    }

    /// Period between consecutive shots.
    #[must_use]
    pub const fn fire_period(&self) -> Duration {
        Duration::from_millis(self.fire_period_ms)
    }
}

/// Declarative partial stat bundle applied by a single upgrade step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatOverride {
    /// Replacement projectile damage.
    pub damage: Option<u32>,
    /// Replacement firing period in milliseconds.
    pub fire_period_ms: Option<u64>,
    /// Replacement projectile speed.
    pub projectile_speed: Option<f32>,
    /// Replacement projectile range.
    pub range: Option<f32>,
    /// Replacement projectile count.
    pub projectile_count: Option<u32>,
    /// Replacement spread angle in degrees.
    pub spread_angle_deg: Option<f32>,
    /// Replacement fragment count.
    pub cluster_count: Option<u32>,
}

/// Data-driven description of a tower tier: base stats and its upgrade path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerProfile {
    /// Display name of the tower.
    pub name: String,
    /// Firing behaviour of the tower.
    pub archetype: TowerArchetype,
    /// Stats of a freshly activated tower.
    pub base_stats: TowerStats,
    /// Lifetime of each activation or upgrade in milliseconds.
    pub upgrade_duration_ms: u64,
    /// Ordered upgrade steps; step `n` produces level `n + 1`.
    pub upgrades: Vec<StatOverride>,
}

impl TowerProfile {
    /// Highest level reachable through upgrades.
    #[must_use]
    pub fn max_upgrade_level(&self) -> u32 {
        u32::try_from(self.upgrades.len()).unwrap_or(u32::MAX)
    }

    /// Upgrade step that raises a tower from `level` to `level + 1`.
    #[must_use]
    pub fn step(&self, level: u32) -> Option<&StatOverride> {
        usize::try_from(level)
            .ok()
            .and_then(|index| self.upgrades.get(index))
    }

    /// Stats at `level`, recomputed from the base by applying steps `[0, level)` in order.
    #[must_use]
    pub fn stats_at_level(&self, level: u32) -> TowerStats {
        let applied = usize::try_from(level).unwrap_or(usize::MAX);
        self.upgrades
            .iter()
            .take(applied)
            .fold(self.base_stats, |stats, step| stats.merged(step))
    }

    /// Lifetime of each activation or upgrade.
    #[must_use]
    pub const fn upgrade_duration(&self) -> Duration {
        Duration::from_millis(self.upgrade_duration_ms)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock, expiring upgrades and cycling tower cooldowns.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces whatever occupies the cell with a fresh tower slot.
    PlaceSlot {
        /// Cell receiving the slot.
        cell: CellCoord,
        /// Difficulty tier of the slot.
        tier: Tier,
        /// Prompt the player must answer to activate the slot.
        prompt: Prompt,
    },
    /// Converts a slot into an active tower after its prompt was answered.
    ActivateTower {
        /// Cell holding the answered slot.
        cell: CellCoord,
        /// Fresh prompt assigned to the new tower.
        prompt: Prompt,
    },
    /// Upgrades an active tower after its prompt was answered.
    UpgradeTower {
        /// Cell holding the answered tower.
        cell: CellCoord,
        /// Fresh prompt assigned to the tower.
        prompt: Prompt,
    },
    /// Assigns a new prompt to a slot or tower, clearing any revealed answer.
    AssignPrompt {
        /// Cell receiving the prompt.
        cell: CellCoord,
        /// Prompt to assign.
        prompt: Prompt,
    },
    /// Marks the cell's prompt as expired and shows its correct answer.
    RevealAnswer {
        /// Cell whose prompt expired.
        cell: CellCoord,
    },
    /// Raises the number of unlocked tower columns.
    SetVisibleColumns {
        /// Requested number of visible columns.
        columns: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Simulation time after the tick.
        now: Duration,
    },
    /// Newly unlocked columns became visible.
    ColumnsRevealed {
        /// Number of columns visible before the change.
        previous: u32,
        /// Number of columns visible after the change.
        visible: u32,
    },
    /// Confirms that a slot now occupies the cell.
    SlotPlaced {
        /// Cell holding the slot.
        cell: CellCoord,
        /// Difficulty tier of the slot.
        tier: Tier,
    },
    /// Confirms that a slot was converted into an active tower.
    TowerActivated {
        /// Cell holding the tower.
        cell: CellCoord,
        /// Difficulty tier of the tower.
        tier: Tier,
    },
    /// Confirms that a tower gained an upgrade level.
    TowerUpgraded {
        /// Cell holding the tower.
        cell: CellCoord,
        /// Upgrade level after the upgrade.
        level: u32,
    },
    /// Reports that a correct answer reached a tower already at its maximum level.
    UpgradeCapped {
        /// Cell holding the tower.
        cell: CellCoord,
        /// Maximum level of the tower.
        level: u32,
    },
    /// Reports that an upgrade expired and the tower lost a level.
    TowerDowngraded {
        /// Cell holding the tower.
        cell: CellCoord,
        /// Upgrade level after the downgrade.
        level: u32,
    },
    /// Reports that a tower's last timer expired and the cell reverted to a slot.
    ///
    /// The slot awaits a fresh prompt through [`Command::AssignPrompt`].
    TowerReverted {
        /// Cell that reverted.
        cell: CellCoord,
        /// Difficulty tier of the slot.
        tier: Tier,
    },
    /// A tower finished its cooldown and fired a volley.
    TowerFired {
        /// Cell holding the tower.
        cell: CellCoord,
        /// Difficulty tier of the tower.
        tier: Tier,
        /// Firing behaviour of the tower.
        archetype: TowerArchetype,
        /// Stats at the moment of firing.
        stats: TowerStats,
    },
    /// Confirms that a new prompt was assigned to a cell.
    PromptAssigned {
        /// Cell receiving the prompt.
        cell: CellCoord,
    },
    /// The cell's prompt expired; its correct form is displayed until rotation.
    AnswerRevealed {
        /// Cell whose prompt expired.
        cell: CellCoord,
        /// Correct answer shown to the player.
        correct_form: String,
    },
    /// Reports that a command targeting a cell was rejected.
    CommandRejected {
        /// Cell targeted by the command.
        cell: CellCoord,
        /// Specific reason the command failed.
        reason: CellError,
    },
}

/// Kind of entity currently holding a cell's prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// A tower slot awaiting activation.
    Slot,
    /// An active tower awaiting its next upgrade.
    Tower,
}

/// Immutable representation of a pending prompt used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptSnapshot {
    /// Cell that displays the prompt.
    pub cell: CellCoord,
    /// Difficulty tier of the cell.
    pub tier: Tier,
    /// Entity currently occupying the cell.
    pub occupant: Occupant,
    /// The prompt itself.
    pub prompt: Prompt,
    /// Simulation time at which the prompt was assigned.
    pub set_at: Duration,
    /// Whether the cell is currently showing its correct answer.
    pub showing_answer: bool,
}

impl PromptSnapshot {
    /// Time elapsed since the prompt was assigned.
    #[must_use]
    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.set_at)
    }
}

/// Read-only snapshot of every pending prompt in the visible columns.
#[derive(Clone, Debug, Default)]
pub struct PromptView {
    now: Duration,
    snapshots: Vec<PromptSnapshot>,
}

impl PromptView {
    /// Creates a new prompt view from the provided snapshots.
    ///
    /// Snapshots are ordered by lane and then slot so iteration is deterministic.
    #[must_use]
    pub fn from_snapshots(now: Duration, mut snapshots: Vec<PromptSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.cell);
        Self { now, snapshots }
    }

    /// Simulation time at which the view was captured.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PromptSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the prompt displayed in `cell`, if any.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&PromptSnapshot> {
        self.snapshots
            .binary_search_by_key(&cell, |snapshot| snapshot.cell)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PromptSnapshot> {
        self.snapshots
    }
}

/// Reasons a cell-targeted command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellError {
    /// The coordinate lies outside the configured board.
    OutOfBounds,
    /// The cell lies in a column that has not been unlocked yet.
    HiddenColumn,
    /// The command requires a tower slot in the cell.
    ExpectedSlot,
    /// The command requires an active tower in the cell.
    ExpectedTower,
    /// The cell holds no prompt to act upon.
    MissingPrompt,
    /// The cell is already showing its answer.
    AlreadyRevealed,
}
