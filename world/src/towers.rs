//! Authoritative tower state and the time-bounded upgrade model.
//!
//! Every activation or upgrade pushes an expiry timestamp onto a FIFO queue.
//! Each expired timestamp costs the tower exactly one level; once the queue
//! drains completely the tower must be converted back into a slot.

use std::{collections::VecDeque, time::Duration};

use quiz_defence_core::{CellCoord, Prompt, Tier, TowerArchetype, TowerProfile, TowerStats};

use crate::PendingPrompt;

/// Result of removing one upgrade level from a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Downgrade {
    /// The tower lost a level and keeps operating.
    Downgraded {
        /// Level after the downgrade.
        level: u32,
    },
    /// The tower was already at its base level and must be removed.
    Remove,
}

/// Result of draining expired upgrade timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// The tower survives; `downgrades` levels were lost in this call.
    Retained {
        /// Number of downgrades applied.
        downgrades: u32,
    },
    /// The last timer expired and the tower must be replaced by a slot.
    Remove,
}

/// Active defence unit occupying a single grid cell.
#[derive(Clone, Debug)]
pub struct TowerState {
    cell: CellCoord,
    tier: Tier,
    profile: TowerProfile,
    stats: TowerStats,
    upgrade_level: u32,
    timers: VecDeque<Duration>,
    cooldown: Duration,
    active: bool,
    pub(crate) prompt: PendingPrompt,
}

impl TowerState {
    /// Creates an inactive tower at base stats for the given tier profile.
    #[must_use]
    pub fn new(cell: CellCoord, tier: Tier, profile: TowerProfile) -> Self {
        let stats = profile.base_stats;
        Self {
            cell,
            tier,
            profile,
            stats,
            upgrade_level: 0,
            timers: VecDeque::new(),
            cooldown: Duration::ZERO,
            active: false,
            prompt: PendingPrompt::default(),
        }
    }

    /// Activates the tower and starts its first expiry timer.
    ///
    /// Every call pushes another timer; the world calls this exactly once per
    /// slot-to-tower transition.
    pub fn activate(&mut self, now: Duration) {
        self.active = true;
        self.cooldown = Duration::ZERO;
        self.timers
            .push_back(now.saturating_add(self.profile.upgrade_duration()));
    }

    /// Applies the next upgrade step, returning `false` when already at the maximum level.
    pub fn apply_upgrade(&mut self, now: Duration) -> bool {
        let Some(step) = self.profile.step(self.upgrade_level) else {
            return false;
        };
        self.stats = self.stats.merged(step);
        self.upgrade_level += 1;
        self.timers
            .push_back(now.saturating_add(self.profile.upgrade_duration()));
        true
    }

    /// Removes one upgrade level, recomputing stats from the base profile.
    pub fn apply_downgrade(&mut self) -> Downgrade {
        if self.upgrade_level == 0 {
            return Downgrade::Remove;
        }
        self.upgrade_level -= 1;
        self.stats = self.profile.stats_at_level(self.upgrade_level);
        Downgrade::Downgraded {
            level: self.upgrade_level,
        }
    }

    /// Pops every timer that expired at or before `now`, downgrading once per timer.
    pub fn check_expiry(&mut self, now: Duration) -> Expiry {
        let mut downgrades = 0;
        while self.timers.front().is_some_and(|expiry| *expiry <= now) {
            let _ = self.timers.pop_front();
            match self.apply_downgrade() {
                Downgrade::Downgraded { .. } => downgrades += 1,
                Downgrade::Remove => return Expiry::Remove,
            }
        }
        Expiry::Retained { downgrades }
    }

    /// Counts down the cooldown, reporting whether the tower fires this tick.
    ///
    /// Firing resets the cooldown to the current fire period.
    pub fn advance_cooldown(&mut self, dt: Duration) -> bool {
        if !self.active {
            return false;
        }
        self.cooldown = self.cooldown.saturating_sub(dt);
        if !self.cooldown.is_zero() {
            return false;
        }
        self.cooldown = self.stats.fire_period();
        true
    }

    /// Cell occupied by the tower.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Difficulty tier of the tower.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Firing behaviour of the tower.
    #[must_use]
    pub const fn archetype(&self) -> TowerArchetype {
        self.profile.archetype
    }

    /// Current stats of the tower.
    #[must_use]
    pub const fn stats(&self) -> TowerStats {
        self.stats
    }

    /// Current upgrade level; zero right after activation.
    #[must_use]
    pub const fn upgrade_level(&self) -> u32 {
        self.upgrade_level
    }

    /// Highest level the tower can reach.
    #[must_use]
    pub fn max_upgrade_level(&self) -> u32 {
        self.profile.max_upgrade_level()
    }

    /// Pending expiry timestamps, oldest first.
    pub fn timers(&self) -> impl Iterator<Item = Duration> + '_ {
        self.timers.iter().copied()
    }

    /// Number of pending expiry timestamps.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Time remaining until the next shot.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether the tower has been activated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Prompt currently displayed on the tower.
    #[must_use]
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.prompt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::TowerTable;

    fn easy_tower() -> TowerState {
        TowerState::new(CellCoord::new(0, 0), Tier::Easy, TowerTable::default().easy)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn activation_pushes_one_timer_and_clears_cooldown() {
        let mut tower = easy_tower();
        tower.activate(ms(1_000));

        assert!(tower.is_active());
        assert_eq!(tower.cooldown(), Duration::ZERO);
        assert_eq!(tower.timers().collect::<Vec<_>>(), vec![ms(61_000)]);
        assert_eq!(tower.upgrade_level(), 0);
    }

    #[test]
    fn upgrade_merges_step_and_pushes_timer() {
        let mut tower = easy_tower();
        tower.activate(Duration::ZERO);

        assert!(tower.apply_upgrade(ms(5_000)));
        assert_eq!(tower.upgrade_level(), 1);
        assert_eq!(tower.stats().fire_period_ms, 1_000);
        assert_eq!(tower.timer_count(), 2);
        assert_eq!(tower.timer_count(), tower.upgrade_level() as usize + 1);
    }

    #[test]
    fn downgrade_at_base_level_requests_removal() {
        let mut tower = easy_tower();
        tower.activate(Duration::ZERO);
        assert_eq!(tower.apply_downgrade(), Downgrade::Remove);
    }

    #[test]
    fn downgrade_recomputes_from_base() {
        let mut tower = TowerState::new(
            CellCoord::new(1, 1),
            Tier::Hard,
            TowerTable::default().hard,
        );
        tower.activate(Duration::ZERO);
        assert!(tower.apply_upgrade(Duration::ZERO));
        assert!(tower.apply_upgrade(Duration::ZERO));
        assert_eq!(tower.stats().damage, 5);

        assert_eq!(tower.apply_downgrade(), Downgrade::Downgraded { level: 1 });
        assert_eq!(tower.stats().damage, 4);
        assert!((tower.stats().projectile_speed - 750.0).abs() < f32::EPSILON);
    }

    #[test]
    fn simultaneous_expiries_downgrade_sequentially() {
        let mut tower = easy_tower();
        tower.activate(Duration::ZERO);
        assert!(tower.apply_upgrade(ms(10)));
        assert!(tower.apply_upgrade(ms(20)));

        // The activation timer and the first upgrade timer expire together.
        assert_eq!(
            tower.check_expiry(ms(60_010)),
            Expiry::Retained { downgrades: 2 }
        );
        assert_eq!(tower.upgrade_level(), 0);
        assert_eq!(tower.timer_count(), 1);
        assert_eq!(tower.stats(), TowerTable::default().easy.base_stats);
    }

    #[test]
    fn draining_last_timer_requests_removal() {
        let mut tower = easy_tower();
        tower.activate(Duration::ZERO);
        assert_eq!(
            tower.check_expiry(ms(59_999)),
            Expiry::Retained { downgrades: 0 }
        );
        assert_eq!(tower.check_expiry(ms(60_000)), Expiry::Remove);
    }

    #[test]
    fn cooldown_fires_immediately_after_activation() {
        let mut tower = easy_tower();
        assert!(!tower.advance_cooldown(ms(16)), "inactive towers never fire");

        tower.activate(Duration::ZERO);
        assert!(tower.advance_cooldown(ms(16)));
        assert_eq!(tower.cooldown(), ms(2_000));
        assert!(!tower.advance_cooldown(ms(1_999)));
        assert!(tower.advance_cooldown(ms(1)));
    }
}
