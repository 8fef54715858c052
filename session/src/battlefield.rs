//! Contract with the collaborator that moves monsters and resolves collisions.

use std::time::Duration;

use quiz_defence_core::Tier;
use quiz_defence_system_tower_combat::Volley;

/// Identifier of a monster on the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(u64);

impl MonsterId {
    /// Creates a new identifier with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Monster destroyed by projectiles during a battlefield step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterKill {
    /// Monster that died.
    pub id: MonsterId,
    /// Tier of the monster, which determines the points awarded.
    pub tier: Tier,
}

/// Physics and rendering collaborator driven by the session.
///
/// Implementations own monster positions, health and projectiles. The
/// session only asks them to spawn, step and report outcomes.
pub trait Battlefield {
    /// Places a new monster at the far end of `lane`.
    fn spawn_monster(&mut self, lane: u32, tier: Tier) -> MonsterId;

    /// Launches every projectile of a tower's volley.
    fn spawn_volley(&mut self, volley: &Volley);

    /// Moves monsters and projectiles, returning monsters killed in this step.
    fn advance(&mut self, dt: Duration) -> Vec<MonsterKill>;

    /// Monsters that crossed the base line (`x < 0`) and are still on the field.
    fn escaped_monsters(&self) -> Vec<MonsterId>;

    /// Removes a monster without awarding points.
    fn remove_monster(&mut self, id: MonsterId);

    /// Number of monsters still on the field.
    fn alive_monsters(&self) -> usize;

    /// Stops all motion once the game is over.
    fn freeze(&mut self);
}
