#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tower firing events into projectile volleys.

use glam::Vec2;
use quiz_defence_core::{CellCoord, Event, Tier, TowerArchetype, TowerStats};

/// Fragments released when a cluster projectile bursts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterBurst {
    /// Number of fragments released on impact.
    pub fragments: u32,
    /// Damage dealt by each fragment.
    pub fragment_damage: u32,
}

/// Single projectile launched by a tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Launch velocity in field units per second; positive x points up the lane.
    pub velocity: Vec2,
    /// Damage dealt on direct impact.
    pub damage: u32,
    /// Distance the projectile travels before it is discarded.
    pub range: f32,
    /// Burst released on impact, if any.
    pub cluster: Option<ClusterBurst>,
}

/// Every projectile fired by one tower in one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Volley {
    /// Cell of the firing tower.
    pub cell: CellCoord,
    /// Tier of the firing tower.
    pub tier: Tier,
    /// Projectiles launched by the tower.
    pub projectiles: Vec<ProjectileSpec>,
}

type FirePattern = fn(&TowerStats) -> Vec<ProjectileSpec>;

const FIRE_PATTERNS: [FirePattern; 4] = [single_shot, spread_shot, single_shot, cluster_shot];

/// Computes the projectiles fired by a tower of the given archetype.
#[must_use]
pub fn compute_fire_pattern(archetype: TowerArchetype, stats: &TowerStats) -> Vec<ProjectileSpec> {
    FIRE_PATTERNS[archetype.index()](stats)
}

fn straight(stats: &TowerStats, angle_deg: f32) -> ProjectileSpec {
    ProjectileSpec {
        velocity: Vec2::from_angle(angle_deg.to_radians()) * stats.projectile_speed,
        damage: stats.damage,
        range: stats.range,
        cluster: None,
    }
}

fn single_shot(stats: &TowerStats) -> Vec<ProjectileSpec> {
    vec![straight(stats, 0.0)]
}

fn spread_shot(stats: &TowerStats) -> Vec<ProjectileSpec> {
    let count = stats.projectile_count.max(1);
    if count == 1 {
        return single_shot(stats);
    }
    let half = stats.spread_angle_deg / 2.0;
    let step = stats.spread_angle_deg / (count - 1) as f32;
    (0..count)
        .map(|index| straight(stats, -half + step * index as f32))
        .collect()
}

fn cluster_shot(stats: &TowerStats) -> Vec<ProjectileSpec> {
    let mut projectile = straight(stats, 0.0);
    projectile.damage = 0;
    projectile.cluster = Some(ClusterBurst {
        fragments: stats.cluster_count,
        fragment_damage: stats.damage,
    });
    vec![projectile]
}

/// Tower combat system that converts `TowerFired` events into volleys.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Volley>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one volley per `TowerFired` event in `events`.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Volley>) {
        self.scratch.clear();

        for event in events {
            if let Event::TowerFired {
                cell,
                tier,
                archetype,
                stats,
            } = event
            {
                self.scratch.push(Volley {
                    cell: *cell,
                    tier: *tier,
                    projectiles: compute_fire_pattern(*archetype, stats),
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::TowerTable;

    fn angle_deg(projectile: &ProjectileSpec) -> f32 {
        projectile.velocity.y.atan2(projectile.velocity.x).to_degrees()
    }

    #[test]
    fn standard_fires_one_straight_shot() {
        let stats = TowerTable::default().easy.base_stats;
        let volley = compute_fire_pattern(TowerArchetype::Standard, &stats);
        assert_eq!(volley.len(), 1);
        assert!((volley[0].velocity - Vec2::new(300.0, 0.0)).length() < 1e-3);
        assert_eq!(volley[0].damage, 1);
    }

    #[test]
    fn spread_covers_angle_symmetrically() {
        let stats = TowerTable::default().medium.base_stats;
        let volley = compute_fire_pattern(TowerArchetype::Spread, &stats);
        let angles: Vec<f32> = volley.iter().map(angle_deg).collect();
        assert_eq!(angles.len(), 3);
        assert!((angles[0] + 16.25).abs() < 1e-3);
        assert!(angles[1].abs() < 1e-3);
        assert!((angles[2] - 16.25).abs() < 1e-3);
    }

    #[test]
    fn cluster_carries_fragments_without_direct_damage() {
        let stats = TowerTable::default().cluster.base_stats;
        let volley = compute_fire_pattern(TowerArchetype::Cluster, &stats);
        assert_eq!(volley.len(), 1);
        assert_eq!(volley[0].damage, 0);
        assert_eq!(
            volley[0].cluster,
            Some(ClusterBurst {
                fragments: 4,
                fragment_damage: 1,
            })
        );
    }

    #[test]
    fn non_fire_events_are_ignored() {
        let mut system = TowerCombat::new();
        let mut out = Vec::new();
        system.handle(
            &[Event::PromptAssigned {
                cell: CellCoord::new(0, 0),
            }],
            &mut out,
        );
        assert!(out.is_empty());
    }
}
