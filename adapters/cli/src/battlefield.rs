//! Headless lane battlefield standing in for the rendering and physics layer.

use std::time::Duration;

use glam::Vec2;
use quiz_defence_core::{MonsterTuning, Tier};
use quiz_defence_session::{Battlefield, MonsterId, MonsterKill};
use quiz_defence_system_tower_combat::{ClusterBurst, Volley};

/// X coordinate at which monsters enter a lane.
const SPAWN_X: f32 = 1_220.0;
/// X coordinate of the first tower column.
const FIRST_COLUMN_X: f32 = 80.0;
/// Horizontal distance between tower columns.
const COLUMN_SPACING: f32 = 100.0;
/// Projectiles drifting further than this from the lane centre leave the lane.
const LANE_HALF_HEIGHT: f32 = 40.0;
/// Distance within which a projectile strikes a monster.
const HIT_RADIUS: f32 = 20.0;
/// Radius covered by cluster fragments around the impact point.
const BURST_RADIUS: f32 = 60.0;

#[derive(Clone, Debug)]
struct Monster {
    id: MonsterId,
    lane: u32,
    tier: Tier,
    x: f32,
    health: u32,
}

#[derive(Clone, Debug)]
struct Projectile {
    lane: u32,
    position: Vec2,
    velocity: Vec2,
    damage: u32,
    range: f32,
    travelled: f32,
    cluster: Option<ClusterBurst>,
}

/// Straight lanes in which monsters walk towards `x = 0`.
#[derive(Debug)]
pub(crate) struct LaneBattlefield {
    tuning: MonsterTuning,
    next_id: u64,
    monsters: Vec<Monster>,
    projectiles: Vec<Projectile>,
    frozen: bool,
}

impl LaneBattlefield {
    pub(crate) fn new(tuning: MonsterTuning) -> Self {
        Self {
            tuning,
            next_id: 0,
            monsters: Vec::new(),
            projectiles: Vec::new(),
            frozen: false,
        }
    }

    /// Number of projectiles in flight.
    pub(crate) fn projectiles_in_flight(&self) -> usize {
        self.projectiles.len()
    }

    fn resolve_hit(&mut self, projectile: &Projectile, target: usize) {
        let impact_x = self.monsters[target].x;
        let monster = &mut self.monsters[target];
        monster.health = monster.health.saturating_sub(projectile.damage);

        let Some(burst) = projectile.cluster else {
            return;
        };
        let mut nearby: Vec<usize> = self
            .monsters
            .iter()
            .enumerate()
            .filter(|(_, monster)| {
                monster.lane == projectile.lane && (monster.x - impact_x).abs() <= BURST_RADIUS
            })
            .map(|(index, _)| index)
            .collect();
        nearby.sort_by(|a, b| {
            let da = (self.monsters[*a].x - impact_x).abs();
            let db = (self.monsters[*b].x - impact_x).abs();
            da.total_cmp(&db)
        });
        for index in nearby.iter().cycle().take(burst.fragments as usize) {
            let monster = &mut self.monsters[*index];
            monster.health = monster.health.saturating_sub(burst.fragment_damage);
        }
    }
}

impl Battlefield for LaneBattlefield {
    fn spawn_monster(&mut self, lane: u32, tier: Tier) -> MonsterId {
        let id = MonsterId::new(self.next_id);
        self.next_id += 1;
        self.monsters.push(Monster {
            id,
            lane,
            tier,
            x: SPAWN_X,
            health: self.tuning.stats(tier).health,
        });
        id
    }

    fn spawn_volley(&mut self, volley: &Volley) {
        let origin = Vec2::new(
            FIRST_COLUMN_X + COLUMN_SPACING * volley.cell.slot() as f32,
            0.0,
        );
        self.projectiles
            .extend(volley.projectiles.iter().map(|launch| Projectile {
                lane: volley.cell.lane(),
                position: origin,
                velocity: launch.velocity,
                damage: launch.damage,
                range: launch.range,
                travelled: 0.0,
                cluster: launch.cluster,
            }));
    }

    fn advance(&mut self, dt: Duration) -> Vec<MonsterKill> {
        if self.frozen {
            return Vec::new();
        }
        let seconds = dt.as_secs_f32();

        for monster in &mut self.monsters {
            monster.x -= self.tuning.speed * seconds;
        }

        let mut flying = Vec::with_capacity(self.projectiles.len());
        for mut projectile in std::mem::take(&mut self.projectiles) {
            let step = projectile.velocity * seconds;
            projectile.position += step;
            projectile.travelled += step.length();

            let target = self.monsters.iter().position(|monster| {
                monster.health > 0
                    && monster.lane == projectile.lane
                    && projectile.position.y.abs() <= LANE_HALF_HEIGHT
                    && (monster.x - projectile.position.x).abs() <= HIT_RADIUS
            });
            if let Some(target) = target {
                self.resolve_hit(&projectile, target);
                continue;
            }
            if projectile.travelled <= projectile.range
                && projectile.position.y.abs() <= LANE_HALF_HEIGHT
            {
                flying.push(projectile);
            }
        }
        self.projectiles = flying;

        let mut kills = Vec::new();
        self.monsters.retain(|monster| {
            if monster.health > 0 {
                return true;
            }
            kills.push(MonsterKill {
                id: monster.id,
                tier: monster.tier,
            });
            false
        });
        kills
    }

    fn escaped_monsters(&self) -> Vec<MonsterId> {
        self.monsters
            .iter()
            .filter(|monster| monster.x < 0.0)
            .map(|monster| monster.id)
            .collect()
    }

    fn remove_monster(&mut self, id: MonsterId) {
        self.monsters.retain(|monster| monster.id != id);
    }

    fn alive_monsters(&self) -> usize {
        self.monsters.len()
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }
}
