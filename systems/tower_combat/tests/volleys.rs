use std::time::Duration;

use quiz_defence_core::{CellCoord, Command, GameConfig, Prompt, Tier};
use quiz_defence_system_tower_combat::{TowerCombat, Volley};
use quiz_defence_world::{self as world, World};

#[test]
fn upgraded_sniper_fires_faster_harder_shots() {
    let mut world = World::new(&GameConfig::default());
    let cell = CellCoord::new(3, 1);
    let prompt = || Prompt::with_answer("3 x 3", "9");
    let mut events = Vec::new();
    for command in [
        Command::SetVisibleColumns { columns: 2 },
        Command::PlaceSlot {
            cell,
            tier: Tier::Hard,
            prompt: prompt(),
        },
        Command::ActivateTower {
            cell,
            prompt: prompt(),
        },
        Command::UpgradeTower {
            cell,
            prompt: prompt(),
        },
    ] {
        world::apply(&mut world, command, &mut events);
    }

    let mut volleys = Vec::new();
    let mut combat = TowerCombat::new();
    for _ in 0..4 {
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1_000),
            },
            &mut events,
        );
        combat.handle(&events, &mut volleys);
    }

    // Fires on the first tick, then once the 3000 ms cooldown elapses.
    assert_eq!(volleys.len(), 2);
    let Volley {
        cell: fired_from,
        tier,
        projectiles,
    } = &volleys[0];
    assert_eq!(*fired_from, cell);
    assert_eq!(*tier, Tier::Hard);
    assert_eq!(projectiles.len(), 1);
    assert_eq!(projectiles[0].damage, 4);
    assert!((projectiles[0].velocity.x - 750.0).abs() < 1e-3);
}
