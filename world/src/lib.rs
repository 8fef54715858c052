#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Quiz Defence.
//!
//! The world owns a dense `lanes × slots` arena of [`Cell`] records. A cell is
//! empty while its column is hidden and afterwards holds exactly one tower
//! slot or one tower, never both.

pub mod towers;

use std::time::Duration;

use quiz_defence_core::{
    BoardLayout, CellCoord, CellError, Command, Event, GameConfig, Prompt, Tier, TowerTable,
};

pub use towers::{Downgrade, Expiry, TowerState};

/// Prompt displayed on a slot or tower together with its rotation bookkeeping.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingPrompt {
    prompt: Option<Prompt>,
    set_at: Duration,
    showing_answer: bool,
}

impl PendingPrompt {
    fn assigned(prompt: Prompt, now: Duration) -> Self {
        Self {
            prompt: Some(prompt),
            set_at: now,
            showing_answer: false,
        }
    }

    fn awaiting(now: Duration) -> Self {
        Self {
            prompt: None,
            set_at: now,
            showing_answer: false,
        }
    }

    pub(crate) fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    fn reveal(&mut self) -> Result<String, CellError> {
        let Some(prompt) = self.prompt.as_ref() else {
            return Err(CellError::MissingPrompt);
        };
        if self.showing_answer {
            return Err(CellError::AlreadyRevealed);
        }
        self.showing_answer = true;
        Ok(prompt.primary_answer().to_owned())
    }
}

/// Placeholder occupying a visible cell until its prompt is answered.
#[derive(Clone, Debug)]
pub struct SlotState {
    tier: Tier,
    prompt: PendingPrompt,
}

impl SlotState {
    /// Difficulty tier of the slot.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Prompt displayed on the slot.
    #[must_use]
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.prompt()
    }

    /// Whether the slot is currently showing its correct answer.
    #[must_use]
    pub const fn is_showing_answer(&self) -> bool {
        self.prompt.showing_answer
    }
}

/// Contents of a single lane/slot cell.
#[derive(Clone, Debug, Default)]
pub enum Cell {
    /// The cell's column has not been unlocked.
    #[default]
    Empty,
    /// A tower slot awaiting a correct answer.
    Slot(SlotState),
    /// An active tower.
    Tower(TowerState),
}

impl Cell {
    fn pending_prompt_mut(&mut self) -> Option<&mut PendingPrompt> {
        match self {
            Self::Empty => None,
            Self::Slot(slot) => Some(&mut slot.prompt),
            Self::Tower(tower) => Some(&mut tower.prompt),
        }
    }
}

/// Represents the authoritative Quiz Defence world state.
#[derive(Debug)]
pub struct World {
    layout: BoardLayout,
    towers: TowerTable,
    cells: Vec<Cell>,
    visible_columns: u32,
    now: Duration,
}

impl World {
    /// Creates a world with every column hidden and the clock at zero.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let layout = config.board.clone();
        let cells = vec![Cell::Empty; layout.cell_count()];
        Self {
            layout,
            towers: config.towers.clone(),
            cells,
            visible_columns: 0,
            now: Duration::ZERO,
        }
    }

    fn locate(&self, cell: CellCoord) -> Result<usize, CellError> {
        let index = self.layout.index(cell).ok_or(CellError::OutOfBounds)?;
        if cell.slot() >= self.visible_columns {
            return Err(CellError::HiddenColumn);
        }
        Ok(index)
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.now = self.now.saturating_add(dt);
        let now = self.now;
        out_events.push(Event::TimeAdvanced { dt, now });

        for cell in &mut self.cells {
            let Cell::Tower(tower) = cell else {
                continue;
            };
            match tower.check_expiry(now) {
                Expiry::Retained { downgrades: 0 } => {}
                Expiry::Retained { .. } => out_events.push(Event::TowerDowngraded {
                    cell: tower.cell(),
                    level: tower.upgrade_level(),
                }),
                Expiry::Remove => {
                    let coord = tower.cell();
                    let tier = tower.tier();
                    log::debug!(
                        "tower at lane {} slot {} expired",
                        coord.lane(),
                        coord.slot()
                    );
                    *cell = Cell::Slot(SlotState {
                        tier,
                        prompt: PendingPrompt::awaiting(now),
                    });
                    out_events.push(Event::TowerReverted { cell: coord, tier });
                }
            }
        }

        for cell in &mut self.cells {
            let Cell::Tower(tower) = cell else {
                continue;
            };
            if tower.advance_cooldown(dt) {
                out_events.push(Event::TowerFired {
                    cell: tower.cell(),
                    tier: tower.tier(),
                    archetype: tower.archetype(),
                    stats: tower.stats(),
                });
            }
        }
    }

    fn place_slot(
        &mut self,
        cell: CellCoord,
        tier: Tier,
        prompt: Prompt,
    ) -> Result<Event, CellError> {
        let index = self.locate(cell)?;
        self.cells[index] = Cell::Slot(SlotState {
            tier,
            prompt: PendingPrompt::assigned(prompt, self.now),
        });
        Ok(Event::SlotPlaced { cell, tier })
    }

    fn activate_tower(&mut self, cell: CellCoord, prompt: Prompt) -> Result<Event, CellError> {
        let index = self.locate(cell)?;
        let Cell::Slot(slot) = &self.cells[index] else {
            return Err(CellError::ExpectedSlot);
        };
        let tier = slot.tier;
        let mut tower = TowerState::new(cell, tier, self.towers.get(tier).clone());
        tower.activate(self.now);
        tower.prompt = PendingPrompt::assigned(prompt, self.now);
        self.cells[index] = Cell::Tower(tower);
        log::debug!(
            "{} tower activated at lane {} slot {}",
            tier.label(),
            cell.lane(),
            cell.slot()
        );
        Ok(Event::TowerActivated { cell, tier })
    }

    fn upgrade_tower(&mut self, cell: CellCoord, prompt: Prompt) -> Result<Event, CellError> {
        let index = self.locate(cell)?;
        let now = self.now;
        let Cell::Tower(tower) = &mut self.cells[index] else {
            return Err(CellError::ExpectedTower);
        };
        let upgraded = tower.apply_upgrade(now);
        tower.prompt = PendingPrompt::assigned(prompt, now);
        let level = tower.upgrade_level();
        if upgraded {
            Ok(Event::TowerUpgraded { cell, level })
        } else {
            Ok(Event::UpgradeCapped { cell, level })
        }
    }

    fn assign_prompt(&mut self, cell: CellCoord, prompt: Prompt) -> Result<Event, CellError> {
        let index = self.locate(cell)?;
        let now = self.now;
        let pending = self.cells[index]
            .pending_prompt_mut()
            .ok_or(CellError::ExpectedSlot)?;
        *pending = PendingPrompt::assigned(prompt, now);
        Ok(Event::PromptAssigned { cell })
    }

    fn reveal_answer(&mut self, cell: CellCoord) -> Result<Event, CellError> {
        let index = self.locate(cell)?;
        let pending = self.cells[index]
            .pending_prompt_mut()
            .ok_or(CellError::MissingPrompt)?;
        let correct_form = pending.reveal()?;
        Ok(Event::AnswerRevealed { cell, correct_form })
    }

    fn set_visible_columns(&mut self, columns: u32, out_events: &mut Vec<Event>) {
        let columns = columns.min(self.layout.slots_per_lane);
        if columns <= self.visible_columns {
            return;
        }
        let previous = self.visible_columns;
        self.visible_columns = columns;
        out_events.push(Event::ColumnsRevealed {
            previous,
            visible: columns,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let (cell, result) = match command {
        Command::Tick { dt } => {
            world.tick(dt, out_events);
            return;
        }
        Command::SetVisibleColumns { columns } => {
            world.set_visible_columns(columns, out_events);
            return;
        }
        Command::PlaceSlot { cell, tier, prompt } => (cell, world.place_slot(cell, tier, prompt)),
        Command::ActivateTower { cell, prompt } => (cell, world.activate_tower(cell, prompt)),
        Command::UpgradeTower { cell, prompt } => (cell, world.upgrade_tower(cell, prompt)),
        Command::AssignPrompt { cell, prompt } => (cell, world.assign_prompt(cell, prompt)),
        Command::RevealAnswer { cell } => (cell, world.reveal_answer(cell)),
    };

    match result {
        Ok(event) => out_events.push(event),
        Err(reason) => {
            log::debug!(
                "command rejected at lane {} slot {}: {reason:?}",
                cell.lane(),
                cell.slot()
            );
            out_events.push(Event::CommandRejected { cell, reason });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Cell, TowerState, World};
    use quiz_defence_core::{BoardLayout, CellCoord, Occupant, PromptSnapshot, PromptView, Tier};

    /// Current simulation time.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Number of unlocked tower columns.
    #[must_use]
    pub fn visible_columns(world: &World) -> u32 {
        world.visible_columns
    }

    /// Provides read-only access to the board layout.
    #[must_use]
    pub fn layout(world: &World) -> &BoardLayout {
        &world.layout
    }

    /// Provides read-only access to the contents of a cell.
    #[must_use]
    pub fn cell(world: &World, cell: CellCoord) -> Option<&Cell> {
        world
            .layout
            .index(cell)
            .and_then(|index| world.cells.get(index))
    }

    /// Provides read-only access to the tower occupying a cell, if any.
    #[must_use]
    pub fn tower(world: &World, cell: CellCoord) -> Option<&TowerState> {
        match self::cell(world, cell) {
            Some(Cell::Tower(tower)) => Some(tower),
            _ => None,
        }
    }

    /// Tier of the slot or tower occupying a cell.
    #[must_use]
    pub fn tier(world: &World, cell: CellCoord) -> Option<Tier> {
        match self::cell(world, cell)? {
            Cell::Empty => None,
            Cell::Slot(slot) => Some(slot.tier()),
            Cell::Tower(tower) => Some(tower.tier()),
        }
    }

    /// Iterates over every active tower in lane-then-slot order.
    pub fn towers(world: &World) -> impl Iterator<Item = &TowerState> {
        world.cells.iter().filter_map(|cell| match cell {
            Cell::Tower(tower) => Some(tower),
            _ => None,
        })
    }

    /// Iterates over every cell together with its coordinate.
    pub fn cells(world: &World) -> impl Iterator<Item = (CellCoord, &Cell)> {
        let layout = &world.layout;
        layout
            .cells_in_columns(layout.slots_per_lane)
            .zip(world.cells.iter())
    }

    /// Captures every pending prompt within the visible columns.
    #[must_use]
    pub fn prompt_view(world: &World) -> PromptView {
        let snapshots = cells(world)
            .filter(|(coord, _)| coord.slot() < world.visible_columns)
            .filter_map(|(coord, cell)| {
                let (tier, occupant, pending) = match cell {
                    Cell::Empty => return None,
                    Cell::Slot(slot) => (slot.tier, Occupant::Slot, &slot.prompt),
                    Cell::Tower(tower) => (tower.tier(), Occupant::Tower, &tower.prompt),
                };
                let prompt = pending.prompt.clone()?;
                Some(PromptSnapshot {
                    cell: coord,
                    tier,
                    occupant,
                    prompt,
                    set_at: pending.set_at,
                    showing_answer: pending.showing_answer,
                })
            })
            .collect();
        PromptView::from_snapshots(world.now, snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(answer: &str) -> Prompt {
        Prompt::with_answer(format!("? = {answer}"), answer)
    }

    fn world_with_columns(columns: u32) -> World {
        let mut world = World::new(&GameConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::SetVisibleColumns { columns }, &mut events);
        world
    }

    #[test]
    fn hidden_columns_reject_slots() {
        let mut world = world_with_columns(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceSlot {
                cell: CellCoord::new(0, 1),
                tier: Tier::Easy,
                prompt: prompt("2"),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                cell: CellCoord::new(0, 1),
                reason: CellError::HiddenColumn,
            }]
        );
    }

    #[test]
    fn out_of_bounds_cells_are_rejected() {
        let mut world = world_with_columns(5);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RevealAnswer {
                cell: CellCoord::new(9, 0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                cell: CellCoord::new(9, 0),
                reason: CellError::OutOfBounds,
            }]
        );
    }

    #[test]
    fn visible_columns_never_shrink() {
        let mut world = world_with_columns(3);
        let mut events = Vec::new();
        apply(&mut world, Command::SetVisibleColumns { columns: 2 }, &mut events);
        apply(&mut world, Command::SetVisibleColumns { columns: 40 }, &mut events);

        assert_eq!(query::visible_columns(&world), 5);
        assert_eq!(
            events,
            vec![Event::ColumnsRevealed {
                previous: 3,
                visible: 5,
            }]
        );
    }

    #[test]
    fn upgrading_a_slot_is_rejected() {
        let mut world = world_with_columns(1);
        let cell = CellCoord::new(2, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceSlot {
                cell,
                tier: Tier::Hard,
                prompt: prompt("7"),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::UpgradeTower {
                cell,
                prompt: prompt("8"),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                cell,
                reason: CellError::ExpectedTower,
            }]
        );
    }

    #[test]
    fn reveal_marks_prompt_once() {
        let mut world = world_with_columns(1);
        let cell = CellCoord::new(0, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceSlot {
                cell,
                tier: Tier::Easy,
                prompt: prompt("4"),
            },
            &mut events,
        );
        events.clear();

        apply(&mut world, Command::RevealAnswer { cell }, &mut events);
        apply(&mut world, Command::RevealAnswer { cell }, &mut events);
        assert_eq!(
            events,
            vec![
                Event::AnswerRevealed {
                    cell,
                    correct_form: "4".to_owned(),
                },
                Event::CommandRejected {
                    cell,
                    reason: CellError::AlreadyRevealed,
                },
            ]
        );
        let view = query::prompt_view(&world);
        assert!(view.get(cell).map_or(false, |snapshot| snapshot.showing_answer));
    }
}
