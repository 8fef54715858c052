#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Progressive unlocking of tower columns as waves advance.

use quiz_defence_core::{BoardLayout, ColumnTuning, Command, PromptProvider};

/// Number of columns visible during the given one-based wave.
///
/// Grows by one every `waves_per_column` waves and never exceeds either the
/// configured maximum or the physical slot count.
#[must_use]
pub fn visible_columns(tuning: &ColumnTuning, slots_per_lane: u32, wave: u32) -> u32 {
    let waves_per_column = tuning.waves_per_column.max(1);
    let unlocked = 1 + wave.saturating_sub(1) / waves_per_column;
    unlocked.min(tuning.max_columns).min(slots_per_lane)
}

/// Pure system that reveals columns and resets the board at wave boundaries.
#[derive(Debug)]
pub struct ColumnProgression {
    tuning: ColumnTuning,
    revealed: u32,
}

impl ColumnProgression {
    /// Creates the system with every column still hidden.
    #[must_use]
    pub fn new(tuning: &ColumnTuning) -> Self {
        Self {
            tuning: *tuning,
            revealed: 0,
        }
    }

    /// Number of columns revealed so far.
    #[must_use]
    pub const fn revealed(&self) -> u32 {
        self.revealed
    }

    /// Emits the commands that prepare the board for `wave`.
    ///
    /// Newly unlocked columns are revealed once, then every visible cell is
    /// replaced by a fresh slot carrying a new prompt. Calling this for wave
    /// one builds the initial board.
    pub fn on_wave_changed<P>(
        &mut self,
        wave: u32,
        layout: &BoardLayout,
        provider: &mut P,
        out: &mut Vec<Command>,
    ) where
        P: PromptProvider + ?Sized,
    {
        let columns = visible_columns(&self.tuning, layout.slots_per_lane, wave.max(1));
        if columns > self.revealed {
            log::info!("wave {wave} unlocks column {columns}");
            self.revealed = columns;
            out.push(Command::SetVisibleColumns { columns });
        }

        for cell in layout.cells_in_columns(self.revealed) {
            let tier = layout.tier_for(cell);
            let prompt = provider.generate(tier);
            out.push(Command::PlaceSlot { cell, tier, prompt });
        }
    }
}
