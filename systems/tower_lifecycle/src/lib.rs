#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Slot and tower lifecycle driven by submitted answers and prompt ageing.
//!
//! [`TowerLifecycle`] turns a submitted answer into activation and upgrade
//! commands and refills prompts on slots that reverted from towers.
//! [`PromptRotation`] reveals the answer of the oldest stale prompt so the
//! coordinator can replace it shortly afterwards.

use std::time::Duration;

use quiz_defence_core::{
    CellCoord, Command, Event, Occupant, PromptProvider, PromptTuning, PromptView,
};

/// Aggregated result of validating one answer against every visible prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Whether at least one cell accepted the answer.
    pub any_correct: bool,
    /// Sum of the bonus points awarded by every accepting cell.
    pub bonus_points: u32,
    /// Number of cells that accepted the answer.
    pub matches: u32,
}

/// Pure system converting answers and reverted towers into world commands.
#[derive(Debug, Default)]
pub struct TowerLifecycle;

impl TowerLifecycle {
    /// Creates the lifecycle system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates `answer` against every pending prompt in the view.
    ///
    /// Slots that accept the answer become towers; towers that accept it are
    /// upgraded. A single answer may match several cells and each match is
    /// processed independently. Cells currently showing their answer are
    /// skipped.
    pub fn on_answer_submitted<P>(
        &mut self,
        answer: &str,
        prompts: &PromptView,
        provider: &mut P,
        out: &mut Vec<Command>,
    ) -> AnswerOutcome
    where
        P: PromptProvider + ?Sized,
    {
        let mut outcome = AnswerOutcome::default();
        if answer.trim().is_empty() {
            return outcome;
        }

        for snapshot in prompts.iter().filter(|snapshot| !snapshot.showing_answer) {
            let validation = provider.validate(&snapshot.prompt, answer);
            if !validation.is_correct {
                continue;
            }

            outcome.any_correct = true;
            outcome.matches += 1;
            outcome.bonus_points = outcome.bonus_points.saturating_add(validation.bonus_points);

            let cell = snapshot.cell;
            let prompt = provider.generate(snapshot.tier);
            let command = match snapshot.occupant {
                Occupant::Slot => Command::ActivateTower { cell, prompt },
                Occupant::Tower => Command::UpgradeTower { cell, prompt },
            };
            log::debug!(
                "answer accepted at lane {} slot {} ({:?})",
                cell.lane(),
                cell.slot(),
                snapshot.occupant
            );
            out.push(command);
        }

        outcome
    }

    /// Assigns fresh prompts to slots whose tower just expired.
    pub fn on_events<P>(&mut self, events: &[Event], provider: &mut P, out: &mut Vec<Command>)
    where
        P: PromptProvider + ?Sized,
    {
        for event in events {
            if let Event::TowerReverted { cell, tier } = event {
                out.push(Command::AssignPrompt {
                    cell: *cell,
                    prompt: provider.generate(*tier),
                });
            }
        }
    }
}

/// Rate-limited reveal of prompts that went unanswered for too long.
#[derive(Debug)]
pub struct PromptRotation {
    lifetime: Duration,
    cooldown: Duration,
    last_rotation: Option<Duration>,
}

impl PromptRotation {
    /// Creates the rotation policy from prompt tuning.
    #[must_use]
    pub const fn new(tuning: &PromptTuning) -> Self {
        Self {
            lifetime: tuning.lifetime(),
            cooldown: tuning.rotation_cooldown(),
            last_rotation: None,
        }
    }

    /// Reveals the answer of the oldest expired prompt, if the cooldown allows.
    ///
    /// At most one cell is rotated per call and per cooldown window.
    pub fn handle(
        &mut self,
        now: Duration,
        prompts: &PromptView,
        out: &mut Vec<Command>,
    ) -> Option<CellCoord> {
        if let Some(last) = self.last_rotation {
            if now.saturating_sub(last) < self.cooldown {
                return None;
            }
        }

        let oldest = prompts
            .iter()
            .filter(|snapshot| !snapshot.showing_answer && snapshot.age(now) > self.lifetime)
            .min_by_key(|snapshot| (snapshot.set_at, snapshot.cell))?;

        let cell = oldest.cell;
        self.last_rotation = Some(now);
        out.push(Command::RevealAnswer { cell });
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{Prompt, PromptSnapshot, Tier};

    fn snapshot(lane: u32, set_at_ms: u64, showing_answer: bool) -> PromptSnapshot {
        PromptSnapshot {
            cell: CellCoord::new(lane, 0),
            tier: Tier::Easy,
            occupant: Occupant::Slot,
            prompt: Prompt::with_answer("1 + 1", "2"),
            set_at: Duration::from_millis(set_at_ms),
            showing_answer,
        }
    }

    #[test]
    fn rotation_picks_oldest_stale_prompt() {
        let mut rotation = PromptRotation::new(&PromptTuning::default());
        let now = Duration::from_millis(30_000);
        let view = PromptView::from_snapshots(
            now,
            vec![snapshot(0, 8_000, false), snapshot(1, 2_000, true), snapshot(2, 5_000, false)],
        );
        let mut out = Vec::new();

        assert_eq!(rotation.handle(now, &view, &mut out), Some(CellCoord::new(2, 0)));
        assert_eq!(
            out,
            vec![Command::RevealAnswer {
                cell: CellCoord::new(2, 0)
            }]
        );
    }

    #[test]
    fn rotation_respects_cooldown() {
        let mut rotation = PromptRotation::new(&PromptTuning::default());
        let view = |now| {
            PromptView::from_snapshots(now, vec![snapshot(0, 0, false), snapshot(1, 0, false)])
        };
        let mut out = Vec::new();

        let first = Duration::from_millis(20_001);
        assert!(rotation.handle(first, &view(first), &mut out).is_some());
        let early = Duration::from_millis(22_000);
        assert!(rotation.handle(early, &view(early), &mut out).is_none());
        let later = Duration::from_millis(23_001);
        assert!(rotation.handle(later, &view(later), &mut out).is_some());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn fresh_prompts_are_not_rotated() {
        let mut rotation = PromptRotation::new(&PromptTuning::default());
        let now = Duration::from_millis(20_000);
        let view = PromptView::from_snapshots(now, vec![snapshot(0, 0, false)]);
        let mut out = Vec::new();
        assert!(rotation.handle(now, &view, &mut out).is_none());
        assert!(out.is_empty());
    }
}
