//! Scripted player that answers visible prompts on a fixed cadence.

use std::time::Duration;

use quiz_defence_core::PromptView;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Answer typed when the player gets a prompt wrong.
const WRONG_ANSWER: &str = "?";

/// Simulated typist driving the headless session.
#[derive(Debug)]
pub(crate) struct ScriptedPlayer {
    rng: ChaCha8Rng,
    accuracy: f64,
    interval: Duration,
    since_answer: Duration,
}

impl ScriptedPlayer {
    pub(crate) fn new(seed: u64, accuracy: f64, interval: Duration) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            accuracy: if accuracy.is_finite() {
                accuracy.clamp(0.0, 1.0)
            } else {
                0.0
            },
            interval,
            since_answer: Duration::ZERO,
        }
    }

    /// Returns an answer once per interval, picking one unrevealed prompt at random.
    pub(crate) fn next_answer(&mut self, dt: Duration, view: &PromptView) -> Option<String> {
        self.since_answer += dt;
        if self.since_answer < self.interval {
            return None;
        }

        let candidates: Vec<_> = view
            .iter()
            .filter(|snapshot| !snapshot.showing_answer)
            .collect();
        let target = candidates.choose(&mut self.rng)?;
        self.since_answer = Duration::ZERO;

        if self.rng.gen_bool(self.accuracy) {
            Some(target.prompt.primary_answer().to_owned())
        } else {
            Some(WRONG_ANSWER.to_owned())
        }
    }
}
