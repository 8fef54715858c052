#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concrete prompt providers for Quiz Defence.
//!
//! Generators implement [`PromptGenerator`] and may fail; wrapping one in
//! [`Resilient`] yields an infallible [`PromptProvider`] that degrades to a
//! simple addition prompt whenever generation fails.

pub mod accents;
mod arithmetic;
mod verbs;

use quiz_defence_core::{Prompt, PromptProvider, Tier, Validation};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

pub use arithmetic::{ArithmeticGenerator, LevelSpec, Operation, ParseYearLevelError, YearLevel};
pub use verbs::{conjugate, Person, Tense, VerbGenerator, VERBS};

/// Reasons a generator could not produce a prompt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// The year level has no arithmetic operations configured.
    #[error("year level {0} has no operations")]
    NoOperations(&'static str),
    /// The generator has nothing to draw prompts from.
    #[error("prompt source is empty")]
    EmptySource,
}

/// Fallible source of prompts together with the matching validation rules.
pub trait PromptGenerator {
    /// Attempts to generate a prompt for the requested tier.
    fn try_generate(&mut self, tier: Tier) -> Result<Prompt, PromptError>;

    /// Checks `input` against the prompt's accepted answers.
    fn validate(&self, prompt: &Prompt, input: &str) -> Validation;
}

/// Wraps a generator so that generation failures degrade to a fallback prompt.
#[derive(Debug)]
pub struct Resilient<G> {
    generator: G,
    rng: ChaCha8Rng,
}

impl<G: PromptGenerator> Resilient<G> {
    /// Wraps `generator`, seeding the fallback operands deterministically.
    #[must_use]
    pub fn new(generator: G, seed: u64) -> Self {
        Self {
            generator,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Provides read-only access to the wrapped generator.
    #[must_use]
    pub const fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G: PromptGenerator> PromptProvider for Resilient<G> {
    fn generate(&mut self, tier: Tier) -> Prompt {
        match self.generator.try_generate(tier) {
            Ok(prompt) => prompt,
            Err(error) => {
                log::warn!("prompt generation failed for {} tier: {error}", tier.label());
                fallback_prompt(tier, &mut self.rng)
            }
        }
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        self.generator.validate(prompt, input)
    }
}

/// Simple addition prompt used when a generator fails.
///
/// Operands grow with the tier: up to 5 for easy, 10 for medium and 12 otherwise.
pub fn fallback_prompt<R: Rng + ?Sized>(tier: Tier, rng: &mut R) -> Prompt {
    let max = match tier {
        Tier::Easy => 5,
        Tier::Medium => 10,
        Tier::Hard | Tier::Cluster => 12,
    };
    let a: u32 = rng.gen_range(1..=max);
    let b: u32 = rng.gen_range(1..=max);
    Prompt::with_answer(format!("{a} + {b}"), (a + b).to_string())
}
