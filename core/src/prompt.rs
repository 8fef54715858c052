//! Prompt contracts consumed by the lifecycle systems.

use serde::{Deserialize, Serialize};

use crate::Tier;

/// Question shown on a slot or tower together with its accepted answers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prompt {
    display_text: String,
    correct_answers: Vec<String>,
}

impl Prompt {
    /// Creates a prompt from its display text and the answers it accepts.
    #[must_use]
    pub fn new(display_text: impl Into<String>, correct_answers: Vec<String>) -> Self {
        Self {
            display_text: display_text.into(),
            correct_answers,
        }
    }

    /// Creates a prompt that accepts a single answer.
    #[must_use]
    pub fn with_answer(display_text: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::new(display_text, vec![answer.into()])
    }

    /// Text presented to the player.
    #[must_use]
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    /// Every answer accepted as correct.
    #[must_use]
    pub fn correct_answers(&self) -> &[String] {
        &self.correct_answers
    }

    /// Canonical answer revealed when the prompt expires.
    #[must_use]
    pub fn primary_answer(&self) -> &str {
        self.correct_answers
            .first()
            .map_or("", String::as_str)
    }
}

/// Outcome of checking a submitted answer against a prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    /// Whether the submitted answer was accepted.
    pub is_correct: bool,
    /// Extra points awarded on top of the regular score.
    pub bonus_points: u32,
    /// Correct form of the answer, suitable for feedback.
    pub correct_form: String,
}

impl Validation {
    /// Accepted answer without bonus.
    #[must_use]
    pub fn correct(correct_form: impl Into<String>) -> Self {
        Self {
            is_correct: true,
            bonus_points: 0,
            correct_form: correct_form.into(),
        }
    }

    /// Rejected answer.
    #[must_use]
    pub fn incorrect(correct_form: impl Into<String>) -> Self {
        Self {
            is_correct: false,
            bonus_points: 0,
            correct_form: correct_form.into(),
        }
    }
}

/// External collaborator that supplies prompts and validates answers.
pub trait PromptProvider {
    /// Generates a fresh prompt for the requested tier.
    ///
    /// Implementations never fail; generation problems degrade to a simpler prompt.
    fn generate(&mut self, tier: Tier) -> Prompt;

    /// Checks `input` against the prompt's accepted answers.
    fn validate(&self, prompt: &Prompt, input: &str) -> Validation;
}

impl<P: PromptProvider + ?Sized> PromptProvider for &mut P {
    fn generate(&mut self, tier: Tier) -> Prompt {
        (**self).generate(tier)
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        (**self).validate(prompt, input)
    }
}

impl<P: PromptProvider + ?Sized> PromptProvider for Box<P> {
    fn generate(&mut self, tier: Tier) -> Prompt {
        (**self).generate(tier)
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        (**self).validate(prompt, input)
    }
}
