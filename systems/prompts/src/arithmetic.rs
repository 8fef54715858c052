//! Arithmetic prompts graded by school year.

use std::{fmt, str::FromStr};

use quiz_defence_core::{Prompt, Tier, Validation};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{PromptError, PromptGenerator};

/// School year levels, youngest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum YearLevel {
    /// Reception.
    Reception,
    /// Year 1.
    #[default]
    Year1,
    /// Year 2.
    Year2,
    /// Year 3.
    Year3,
    /// Year 4.
    Year4,
    /// Year 5.
    Year5,
    /// Year 6.
    Year6,
}

impl YearLevel {
    /// Every year level, youngest first.
    pub const ALL: [YearLevel; 7] = [
        YearLevel::Reception,
        YearLevel::Year1,
        YearLevel::Year2,
        YearLevel::Year3,
        YearLevel::Year4,
        YearLevel::Year5,
        YearLevel::Year6,
    ];

    /// Position of the level within [`YearLevel::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Identifier used on the command line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reception => "reception",
            Self::Year1 => "year1",
            Self::Year2 => "year2",
            Self::Year3 => "year3",
            Self::Year4 => "year4",
            Self::Year5 => "year5",
            Self::Year6 => "year6",
        }
    }

    /// Level used for prompts of the given tier, capped at the oldest year.
    #[must_use]
    pub fn for_tier(self, tier: Tier) -> YearLevel {
        let index = (self.index() + usize::from(tier.rank())).min(Self::ALL.len() - 1);
        Self::ALL[index]
    }
}

impl fmt::Display for YearLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown year level.
#[derive(Debug, thiserror::Error)]
#[error("unknown year level `{0}`, expected reception or year1..year6")]
pub struct ParseYearLevelError(String);

impl FromStr for YearLevel {
    type Err = ParseYearLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_lowercase().replace([' ', '-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|level| level.label() == normalised)
            .ok_or_else(|| ParseYearLevelError(value.to_owned()))
    }
}

/// Arithmetic operation a level may ask about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `a + b`.
    Add,
    /// `a - b` with a non-negative result.
    Subtract,
    /// `a x b`.
    Multiply,
    /// `a ÷ b` with a whole result.
    Divide,
}

/// Operations and operand ranges for one year level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSpec {
    /// Operations drawn uniformly for this level.
    pub operations: Vec<Operation>,
    /// Largest operand for addition and subtraction.
    pub sum_max: u32,
    /// Largest factor for multiplication and division.
    pub factor_max: u32,
}

impl LevelSpec {
    fn new(operations: &[Operation], sum_max: u32, factor_max: u32) -> Self {
        Self {
            operations: operations.to_vec(),
            sum_max,
            factor_max,
        }
    }

    /// Default curriculum for the level.
    #[must_use]
    pub fn standard(level: YearLevel) -> Self {
        use Operation::{Add, Divide, Multiply, Subtract};

        match level {
            YearLevel::Reception => Self::new(&[Add], 5, 1),
            YearLevel::Year1 => Self::new(&[Add, Subtract], 10, 1),
            YearLevel::Year2 => Self::new(&[Add, Subtract, Multiply], 20, 5),
            YearLevel::Year3 => Self::new(&[Add, Subtract, Multiply], 50, 10),
            YearLevel::Year4 => Self::new(&[Add, Subtract, Multiply, Divide], 100, 12),
            YearLevel::Year5 => Self::new(&[Add, Subtract, Multiply, Divide], 1_000, 12),
            YearLevel::Year6 => Self::new(&[Add, Subtract, Multiply, Divide], 10_000, 12),
        }
    }
}

/// Generates arithmetic prompts relative to the player's base year.
#[derive(Debug)]
pub struct ArithmeticGenerator {
    base: YearLevel,
    levels: Vec<LevelSpec>,
    rng: ChaCha8Rng,
}

impl ArithmeticGenerator {
    /// Creates a generator for the given base year using the default curriculum.
    #[must_use]
    pub fn new(base: YearLevel, seed: u64) -> Self {
        Self {
            base,
            levels: YearLevel::ALL.into_iter().map(LevelSpec::standard).collect(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Replaces the curriculum of a single level.
    #[must_use]
    pub fn with_level(mut self, level: YearLevel, table: LevelSpec) -> Self {
        self.levels[level.index()] = table;
        self
    }

    /// Base year chosen by the player.
    #[must_use]
    pub const fn base(&self) -> YearLevel {
        self.base
    }

    fn operand(&mut self, max: u32) -> u32 {
        self.rng.gen_range(1..=max.max(1))
    }
}

impl PromptGenerator for ArithmeticGenerator {
    fn try_generate(&mut self, tier: Tier) -> Result<Prompt, PromptError> {
        let level = self.base.for_tier(tier);
        let table = &self.levels[level.index()];
        if table.operations.is_empty() {
            return Err(PromptError::NoOperations(level.label()));
        }
        let operation = table.operations[self.rng.gen_range(0..table.operations.len())];
        let (sum_max, factor_max) = (table.sum_max, table.factor_max);

        let (text, answer) = match operation {
            Operation::Add => {
                let (a, b) = (self.operand(sum_max), self.operand(sum_max));
                (format!("{a} + {b}"), a + b)
            }
            Operation::Subtract => {
                let (a, b) = (self.operand(sum_max), self.operand(sum_max));
                let (a, b) = (a.max(b), a.min(b));
                (format!("{a} - {b}"), a - b)
            }
            Operation::Multiply => {
                let (a, b) = (self.operand(factor_max), self.operand(factor_max));
                (format!("{a} x {b}"), a * b)
            }
            Operation::Divide => {
                let (divisor, quotient) = (self.operand(factor_max), self.operand(factor_max));
                (format!("{} ÷ {divisor}", divisor * quotient), quotient)
            }
        };
        Ok(Prompt::with_answer(text, answer.to_string()))
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        let input = input.trim();
        let parsed = input.parse::<f64>().ok();
        let accepted = prompt.correct_answers().iter().any(|answer| {
            match (parsed, answer.trim().parse::<f64>().ok()) {
                (Some(given), Some(expected)) => (given - expected).abs() < f64::EPSILON,
                _ => answer.trim() == input,
            }
        });
        if accepted {
            Validation::correct(prompt.primary_answer())
        } else {
            Validation::incorrect(prompt.primary_answer())
        }
    }
}
