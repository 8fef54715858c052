#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Quiz Defence session.
//!
//! A scripted player answers prompts while a lane battlefield moves monsters
//! and projectiles. Progress is reported through `log`; set `RUST_LOG=info`
//! to follow waves and `RUST_LOG=debug` for every world event.

mod battlefield;
mod player;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use quiz_defence_core::{GameConfig, GameSpeed, PromptProvider, Tier};
use quiz_defence_prompts::{ArithmeticGenerator, Resilient, VerbGenerator, YearLevel};
use quiz_defence_session::{Session, SessionEvent};
use quiz_defence_world::query;

use crate::{battlefield::LaneBattlefield, player::ScriptedPlayer};

#[derive(Parser, Debug)]
#[command(
    name = "quiz-defence",
    version = env!("CARGO_PKG_VERSION"),
    about = "Plays a headless Quiz Defence session with a scripted player",
    long_about = None,
)]
struct Args {
    /// Kind of prompts shown on tower slots.
    #[arg(long, value_enum, default_value_t = Mode::Arithmetic)]
    mode: Mode,

    /// Base difficulty for verb prompts.
    #[arg(long, value_enum, default_value_t = TierArg::Easy)]
    tier: TierArg,

    /// Base school year for arithmetic prompts.
    #[arg(long, default_value_t = YearLevel::Year1)]
    year: YearLevel,

    /// Game speed chosen from the menu.
    #[arg(long, value_enum, default_value_t = SpeedArg::Normal)]
    speed: SpeedArg,

    /// Seed for spawns, prompts and the scripted player.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated seconds to play before stopping.
    #[arg(long, default_value_t = 300)]
    seconds: u64,

    /// Length of one simulation frame in milliseconds.
    #[arg(long = "tick-ms", default_value_t = 16)]
    tick_ms: u64,

    /// Probability that the scripted player answers correctly.
    #[arg(long, default_value_t = 0.8)]
    accuracy: f64,

    /// Delay between scripted answers in milliseconds.
    #[arg(long = "answer-every-ms", default_value_t = 1_500)]
    answer_every_ms: u64,

    /// Prints the effective configuration as TOML and exits.
    #[arg(long = "print-config")]
    print_config: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Arithmetic,
    Verbs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TierArg {
    Easy,
    Medium,
    Hard,
}

impl From<TierArg> for Tier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Easy => Tier::Easy,
            TierArg::Medium => Tier::Medium,
            TierArg::Hard => Tier::Hard,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SpeedArg {
    Relaxed,
    Normal,
    Fast,
}

impl From<SpeedArg> for GameSpeed {
    fn from(value: SpeedArg) -> Self {
        match value {
            SpeedArg::Relaxed => GameSpeed::Relaxed,
            SpeedArg::Normal => GameSpeed::Normal,
            SpeedArg::Fast => GameSpeed::Fast,
        }
    }
}

/// Entry point for the Quiz Defence command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?.with_speed(args.speed.into());
    if args.print_config {
        let rendered = config
            .to_toml_string()
            .context("failed to render configuration")?;
        print!("{rendered}");
        return Ok(());
    }
    anyhow::ensure!(args.tick_ms > 0, "--tick-ms must be positive");

    let monsters = config.monsters;
    let provider = build_provider(&args);
    let mut session =
        Session::new(config, provider, args.seed).context("configuration rejected")?;
    let mut field = LaneBattlefield::new(monsters);
    let mut player = ScriptedPlayer::new(
        args.seed.wrapping_add(1),
        args.accuracy,
        Duration::from_millis(args.answer_every_ms),
    );

    report(&session.start());

    let dt = Duration::from_millis(args.tick_ms);
    let limit = Duration::from_secs(args.seconds);
    let mut answers = 0_u32;
    let mut correct = 0_u32;
    while session.stats().elapsed < limit && !session.is_game_over() {
        report(&session.tick(dt, &mut field));
        if session.is_game_over() {
            break;
        }

        let view = query::prompt_view(session.world());
        if let Some(answer) = player.next_answer(dt, &view) {
            let result = session.submit_answer(&answer);
            answers += 1;
            if result.outcome.any_correct {
                correct += 1;
            }
            log::debug!("answered {answer:?}: {:?}", result.outcome);
            report(&result.events);
        }
    }

    let stats = session.stats();
    log::debug!(
        "{} projectiles still in flight at shutdown",
        field.projectiles_in_flight()
    );
    println!(
        "wave {} | score {} | lives {} | answers {correct}/{answers} correct | {:.1}s simulated{}",
        stats.wave.wave,
        stats.score,
        stats.lives,
        stats.elapsed.as_secs_f64(),
        if stats.final_score.is_some() {
            " | game over"
        } else {
            ""
        },
    );
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    GameConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn build_provider(args: &Args) -> Box<dyn PromptProvider> {
    match args.mode {
        Mode::Arithmetic => Box::new(Resilient::new(
            ArithmeticGenerator::new(args.year, args.seed),
            args.seed,
        )),
        Mode::Verbs => Box::new(Resilient::new(
            VerbGenerator::new(args.tier.into(), args.seed),
            args.seed,
        )),
    }
}

fn report(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::WaveAdvanced { wave } => log::info!("wave {wave} begins"),
            SessionEvent::GameOver { final_score } => {
                log::info!("game over with {final_score} points");
            }
            SessionEvent::MonsterEscaped { lives, .. } => {
                log::info!("a monster reached the base, {lives} lives left");
            }
            other => log::debug!("{other:?}"),
        }
    }
}
