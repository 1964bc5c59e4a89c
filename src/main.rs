//! Shiny Hunter CLI
//!
//! Runs the automation loop against a directory of screenshots. Actions are
//! logged by default; with the `desktop` feature they can drive the real
//! mouse and keyboard. Ctrl-C stops the loop after the current iteration.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use shiny_hunter::ai::BattleStrategy;
use shiny_hunter::input::{InputSink, LoggingSink};
use shiny_hunter::vision::{ScreenshotReplay, TesseractCli};
use shiny_hunter::{BotLoop, Settings};

/// Where input actions go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputBackend {
    /// Log actions only
    Log,
    /// Move the real pointer and press real keys
    Desktop,
}

#[derive(Parser, Debug)]
#[command(name = "hunter", version, about = "Screen-driven shiny hunting automation")]
struct Args {
    /// Settings file (JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of screenshots to replay as the frame source
    #[arg(short, long)]
    frames: PathBuf,

    /// Input backend
    #[arg(short, long, value_enum, default_value_t = InputBackend::Log)]
    input: InputBackend,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Stop after this many loop iterations
    #[arg(short, long)]
    max_iterations: Option<u64>,
}

fn input_sink(backend: InputBackend) -> anyhow::Result<Box<dyn InputSink>> {
    match backend {
        InputBackend::Log => Ok(Box::new(LoggingSink::new())),
        #[cfg(feature = "desktop")]
        InputBackend::Desktop => Ok(Box::new(
            shiny_hunter::input::DesktopSink::new().context("connecting to the desktop")?,
        )),
        #[cfg(not(feature = "desktop"))]
        InputBackend::Desktop => {
            anyhow::bail!("desktop input needs a build with `--features desktop`")
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.bot.debug |= args.debug;

    let level = if settings.bot.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let frames = ScreenshotReplay::open(&args.frames)
        .with_context(|| format!("opening screenshots in {}", args.frames.display()))?;

    let mut bot = BotLoop::from_settings(
        &settings,
        Box::new(frames),
        input_sink(args.input)?,
        Box::new(TesseractCli::new(&settings.ocr)),
        Box::new(BattleStrategy::new(&settings.strategy)),
    )?;

    let running = bot.running_flag();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, stopping after this iteration");
        running.store(false, Ordering::SeqCst);
    })
    .context("installing the Ctrl-C handler")?;

    let summary = bot.run(args.max_iterations);
    if summary.shiny_found {
        println!("Shiny found after {} iterations!", summary.iterations);
    } else {
        println!(
            "Stopped after {} iterations ({} battles, {} failed iterations)",
            summary.iterations, summary.battles, summary.failed_iterations
        );
    }
    Ok(())
}
