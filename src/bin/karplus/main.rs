//! karplus - terminal stress tester for the string engine
//!
//! Run with: cargo run --release -- --voices 100

mod app;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use karplus_dsp::{tuning, AmplitudeMode, EngineConfig, MAX_VOICES};
use tracing_subscriber::EnvFilter;

use app::App;

/// Where the string recurrence runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    /// Voices rendered directly by the engine.
    InProcess,
    /// Voices rendered by the linear-memory module, installed after start-up.
    Module,
}

#[derive(Debug, Parser)]
#[command(name = "karplus", about = "Plucked-string engine stress tester")]
struct Args {
    /// Number of strings to simulate (1-100).
    #[arg(short, long, default_value_t = 25, value_parser = clap::value_parser!(u16).range(1..=MAX_VOICES as i64))]
    voices: u16,

    /// Compute backend.
    #[arg(short, long, value_enum, default_value_t = BackendChoice::InProcess)]
    backend: BackendChoice,

    /// Use a rolling mean of this many samples instead of the envelope follower.
    #[arg(long)]
    window: Option<usize>,

    /// Disable the per-string telemetry panel.
    #[arg(long)]
    no_telemetry: bool,

    /// Seed for the excitation noise.
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Log file (the terminal belongs to the UI).
    #[arg(long, default_value = "karplus.log")]
    log: PathBuf,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let log = File::create(&args.log)
        .wrap_err_with(|| format!("failed to create log file {}", args.log.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let amplitude_mode = match args.window {
        Some(len) => AmplitudeMode::Window { len },
        None => AmplitudeMode::Envelope,
    };

    // Sample rate is filled in from the output device
    let config = EngineConfig::new(0, tuning::string_set(args.voices as usize))
        .telemetry(!args.no_telemetry)
        .amplitude_mode(amplitude_mode)
        .seed(args.seed);

    App::new(config, args.backend).run()
}
