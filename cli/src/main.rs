//! `mamono`: plays a cooperative room with bot players against an in-memory store and prints how it went.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mamono_core::ModeId;

mod settings;
mod sim;

use settings::Settings;
use sim::SimOptions;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Game mode
    #[arg(short, long, default_value = "easy", value_parser = parse_mode)]
    mode: ModeId,

    /// Number of bot players
    #[arg(short, long, default_value_t = 3)]
    players: u8,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML file with mode overrides and client settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many moves across all players
    #[arg(long, default_value_t = 2_000)]
    max_moves: u32,

    /// Pause between a bot's moves, in milliseconds
    #[arg(long, default_value_t = 25)]
    think_ms: u64,
}

fn parse_mode(s: &str) -> Result<ModeId, String> {
    ModeId::parse(s).ok_or_else(|| {
        let known: Vec<_> = ModeId::ALL.iter().map(|mode| mode.as_str()).collect();
        format!("unknown mode {:?}, expected one of {}", s, known.join(", "))
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {}", seed);

    let options = SimOptions {
        mode: args.mode,
        players: args.players,
        seed,
        max_moves: args.max_moves,
        think: Duration::from_millis(args.think_ms),
        modes: settings.catalog()?,
        client: settings.client,
    };
    let summary = sim::run(&options)?;
    print!("{}", summary.render());
    println!("seed: {}", seed);
    Ok(())
}
