#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that starts a Space Invaders session.
//!
//! The adapter loads the game configuration, lays out the world for the
//! requested team, feeds any commands given on the command line through the
//! session's dispatcher and prints a summary of the result.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use space_invaders_config::GameConfig;
use space_invaders_system_layout::{invader_grid, player_row};
use space_invaders_system_session::GameSession;

mod report;

use report::SessionReport;

/// Starts a session and dispatches commands against it.
#[derive(Debug, Parser)]
#[command(name = "space-invaders", version, about)]
struct Args {
    /// Game configuration document; the builtin configuration is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of players in the session.
    #[arg(long, default_value_t = 1)]
    team_size: u32,

    /// Command wire frame to dispatch, e.g. '{"typeId":"ToggleCheat","transportAffinity":"UDP","playerId":32}'.
    #[arg(long = "command", value_name = "JSON")]
    commands: Vec<String>,

    /// Print the world snapshot as JSON instead of the summary.
    #[arg(long)]
    snapshot: bool,
}

/// Entry point for the Space Invaders command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::from_file(path)
            .with_context(|| format!("loading game config from {}", path.display()))?,
        None => GameConfig::builtin().context("loading builtin game config")?,
    };
    let config = Arc::new(config);

    let session = GameSession::start(Arc::clone(&config), args.team_size)
        .with_context(|| format!("laying out a world for {} player(s)", args.team_size))?;

    for (index, frame) in args.commands.iter().enumerate() {
        session
            .dispatch_bytes(frame.as_bytes())
            .with_context(|| format!("dispatching command #{}", index + 1))?;
    }
    if !args.commands.is_empty() {
        log::info!("dispatched {} command(s)", args.commands.len());
    }

    if args.snapshot {
        let json = serde_json::to_string_pretty(&session.snapshot())
            .context("serializing world snapshot")?;
        println!("{json}");
        return Ok(());
    }

    let report = SessionReport::new(
        &session.snapshot(),
        invader_grid(&config)?,
        player_row(&config, args.team_size)?,
        config.speeds(),
    );
    println!("{report}");
    Ok(())
}
