mod cli;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pubsim_core::{Catalog, EngineConfig, GameBuilder, GameState, TracingSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run a pub from opening night to (with luck) a licence that lasts.
#[derive(Debug, Parser)]
#[command(name = "pubsim", version)]
struct Args {
    /// Seed for the random source. A fresh one is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding engine.yaml and a catalog/ folder, replacing the built-in data.
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Resume from a save file (.json, anything else is read as binary).
    #[arg(long, value_name = "FILE")]
    load: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (config, catalog) = load_content(args.config_dir.as_deref())?;

    let mut game = match &args.load {
        Some(path) => {
            let mut game = load_game(config, catalog, path)?;
            game.attach_sink(Box::new(TracingSink));
            game
        }
        None => {
            let builder = GameBuilder::new(config, catalog).with_sink(Box::new(TracingSink));
            let builder = match args.seed {
                Some(seed) => builder.with_seed(seed),
                None => builder,
            };
            builder.build().context("failed to set up a new game")?
        }
    };

    info!(seed = ?args.seed, loaded = args.load.is_some(), "session started");
    cli::run(&mut game)
}

fn load_content(dir: Option<&Path>) -> Result<(EngineConfig, Catalog)> {
    match dir {
        Some(dir) => {
            let config = EngineConfig::load_from_dir(dir)?;
            let catalog = Catalog::load_from_dir(dir.join("catalog"))?;
            Ok((config, catalog))
        }
        None => Ok((EngineConfig::from_embedded()?, Catalog::from_embedded()?)),
    }
}

pub(crate) fn load_game(config: EngineConfig, catalog: Catalog, path: &Path) -> Result<GameState> {
    let game = if cli::is_json_path(path) {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read save file: {}", path.display()))?;
        GameState::load_json(config, catalog, &text)
    } else {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read save file: {}", path.display()))?;
        GameState::load_bytes(config, catalog, &bytes)
    };
    game.with_context(|| format!("failed to load save file: {}", path.display()))
}
