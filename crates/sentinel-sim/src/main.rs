//! Sentinel headless simulation runner.
//!
//! Usage: `sentinel-sim [config.toml] [level.ron]`
//!
//! Loads the AI config (defaults when the file is missing), spawns the level
//! manifest (a built-in level when none is given) and runs a scripted player
//! against it at a fixed 60 Hz.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod scenario;

use anyhow::{Context, Result};
use sentinel_ai::{AgentRegistry, AiConfig, SpawnManifest, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::scenario::{default_manifest, PlayerScript, Scenario};

/// Simulated time limit (seconds).
const MAX_SECONDS: f32 = 120.0;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("sentinel=info".parse()?))
        .init();

    info!("Sentinel sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = AiConfig::load_from(&config_path);
    let registry = AgentRegistry::new(config).context("invalid archetype configuration")?;

    let manifest = match args.next() {
        Some(path) => SpawnManifest::load_from(&path)
            .with_context(|| format!("failed to load spawn manifest {path}"))?,
        None => default_manifest(),
    };

    let mut scenario = Scenario::new(registry, &manifest, PlayerScript::default());
    let summary = scenario.run(MAX_SECONDS);

    info!(
        "Finished: {:?} after {:.2}s, player took {} damage, {} agents defeated",
        summary.outcome, summary.elapsed, summary.damage_taken, summary.defeated
    );
    Ok(())
}
