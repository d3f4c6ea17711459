//! Engine binary for the Codeshop simulation.
//!
//! Wires the entity store, the artifact generator, the Observer API, and
//! the operator controls together, then runs the clock and queue loops
//! until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `codeshop-config.yaml`
//! 3. Restore the store from the snapshot file, or found a new company
//! 4. Pick the artifact generator (LLM when credentials are set)
//! 5. Create operator state from the simulation bounds
//! 6. Start the Observer API server and the snapshot writer
//! 7. Run the simulation loops
//! 8. Save a final snapshot and log the result

mod error;
mod generator;
mod observer_callback;
mod persistence;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use codeshop_core::config::CompanyConfig;
use codeshop_core::runner;
use codeshop_core::{EntityStore, OperatorState};
use codeshop_observer::{AppState, ServerConfig};
use tokio::sync::{Mutex, Notify};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::generator::EngineGenerator;
use crate::observer_callback::EngineObserver;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "codeshop-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("codeshop-engine starting");
    run().await?;
    Ok(())
}

async fn run() -> Result<(), EngineError> {
    // 2. Load configuration.
    let config = load_config(Path::new(CONFIG_FILE))?;
    info!(
        company = %config.simulation.name,
        seed = config.simulation.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        queue_interval_ms = config.simulation.queue_interval_ms,
        "Configuration loaded"
    );

    // 3. Restore or found the company.
    let snapshot_path = PathBuf::from(&config.infrastructure.snapshot_path);
    let store = load_store(config.clone(), &snapshot_path)?;
    let store = Arc::new(Mutex::new(store));

    // 4. Pick the generator.
    let generator = EngineGenerator::from_env(&config.llm)?;
    info!(generator = generator.name(), "Artifact generator selected");

    // 5. Operator state.
    let operator = Arc::new(OperatorState::new(&config.simulation));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    // 6. Observer API server and snapshot writer.
    let app_state = Arc::new(AppState::new(Arc::clone(&store), Arc::clone(&operator)));
    let server_config = ServerConfig::from(&config.infrastructure);
    let server_state = Arc::clone(&app_state);
    let _observer_handle = tokio::spawn(async move {
        if let Err(err) = codeshop_observer::start_server(&server_config, server_state).await {
            error!(error = %err, "Observer server stopped");
        }
    });

    let snapshot_due = Arc::new(Notify::new());
    let writer = persistence::spawn_snapshot_writer(
        Arc::clone(&store),
        snapshot_path.clone(),
        Arc::clone(&snapshot_due),
    );
    let observer = EngineObserver::new(
        app_state,
        snapshot_due,
        config.infrastructure.snapshot_interval_ticks,
    );

    // 7. Run the simulation.
    info!("Entering simulation loops");
    let result = runner::run_simulation(&store, &generator, &operator, &observer).await;
    writer.abort();

    // 8. Final snapshot, whatever the outcome.
    match persistence::save_store(&store, &snapshot_path).await {
        Ok(tick) => info!(tick, path = %snapshot_path.display(), "Final snapshot saved"),
        Err(err) => error!(error = %err, "Final snapshot failed"),
    }
    let violations = store.lock().await.invariant_violations();
    for violation in &violations {
        warn!(violation = %violation, "Store invariant violated at shutdown");
    }

    let result = result?;
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "codeshop-engine shutdown complete"
    );

    Ok(())
}

/// Load `path`, or defaults when it does not exist. Environment overrides
/// apply either way.
fn load_config(path: &Path) -> Result<CompanyConfig, EngineError> {
    if path.exists() {
        Ok(CompanyConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = CompanyConfig::default();
        config
            .infrastructure
            .apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Restore the store from the snapshot at `path`, or found a new company.
fn load_store(config: CompanyConfig, path: &Path) -> Result<EntityStore, EngineError> {
    match persistence::load_snapshot(path)? {
        Some(snapshot) => {
            let store = EntityStore::restore(config, snapshot)?;
            info!(
                path = %path.display(),
                tick = store.current_tick(),
                tasks = store.tasks().count(),
                employees = store.employees().count(),
                "Snapshot restored"
            );
            Ok(store)
        }
        None => {
            info!(path = %path.display(), "No snapshot found, founding a new company");
            Ok(EntityStore::new(config))
        }
    }
}
