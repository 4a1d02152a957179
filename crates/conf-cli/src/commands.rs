//! Command implementations
//!
//! Each command builds an explicit context (state root + parsed settings)
//! and hands protocol decisions to conf-core. Success and skip lines are
//! printed here; errors bubble to main.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use conf_core::{Context, SyncCoordinator, SyncOutcome};
use conf_store::open_backend;

use crate::error::{CliError, Result};

/// Default settings seeded into a fresh state directory.
const DEFAULT_SETTINGS: &str = include_str!("../assets/settings.json");

/// Resolve the state root: `$CONFSYNC_DIR` when set, else `~/.confsync`.
fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CONFSYNC_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".confsync"))
        .ok_or_else(|| CliError::user("could not resolve the user home directory"))
}

/// Ensure the state directory exists, seeding default settings on first use.
///
/// Returns the directory and whether the settings file was just created.
fn ensure_state_dir() -> Result<(PathBuf, bool)> {
    let dir = state_dir()?;
    fs::create_dir_all(&dir)?;

    let settings_path = dir.join("settings.json");
    if settings_path.exists() {
        return Ok((dir, false));
    }
    fs::write(&settings_path, DEFAULT_SETTINGS)?;
    Ok((dir, true))
}

fn load_context() -> Result<Context> {
    let (dir, _) = ensure_state_dir()?;
    Ok(Context::load(&dir)?)
}

pub fn run_init() -> Result<()> {
    let (dir, created) = ensure_state_dir()?;
    let settings_path = dir.join("settings.json");
    if created {
        println!(
            "{} initialization completed, settings file: {}",
            "ok".green().bold(),
            settings_path.display()
        );
    } else {
        println!(
            "{} initialization skipped, settings file already exists: {}",
            "skipped".yellow().bold(),
            settings_path.display()
        );
    }
    Ok(())
}

pub fn run_cfg_pull(name: &str) -> Result<()> {
    let coordinator = open_coordinator(name)?;
    report("configuration pull", name, coordinator.pull(name)?);
    Ok(())
}

pub fn run_cfg_push(name: &str) -> Result<()> {
    let coordinator = open_coordinator(name)?;
    report("configuration push", name, coordinator.push(name)?);
    Ok(())
}

pub fn run_cfg_init(name: &str) -> Result<()> {
    let coordinator = open_coordinator(name)?;
    report("configuration init", name, coordinator.init(name)?);
    Ok(())
}

/// Validate the entry exists before touching the store configuration, so an
/// unknown name is reported even with unconfigured credentials.
fn open_coordinator(name: &str) -> Result<SyncCoordinator> {
    let ctx = load_context()?;
    ctx.settings.find_cfg(name)?;
    Ok(SyncCoordinator::open(ctx)?)
}

pub fn run_lib_pull(name: &str) -> Result<()> {
    let ctx = load_context()?;
    ctx.settings.find_lib(name)?;
    let backend = open_backend(&ctx.settings.oss)?;
    conf_core::library::pull(&ctx, backend.as_ref(), name)?;
    println!(
        "{} library pull completed successfully for: {}",
        "ok".green().bold(),
        name
    );
    Ok(())
}

fn report(operation: &str, name: &str, outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Completed => println!(
            "{} {operation} completed successfully for: {name}",
            "ok".green().bold()
        ),
        SyncOutcome::Skipped { reason } => println!(
            "{} {operation} skipped for {name}: {reason}",
            "skipped".yellow().bold()
        ),
    }
}
