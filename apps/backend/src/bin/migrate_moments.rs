//! Collapse duplicate moments into comments on each song's earliest moment.
//!
//! Reads the same configuration as the server. Safe to run repeatedly; a
//! second run finds nothing to do.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_api::{config::Config, db, services::migrate_duplicate_moments};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("music_api=info,migrate_moments=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!("Migrating moments in {:?}", config.database.path);

    if !config.database.path.exists() {
        anyhow::bail!("Database {:?} does not exist", config.database.path);
    }

    let pool = db::init_pool(&config.database.path, 1).context("Failed to open database")?;
    let mut conn = pool.get().context("Failed to check out a connection")?;

    let report = migrate_duplicate_moments(&mut conn).context("Migration aborted")?;

    tracing::info!(
        groups = report.groups,
        converted = report.converted,
        reparented = report.reparented,
        "Done"
    );
    Ok(())
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
