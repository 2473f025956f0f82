use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use event_tracker::config::EventTrackerConfig;
use event_tracker::module::MODULE_NAME;
use runtime::{AppConfig, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

mod cli;
mod commands;

use cli::{Cli, Commands};

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {dsn})"))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create database dir {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

async fn connect(db: &DatabaseConfig, base_dir: &Path, mock: bool) -> Result<DatabaseConnection> {
    let dsn = if mock {
        MEMORY_DSN.to_string()
    } else {
        let raw = db.url.trim();
        if raw.is_empty() {
            return Err(anyhow!("Database URL not configured"));
        }
        absolutize_sqlite_dsn(raw, base_dir, true)?
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.sqlx_logging(false)
        .acquire_timeout(Duration::from_secs(5));
    if dsn != MEMORY_DSN {
        if let Some(n) = db.max_conns {
            opts.max_connections(n);
        }
    }
    let busy = Duration::from_millis(u64::from(db.busy_timeout_ms.unwrap_or(5000)));
    opts.map_sqlx_sqlite_opts(move |o| o.create_if_missing(true).busy_timeout(busy));

    tracing::info!("Connecting to database: {}", dsn);
    Database::connect(opts)
        .await
        .with_context(|| format!("cannot open database {dsn}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.verbose);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::debug!("event-tracker starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let module_cfg: EventTrackerConfig = config.module_config_or_default(MODULE_NAME)?;
    let Some(command) = cli.command else {
        return Err(anyhow!("no command given; see --help"));
    };
    if let Commands::Check = command {
        return check_config(&config, &module_cfg);
    }

    let db_config = config
        .database
        .clone()
        .or_else(|| AppConfig::default().database)
        .ok_or_else(|| anyhow!("Database configuration missing"))?;
    let db = connect(&db_config, &config.home_dir(), cli.mock).await?;
    let module = event_tracker::bootstrap(db, module_cfg).await?;

    commands::run(module.client().as_ref(), &cli.auth, command).await
}

fn check_config(config: &AppConfig, module_cfg: &EventTrackerConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    if let Some(db) = &config.database {
        absolutize_sqlite_dsn(db.url.trim(), &config.home_dir(), false)?;
    }
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    println!(
        "event_tracker: horizon {} days, conflict window {} min, notifications {}, remote suggestions {}",
        module_cfg.upcoming_horizon_days,
        module_cfg.conflict_window_minutes,
        if module_cfg.notifications.enabled { "on" } else { "off" },
        if module_cfg.suggestions.remote_enabled() { "on" } else { "off" },
    );
    Ok(())
}
