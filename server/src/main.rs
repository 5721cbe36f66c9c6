mod config;
mod http;

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{EmployeeDraft, EmployeeService};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "hr-server", version, about = "FossRust HR employee service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert a small demo roster.
    Seed,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

const DEMO_ROSTER: &[(&str, i32, &str, &str)] = &[
    ("Ana María Pérez", 29, "Desarrolladora", "Ingeniería"),
    ("Luis Gómez", 41, "Líder técnico", "Ingeniería"),
    ("Carla Ruiz", 35, "Analista", "Finanzas"),
    ("Jorge Díaz", 24, "Soporte", "Operaciones"),
    ("Sofía Herrera", 52, "Gerente", "Ventas"),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed => run_seed().await,
    }
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = setup_pool().await?;
    ensure_migrations(&pool, config.run_migrations_on_start, cmd.allow_dirty).await?;
    let state = AppState::new(Arc::new(pool), config);
    http::serve((&cmd).into(), state).await
}

async fn ensure_migrations(pool: &DbPool, apply: bool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if pending.is_empty() {
        return Ok(());
    }
    if apply {
        Migrator::up(pool, None).await?;
        info!(applied = pending.len(), "pending migrations applied");
        return Ok(());
    }
    if !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p server -- migrate up` or pass --allow-dirty"
        );
    }
    warn!(pending = pending.len(), "starting with pending migrations");
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn run_seed() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    let service = EmployeeService::with_connection(Arc::new(pool));
    for (name, age, position, department) in DEMO_ROSTER {
        let employee = service
            .create(EmployeeDraft::new(*name, *age, *position, *department))
            .await?;
        info!(id = employee.id, name = %employee.name, "seeded employee");
    }
    Ok(())
}
