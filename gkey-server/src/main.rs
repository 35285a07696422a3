use std::time::Duration;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use gkey_core::tasks::catalog_backfill::run_catalog_backfill;
use gkey_core::tasks::cooloff_sweep::{run_cooloff_sweep, spawn_cooloff_sweep_task};

mod context;
use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "gkey")]
#[command(author, version, about = "G-Key engagement service for creator campaigns")]
pub struct Args {
    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost:5432/gkey")]
    pub database_url: String,

    /// JSON file with category definitions; the built-in catalog is used when absent.
    #[arg(long)]
    pub catalog: Option<String>,

    /// Seconds between cooloff sweeps in `serve` mode.
    #[arg(long, default_value_t = 3600)]
    pub sweep_interval_secs: u64,

    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Backfill keys, then sweep cooloffs periodically until Ctrl-C.
    Serve,
    /// Expire all due cooloffs once.
    Sweep,
    /// Create missing catalog keys for every known user.
    Backfill,
    /// Print a user's key summary as JSON.
    Summary { user_id: String },
    /// Print per-key diagnostics for a user as JSON.
    Inspect { user_id: String },
    /// Administrative: put a key straight back to available.
    ForceUnlock { user_id: String, category: String },
}

fn init_tracing() {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records into tracing: {}", e);
    }
    let filter = EnvFilter::from_default_env()
        .add_directive("gkey=info".parse().unwrap_or_default())
        .add_directive("gkey_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let ctx = ServerContext::new(&args).await?;
    let command = args.command.clone().unwrap_or(Command::Serve);

    match command {
        Command::Serve => run_server(&ctx, &args).await?,
        Command::Sweep => {
            let changed = run_cooloff_sweep(&ctx.manager).await?;
            println!("{}", json!({ "expired": changed }));
        }
        Command::Backfill => {
            let (users, created) = run_catalog_backfill(&ctx.manager).await?;
            println!("{}", json!({ "users": users, "created": created }));
        }
        Command::Summary { user_id } => {
            let summary = ctx.manager.summarize(&user_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Inspect { user_id } => {
            let diagnostics = ctx.manager.inspect_user(&user_id).await?;
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        }
        Command::ForceUnlock { user_id, category } => {
            let key = ctx.manager.force_unlock(&user_id, &category).await?;
            println!("{}", serde_json::to_string_pretty(&key)?);
        }
    }

    ctx.db.pool().close().await;
    Ok(())
}

async fn run_server(ctx: &ServerContext, args: &Args) -> anyhow::Result<()> {
    info!(
        "gkey starting. categories={}, sweep_interval={}s",
        ctx.catalog.len(),
        args.sweep_interval_secs
    );

    if let Err(e) = run_catalog_backfill(&ctx.manager).await {
        error!("Startup backfill failed: {:?}", e);
    }

    let interval = Duration::from_secs(args.sweep_interval_secs.max(1));
    let sweep_handle = spawn_cooloff_sweep_task(ctx.manager.clone(), interval);

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received; shutting down.");
    sweep_handle.abort();
    Ok(())
}
