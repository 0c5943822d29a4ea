use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, warn};

use intake::config::{Config, StoreKind};
use intake::error::Error;
use intake::server::{self, AppState};
use intake::store::{EntryStore, MemoryStore, SupabaseStore};

/// Contact-form submission service
#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Serve the contact form, JSON CRUD API and dashboard", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Store backend: memory or supabase (overrides INTAKE_STORE)
    #[arg(long)]
    store: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("intake started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(store) = &cli.store {
        config.store = store.parse()?;
    }

    if config.uses_default_secret() {
        warn!("SESSION_SECRET not set; using the development fallback");
    }

    let store: Arc<dyn EntryStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Supabase => {
            let creds = config.supabase.as_ref().ok_or_else(|| {
                Error::Config(
                    "Missing SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY in environment".to_string(),
                )
            })?;
            Arc::new(SupabaseStore::new(&creds.url, &creds.service_role_key)?)
        }
    };
    debug!("using {} store", config.store);

    let state = AppState::new(store, config.session_secret.clone());
    server::serve(state, config.port).await?;

    Ok(())
}
