use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merkle_log::config::AppConfig;
use merkle_log::service::server;
use merkle_log::LogService;

#[derive(Parser)]
#[command(name = "merkle-log-server")]
#[command(about = "Tamper-evident append-only log server")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Newline-delimited file seeding the log, one entry per line
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Print the seeded tree before serving
    #[arg(long)]
    dump_tree: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merkle_log=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Merkle log server");

    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed_log_path = Some(seed.to_string_lossy().to_string());
    }

    let seed = config.load_seed()?;
    let service = LogService::from_text(&seed);

    let status = service.status().await;
    info!(
        "Log ready: {} entries, {} slots, root {}",
        status.size,
        status.capacity,
        hex::encode(status.root)
    );
    if cli.dump_tree {
        println!("{}", service.render().await);
    }

    let app = server::router(service);

    let addr = config.bind_address()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
