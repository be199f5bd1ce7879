//! Merkle Log Auditor CLI
//!
//! Checks entries against a remote log server without trusting it beyond the
//! root hash it publishes.
//!
//! Exit status: 0 when the check holds, 1 when it does not, 2 when the answer
//! is indeterminate because the server could not be reached.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use merkle_log::config::AppConfig;
use merkle_log::hashing::{decode_hash, encode_hash};
use merkle_log::tree::ConsistencyCheck;
use merkle_log::{Auditor, LogClient, LogError, Snapshot};

const EXIT_NO: i32 = 1;
const EXIT_INDETERMINATE: i32 = 2;

#[derive(Parser)]
#[command(name = "merkle-auditor")]
#[command(about = "Independent auditor for a Merkle log server")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log server URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the root and size the server currently commits to
    Snapshot,

    /// Check whether an entry appears anywhere in the log
    Member {
        /// Entry text
        entry: String,
    },

    /// Check an entry at a known index
    MemberAt {
        /// Index returned when the entry was appended
        index: usize,

        /// Entry text
        entry: String,
    },

    /// Check that an earlier root is a prefix of the current log
    Consistency {
        /// Size of the earlier log
        prior_size: usize,

        /// Hex root of the earlier log
        prior_root: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merkle_log=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(cli.config.as_deref())?;
    let server_url = cli.server.unwrap_or(config.log_server_url);

    let client = LogClient::with_timeout(
        server_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    info!("Auditing log server at {}", server_url);

    match run(cli.command, client).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(EXIT_NO),
        Err(LogError::TransportError(e)) => {
            error!("Log server unreachable, result indeterminate: {}", e);
            std::process::exit(EXIT_INDETERMINATE);
        }
        Err(e) => Err(anyhow!("Audit failed: {}", e)),
    }
}

async fn run(command: Commands, client: LogClient) -> Result<bool, LogError> {
    let mut auditor = Auditor::new(client).await?;

    match command {
        Commands::Snapshot => {
            println!("size: {}", auditor.size());
            println!("root: {}", encode_hash(auditor.root()));
            Ok(true)
        }
        Commands::Member { entry } => {
            let found = auditor.is_member(entry.as_bytes()).await?;
            println!(
                "{} {} a member of the log ({} entries)",
                entry,
                if found { "is" } else { "is not" },
                auditor.size()
            );
            Ok(found)
        }
        Commands::MemberAt { index, entry } => {
            let found = auditor.is_member_at(entry.as_bytes(), index).await?;
            println!(
                "{} {} at index {}",
                entry,
                if found { "verified" } else { "not verified" },
                index
            );
            Ok(found)
        }
        Commands::Consistency {
            prior_size,
            prior_root,
        } => {
            let earlier = Snapshot {
                root: decode_hash(&prior_root)?,
                size: prior_size,
            };
            let check = auditor.check_consistency(&earlier).await?;
            match check {
                ConsistencyCheck::Consistent => println!(
                    "log of size {} extends the earlier log of size {}",
                    auditor.size(),
                    prior_size
                ),
                ConsistencyCheck::Inconsistent => {
                    println!("earlier root is NOT a prefix of the current log")
                }
                ConsistencyCheck::Unprovable => println!(
                    "no consistency proof exists between sizes {} and {}",
                    prior_size,
                    auditor.size()
                ),
            }
            Ok(check.is_consistent())
        }
    }
}
