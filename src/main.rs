//! Key share vault CLI
//!
//! Operator tool for encrypting, storing and recovering key shares.

use clap::{Parser, Subcommand};
use keyshare_vault::{Config, EnvelopeCodec, KeyShareVault, Result, ShareStore};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "keyshare")]
#[command(about = "Encrypted key share storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a key share and print the envelope
    Encrypt {
        /// Plaintext key share
        #[arg(short, long)]
        plaintext: String,
    },

    /// Decrypt an envelope and print the key share
    Decrypt {
        /// Envelope in the format IV:Ciphertext (hex)
        #[arg(short, long)]
        envelope: String,
    },

    /// Encrypt a key share and store it for an identifier
    Set {
        /// Identifier owning the share (e.g. an email address)
        #[arg(short, long)]
        identifier: String,

        /// Plaintext key share
        #[arg(short, long)]
        plaintext: String,
    },

    /// Store an already encrypted envelope for an identifier
    Put {
        /// Identifier owning the share
        #[arg(short, long)]
        identifier: String,

        /// Envelope in the format IV:Ciphertext (hex)
        #[arg(short, long)]
        envelope: String,
    },

    /// Fetch the key share stored for an identifier
    Get {
        /// Identifier owning the share
        #[arg(short, long)]
        identifier: String,

        /// Print the stored envelope instead of decrypting it
        #[arg(long)]
        raw: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging. RUST_LOG wins over the --verbose default.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    // Load config
    let config = match cli.config {
        Some(config_path) => Config::from_file(&config_path)?,
        None => Config::from_env(),
    };

    match cli.command {
        Commands::Encrypt { plaintext } => {
            let codec = EnvelopeCodec::from_env(&config.master_key_env)?;
            println!("{}", codec.encrypt(&plaintext)?);
        }
        Commands::Decrypt { envelope } => {
            let codec = EnvelopeCodec::from_env(&config.master_key_env)?;
            println!("{}", codec.decrypt(&envelope)?);
        }
        Commands::Set {
            identifier,
            plaintext,
        } => {
            run_set(&config, &identifier, &plaintext).await?;
        }
        Commands::Put {
            identifier,
            envelope,
        } => {
            run_put(&config, &identifier, &envelope).await?;
        }
        Commands::Get { identifier, raw } => {
            run_get(&config, &identifier, raw).await?;
        }
        Commands::Config => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| keyshare_vault::Error::Config(e.to_string()))?;
            println!("{}", json);
        }
    }

    Ok(())
}

async fn run_set(config: &Config, identifier: &str, plaintext: &str) -> Result<()> {
    let codec = EnvelopeCodec::from_env(&config.master_key_env)?;
    let store = ShareStore::new(config.store.clone());
    let vault = KeyShareVault::new(codec, store.clone());

    let result = vault.store_share(identifier, plaintext).await;
    store.close().await;
    result?;

    tracing::info!(identifier = %identifier, "Key share stored");
    Ok(())
}

async fn run_put(config: &Config, identifier: &str, envelope: &str) -> Result<()> {
    // Reject envelopes that could never be decrypted before they are persisted
    envelope.parse::<keyshare_vault::Envelope>()?;

    let store = ShareStore::new(config.store.clone());
    let result = store.set_share(identifier, envelope).await;
    store.close().await;
    result
}

async fn run_get(config: &Config, identifier: &str, raw: bool) -> Result<()> {
    let store = ShareStore::new(config.store.clone());

    let result = if raw {
        store.get_share(identifier).await
    } else {
        let codec = EnvelopeCodec::from_env(&config.master_key_env)?;
        KeyShareVault::new(codec, store.clone())
            .load_share(identifier)
            .await
    };
    store.close().await;

    match result? {
        Some(value) => println!("{}", value),
        None => {
            eprintln!("No key share stored for {}", identifier);
            std::process::exit(1);
        }
    }

    Ok(())
}
