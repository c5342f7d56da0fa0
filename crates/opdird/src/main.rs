//! `opdird`, the operator directory daemon.
//!
//! Serves an authoritative record log over JSON-RPC and provides the
//! operator-facing commands for querying and changing the directory.
//!
//! # Usage
//!
//! ```text
//! opdird serve -c opdir.toml                    # serve the local log
//! opdird get-entries --name alice               # query local or remote
//! opdird submit-records changes.json            # sign and append
//! opdird submit-records changes.json --reset    # start a new root chain
//! opdird sign doc.json > doc.signed.json        # detached signature
//! opdird verify doc.signed.json alice           # check a signed doc
//! opdird keygen --subject root --out root.json  # self-signed root CA
//! ```

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::KeygenOptions;
use config::{CliConfig, DirectoryMode};

#[derive(Parser)]
#[command(name = "opdird", version, about = "Federated operator directory daemon")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "OPDIR_CONFIG")]
    config: Option<PathBuf>,

    /// Follow this JSON-RPC endpoint instead of the configured directory.
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the local record log over JSON-RPC.
    Serve {
        /// Override listen address (e.g. "127.0.0.1:4830").
        #[arg(short, long)]
        listen_addr: Option<String>,

        /// Keep records in memory only.
        #[arg(short, long)]
        memory: bool,
    },

    /// Print directory entries as JSON.
    GetEntries {
        /// Only this operator.
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Sign and submit change records from a JSON file.
    ///
    /// The file holds `{"records": [{"name", "section", "data"}, ...]}`.
    SubmitRecords {
        file: PathBuf,

        /// Start a new root chain instead of appending to the tip.
        #[arg(long)]
        reset: bool,
    },

    /// Sign a JSON document with the configured identity.
    Sign { file: PathBuf },

    /// Verify a signed JSON document as coming from NAME.
    Verify { file: PathBuf, name: String },

    /// Generate a signing key and certificate.
    Keygen {
        #[arg(long)]
        subject: String,

        /// Certificate group (repeatable), e.g. `sd-admin`.
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Allow the certificate to issue others.
        #[arg(long)]
        ca: bool,

        /// Validity in days.
        #[arg(long, default_value = "365")]
        days: u64,

        /// Issuer identity file. Without it a self-signed root is made.
        #[arg(long)]
        issuer: Option<PathBuf>,

        /// Where to write the identity file.
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);

    if let Some(endpoint) = cli.endpoint {
        config.directory.mode = DirectoryMode::Remote;
        config.directory.endpoint = endpoint;
    }

    match cli.command {
        Commands::Serve {
            listen_addr,
            memory,
        } => {
            if let Some(addr) = listen_addr {
                config.node.listen_addr = addr;
            }
            if memory {
                config.storage = opdir_store::DatastoreConfig::Memory;
            }
            commands::serve(&config).await
        }
        Commands::GetEntries { name } => {
            let directory = commands::build_directory(&config)?;
            let entries = commands::get_entries(directory.as_ref(), name.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
        Commands::SubmitRecords { file, reset } => {
            let identity = commands::load_identity(&config)?;
            let trust = commands::load_trust(&config)?;
            let directory = commands::build_directory(&config)?;
            let signed =
                commands::submit_records(directory.as_ref(), &identity, &trust, &file, reset).await?;
            for record in &signed {
                println!("{}", record.hash);
            }
            Ok(())
        }
        Commands::Sign { file } => {
            let identity = commands::load_identity(&config)?;
            let trust = commands::load_trust(&config)?;
            let signed = commands::sign(&identity, &trust, &file)?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
            Ok(())
        }
        Commands::Verify { file, name } => {
            let trust = commands::load_trust(&config)?;
            commands::verify(&trust, &file, &name)?;
            println!("ok");
            Ok(())
        }
        Commands::Keygen {
            subject,
            groups,
            ca,
            days,
            issuer,
            out,
        } => {
            let identity = commands::keygen(&KeygenOptions {
                subject: &subject,
                groups: &groups,
                ca,
                days,
                issuer: issuer.as_deref(),
            })?;
            std::fs::write(&out, serde_json::to_vec_pretty(&identity)?)
                .with_context(|| format!("failed to write {}", out.display()))?;
            // The certificate alone is what others add to their trust roots.
            println!("{}", serde_json::to_string_pretty(&identity.certificate)?);
            Ok(())
        }
    }
}
