//! FlatKV CLI
//!
//! Command-line interface for inspecting and maintaining a FlatKV
//! workspace.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use flatkv::{Config, Store};

/// FlatKV CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv-cli")]
#[command(about = "CLI for the FlatKV flat-file key/blob store")]
struct Args {
    /// Workspace directory
    #[arg(short, long, default_value = "./flatkv_data")]
    workspace: PathBuf,

    /// Blob log filename inside the workspace
    #[arg(short, long, default_value = "index")]
    name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show store statistics
    Info,

    /// Get a payload by key (hex-dumped to stdout)
    Get {
        /// The key to get
        key: String,
    },

    /// Compact the store, reclaiming tombstoned and overwritten bytes
    Compact,

    /// Dump the live entries into shard files
    Dump {
        /// Destination directory
        destination: PathBuf,

        /// Number of shards
        #[arg(short, long, default_value_t = 1)]
        shards: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> flatkv::Result<()> {
    let config = Config::builder()
        .workspace(&args.workspace)
        .index_filename(&args.name)
        .build();
    let mut store = Store::open(config)?;

    match args.command {
        Commands::Info => {
            println!("keys:          {}", store.len());
            println!("live keys:     {}", store.live_len());
            println!("key capacity:  {}", store.key_capacity());
            println!("physical size: {} bytes", store.physical_size()?);
        }

        Commands::Get { key } => match store.get(&[key.as_str()])?.pop().flatten() {
            Some(payload) => {
                for chunk in payload.chunks(16) {
                    let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
                    println!("{}", hex.join(" "));
                }
            }
            None => println!("(not found)"),
        },

        Commands::Compact => {
            let before = store.physical_size()?;
            store.compact()?;
            let after = store.physical_size()?;
            println!("compacted: {} -> {} bytes", before, after);
        }

        Commands::Dump {
            destination,
            shards,
        } => {
            store.dump(&destination, shards)?;
            println!(
                "dumped {} live entries into {} shards at {}",
                store.live_len(),
                shards,
                destination.display()
            );
        }
    }

    store.release()
}
