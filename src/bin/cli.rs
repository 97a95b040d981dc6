//! strata CLI
//!
//! Create and inspect strata stores from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use strata::checksum::{checker, ChecksumKind};
use strata::config::FILE_SIZE_DEFAULT;
use strata::store::HeaderManager;
use strata::{open_store, BackingMode, StoreConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// strata CLI
#[derive(Parser, Debug)]
#[command(name = "strata-cli")]
#[command(about = "Create and inspect strata stores")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a store and write an empty header
    Init {
        /// Store file
        path: PathBuf,

        /// Growth unit in bytes
        #[arg(short, long, default_value_t = FILE_SIZE_DEFAULT)]
        unit_size: u64,

        /// Size ceiling in growth units
        #[arg(short, long, default_value = "16")]
        max_units: u64,

        /// Record size stored in the header
        #[arg(short, long, default_value = "64")]
        record_size: u64,

        /// Back the store with a memory mapping
        #[arg(long)]
        mapped: bool,
    },

    /// Print header and usage figures of a store
    Stats {
        /// Store file
        path: PathBuf,

        /// Growth unit in bytes
        #[arg(short, long, default_value_t = FILE_SIZE_DEFAULT)]
        unit_size: u64,

        /// Size ceiling in growth units
        #[arg(short, long, default_value = "16")]
        max_units: u64,
    },

    /// Checksum a file
    Checksum {
        /// File to read
        path: PathBuf,

        /// Algorithm
        #[arg(short, long, value_enum, default_value = "crc64")]
        algo: Algo,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Algo {
    Crc32,
    Crc64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> strata::Result<()> {
    match command {
        Commands::Init {
            path,
            unit_size,
            max_units,
            record_size,
            mapped,
        } => {
            let mode = if mapped { BackingMode::Mapped } else { BackingMode::Plain };
            let config = StoreConfig::builder(path)
                .unit_size(unit_size)
                .max_units(max_units)
                .mode(mode)
                .build();

            let mut store = open_store(&config)?;
            let mut headers = HeaderManager::new(record_size);
            headers.write_header(store.as_mut())?;
            store.close()?;

            println!("initialized {}", config.path.display());
        }
        Commands::Stats {
            path,
            unit_size,
            max_units,
        } => {
            let config = StoreConfig::builder(path)
                .unit_size(unit_size)
                .max_units(max_units)
                .build();

            let mut store = open_store(&config)?;
            let mut headers = HeaderManager::new(0);
            headers.restore(store.as_mut())?;
            println!("{}", headers.stats(store.as_ref()));
            store.close()?;
        }
        Commands::Checksum { path, algo } => {
            let kind = match algo {
                Algo::Crc32 => ChecksumKind::Crc32,
                Algo::Crc64 => ChecksumKind::Crc64,
            };
            let data = std::fs::read(&path)?;
            let checker = checker(kind);
            let width = checker.width() as usize / 4;
            println!("{:0width$x}  {}", checker.checksum(&data), path.display(), width = width);
        }
    }

    Ok(())
}
