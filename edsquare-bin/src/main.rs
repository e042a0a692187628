mod errors;
mod handlers;
mod utils;

use clap::{Parser, Subcommand};
use edsquare_lib::consts;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edsquare", version, about, long_about = None)]
struct EdsquareCLI {
    #[command(subcommand)]
    command: EdsquareCommand,
}

#[derive(Subcommand)]
enum EdsquareCommand {
    /// Lays out given data blob as a square of chunks and extends it with Reed-Solomon code, along both dimensions
    Break {
        /// Path of source data blob
        #[arg(short)]
        blob_path: PathBuf,
        /// Optional target directory to put extended data square cells
        #[arg(short)]
        opt_target_dir: Option<PathBuf>,
        /// Erasure code to extend the square with
        #[arg(short, default_value = consts::LEOPARD)]
        codec: String,
        /// Byte length of each chunk of the square
        #[arg(short = 's', default_value_t = 512)]
        chunk_size: usize,
    },
    /// Checks present rows and columns of an extended data square against their committed roots
    Verify {
        /// Directory path to extended data square cells
        square_dir_path: PathBuf,
    },
    /// Reconstructs original data blob from the cells of an extended data square present on disk
    Repair {
        /// Directory path to extended data square cells
        #[arg(short)]
        cell_dir_path: PathBuf,
        /// Optional target directory to put repaired blob
        #[arg(short)]
        opt_target_dir: Option<PathBuf>,
    },
}

fn main() {
    // Logs go to stderr, stdout stays a report for the user.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = EdsquareCLI::parse();
    match &cli.command {
        EdsquareCommand::Break {
            blob_path,
            opt_target_dir,
            codec,
            chunk_size,
        } => handlers::handle_break_command(blob_path, opt_target_dir, codec, *chunk_size),
        EdsquareCommand::Verify { square_dir_path } => handlers::handle_verify_command(square_dir_path),
        EdsquareCommand::Repair {
            cell_dir_path,
            opt_target_dir,
        } => handlers::handle_repair_command(cell_dir_path, opt_target_dir),
    }
}
