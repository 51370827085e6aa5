//! flatgz CLI - gzip compression on a from-scratch DEFLATE codec.

mod commands;
mod logger;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{BlockTypeArg, cmd_compress, cmd_decompress, cmd_info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flatgz")]
#[command(author, version, about = "Pure Rust gzip with package-merge Huffman codes")]
#[command(long_about = "
flatgz compresses to and decompresses from the gzip format.
Every block of a file uses the same block type: stored, fixed or dynamic Huffman.

Examples:
  flatgz compress notes.txt
  flatgz compress -b dynamic notes.txt -o notes.txt.gz
  cat notes.txt | flatgz compress > notes.txt.gz
  flatgz decompress --verify notes.txt.gz
  flatgz info --json notes.txt.gz
")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file (or stdin) to gzip
    #[command(alias = "c")]
    Compress {
        /// Input file (stdin if omitted)
        input: Option<PathBuf>,

        /// Output file (INPUT.gz, or stdout when reading stdin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write to stdout
        #[arg(short = 'c', long, conflicts_with = "output")]
        stdout: bool,

        /// DEFLATE block type
        #[arg(short, long, value_enum, default_value = "fixed")]
        block_type: BlockTypeArg,

        /// Positions remembered per match-finder bucket
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
        chain_length: u32,

        /// Write a zero trailer checksum instead of CRC-32
        #[arg(long)]
        zero_checksum: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decompress a gzip file (or stdin)
    #[command(alias = "d")]
    Decompress {
        /// Input file (stdin if omitted)
        input: Option<PathBuf>,

        /// Output file (INPUT without .gz, or stdout when reading stdin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write to stdout
        #[arg(short = 'c', long, conflicts_with = "output")]
        stdout: bool,

        /// Fail if the trailer checksum or size does not match
        #[arg(long)]
        verify: bool,
    },

    /// Show header and trailer information for a gzip file
    #[command(alias = "i")]
    Info {
        /// Gzip file to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            stdout,
            block_type,
            chain_length,
            zero_checksum,
            progress,
        } => cmd_compress(
            input.as_deref(),
            output.as_deref(),
            stdout,
            block_type,
            chain_length as usize,
            zero_checksum,
            progress,
        ),
        Commands::Decompress {
            input,
            output,
            stdout,
            verify,
        } => cmd_decompress(input.as_deref(), output.as_deref(), stdout, verify),
        Commands::Info { input, json } => cmd_info(&input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
