//! CLI entry point for tiling seamless images into large grids

use clap::Parser;
use seamtile::io::cli::{Cli, FileProcessor};

fn main() -> seamtile::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let mut processor = FileProcessor::new(cli);
    processor.process().map(drop)
}
