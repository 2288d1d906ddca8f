use anyhow::Result;
use clap::Parser;
use frost_risk::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(&cli)
}
