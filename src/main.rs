//! Syncwalk CLI: softlinks, walk and dropbox commands over large directory trees.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use syncwalk::engine::{Cli, handle_run};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
