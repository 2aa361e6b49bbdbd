//! Prepare command - enumerate a board size and persist its transition table

use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;

use super::default_table_path;
use crate::{
    backend::PreparedBackend,
    cli::output::{create_spinner, format_number, print_kv, print_section},
    game::BoardSize,
};

#[derive(Parser, Debug)]
#[command(about = "Build the transition table for a board size")]
pub struct PrepareArgs {
    /// Board size, `N` or `RxC`
    #[arg(long, short = 's', default_value = "4")]
    pub size: BoardSize,

    /// Output file (defaults to `tables/<size>.msgpack`)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Rebuild even if the file already exists
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: PrepareArgs) -> Result<()> {
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_table_path(args.size));

    if args.force && path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove existing table {}", path.display()))?;
    }

    let spinner = create_spinner(&format!("Preparing {} transition table...", args.size));
    let started = Instant::now();
    let backend = PreparedBackend::open(args.size, &path)
        .with_context(|| format!("failed to prepare table at {}", path.display()))?;
    spinner.finish_and_clear();

    let table = backend.table();
    let terminals = table.terminals();
    print_section(&format!("Transition table {}", args.size));
    print_kv("File", &path.display().to_string());
    print_kv("States", &format_number(table.len()));
    print_kv("Terminal boards", &format_number(terminals.len()));
    print_kv("  won by ME", &format_number(terminals.wins.len()));
    print_kv("  lost by ME", &format_number(terminals.losses.len()));
    print_kv("  drawn", &format_number(terminals.draws.len()));
    print_kv("Elapsed", &format!("{:.2?}", started.elapsed()));
    Ok(())
}
