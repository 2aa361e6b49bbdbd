//! Agents command - list the registered agents

use anyhow::Result;
use clap::Parser;

use crate::{app::AgentRegistry, cli::output::print_section};

#[derive(Parser, Debug)]
#[command(about = "List the available agents")]
pub struct AgentsArgs {}

pub fn execute(_args: AgentsArgs, registry: &AgentRegistry) -> Result<()> {
    print_section("Available agents");
    for name in registry.names() {
        println!("  {name}");
    }
    Ok(())
}
