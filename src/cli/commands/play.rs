//! Play command - run a tournament between two registered agents

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::BoardArgs;
use crate::{
    adapters::MsgPackRepository,
    app::{AgentConfig, App, AppBuilder, DEFAULT_KNOWLEDGE_DIR},
    cli::output::{format_share, print_kv, print_section},
    game::BoardSize,
    gameplay::{ProgressObserver, Tournament, TournamentConfig},
    ports::Agent,
};

#[derive(Parser, Debug)]
#[command(about = "Play a series of games between two agents")]
pub struct PlayArgs {
    /// First agent (Black in even-numbered games)
    pub first: String,

    /// Second agent
    pub second: String,

    #[command(flatten)]
    pub board: BoardArgs,

    /// Number of games
    #[arg(long, short = 'g', default_value_t = 1000)]
    pub games: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON file with agent hyperparameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding saved agent knowledge
    #[arg(long, default_value = DEFAULT_KNOWLEDGE_DIR)]
    pub knowledge_dir: PathBuf,

    /// Start from scratch instead of loading saved knowledge
    #[arg(long)]
    pub fresh: bool,

    /// Freeze the first agent
    #[arg(long)]
    pub no_learn_first: bool,

    /// Freeze the second agent
    #[arg(long)]
    pub no_learn_second: bool,

    /// Save learning agents' knowledge every N games
    #[arg(long)]
    pub checkpoint_interval: Option<usize>,

    /// Do not save knowledge at the end
    #[arg(long)]
    pub no_save: bool,

    /// Write the tournament result as JSON
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let size = args.board.size;
    let agent_config = match &args.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("failed to load agent config {}", path.display()))?,
        None => AgentConfig::default(),
    };

    let app = AppBuilder::new()
        .with_repository(MsgPackRepository::new(&args.knowledge_dir))
        .build();
    let env = args
        .board
        .environment()
        .context("failed to create the game backend")?;
    tracing::info!(%size, backend = env.backend().name(), "environment ready");

    let mut first = app.create_agent(&args.first, agent_config.clone())?;
    let mut second = app.create_agent(&args.second, agent_config)?;
    if !args.fresh {
        for agent in [first.as_mut(), second.as_mut()] {
            app.load_knowledge(&mut *agent, size)
                .with_context(|| format!("failed to load knowledge of '{}'", agent.name()))?;
        }
    }

    let config = TournamentConfig {
        games: args.games,
        seed: args.seed,
        learn_first: !args.no_learn_first,
        learn_second: !args.no_learn_second,
        checkpoint_interval: args.checkpoint_interval,
    };
    let mut tournament = Tournament::new(config);
    if !args.quiet {
        tournament = tournament.with_observer(Box::new(ProgressObserver::new()));
    }
    if !args.no_save {
        tournament = tournament.with_repository(app.repository());
    }

    print_section(&format!(
        "{} vs {} on {} ({} games)",
        args.first, args.second, size, args.games
    ));
    let result = tournament.run(&env, first.as_mut(), second.as_mut())?;

    print_section("Results");
    print_kv(&args.first, &format_share(result.first_wins, result.games));
    print_kv(&args.second, &format_share(result.second_wins, result.games));
    print_kv("Draws", &format_share(result.draws, result.games));

    if !args.no_save {
        save_knowledge(&app, [first.as_ref(), second.as_ref()], size)?;
    }

    if let Some(path) = &args.export {
        result
            .save(path)
            .with_context(|| format!("failed to export results to {}", path.display()))?;
        println!("\nResults exported to: {}", path.display());
    }
    Ok(())
}

/// Save whatever knowledge each agent holds, including planned policies
fn save_knowledge(app: &App, agents: [&dyn Agent; 2], size: BoardSize) -> Result<()> {
    for agent in agents {
        if app.save_knowledge(agent, size)? {
            println!("Saved knowledge of '{}'", agent.name());
        }
    }
    Ok(())
}
