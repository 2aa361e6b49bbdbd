//! Headless game loop and tournaments between two agents

pub mod observers;

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

pub use observers::ProgressObserver;

use crate::{
    Error, Result,
    environment::{Action, Environment, State},
    game::{GameOutcome, GameState, Player},
    ports::{Agent, KnowledgeRepository, Observer, Transition},
};

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Number of games to play
    pub games: usize,

    /// Seed for both agents (the second gets `seed + 1`)
    pub seed: Option<u64>,

    /// Whether the first player learns during the tournament
    pub learn_first: bool,

    /// Whether the second player learns during the tournament
    pub learn_second: bool,

    /// Save learning agents' knowledge every this many games
    pub checkpoint_interval: Option<usize>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            games: 1000,
            seed: None,
            learn_first: true,
            learn_second: true,
            checkpoint_interval: None,
        }
    }
}

/// Outcome of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub outcome: GameOutcome,
    /// Moves played by both sides
    pub moves: usize,
}

/// Result of a tournament, counted per registered player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub games: usize,
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
    pub first_win_rate: f64,
    pub second_win_rate: f64,
    pub draw_rate: f64,
}

impl TournamentResult {
    pub fn new(first_wins: usize, second_wins: usize, draws: usize) -> Self {
        let games = first_wins + second_wins + draws;
        let rate = |n: usize| {
            if games > 0 {
                n as f64 / games as f64
            } else {
                0.0
            }
        };
        Self {
            games,
            first_wins,
            second_wins,
            draws,
            first_win_rate: rate(first_wins),
            second_win_rate: rate(second_wins),
            draw_rate: rate(draws),
        }
    }

    /// `[first wins, second wins, draws]`
    pub fn histogram(&self) -> [usize; 3] {
        [self.first_wins, self.second_wins, self.draws]
    }

    /// Save result to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        Ok(serde_json::from_reader(file)?)
    }
}

fn slot(side: Player) -> usize {
    match side {
        Player::Black => 0,
        Player::White => 1,
    }
}

/// Play one game to the end. Black moves first.
///
/// Each learning agent receives one transition per own move: from the state
/// it acted in to the next state in which it is to move, or to the final
/// board seen from its side once the game is over.
pub fn play_game(
    env: &Environment,
    black: &mut dyn Agent,
    white: &mut dyn Agent,
    game_num: usize,
    observers: &mut [Box<dyn Observer>],
) -> Result<GameRecord> {
    let mut players: [&mut dyn Agent; 2] = [black, white];
    let mut pending: [Option<(State, Action)>; 2] = [None, None];

    for player in players.iter_mut() {
        player.before_gameplay();
    }
    for observer in observers.iter_mut() {
        observer.on_game_start(game_num)?;
    }

    let mut state = GameState::initial(env.size());
    let mut moves = 0;
    while !state.is_finished() {
        let side = slot(state.turn());
        let agent = &mut *players[side];
        let current = Environment::state_of(&state);

        if let Some((previous, action)) = pending[side].take()
            && agent.is_learning()
        {
            let reward = env.reward(previous, action, current)?;
            agent.update(
                env,
                &Transition {
                    state: previous,
                    action,
                    reward,
                    next_state: current,
                },
            )?;
        }

        let action = agent.select_action(env, current)?;
        state.make_move(env.position_of(action)?)?;
        pending[side] = Some((current, action));
        moves += 1;
    }

    for side in [Player::Black, Player::White] {
        let agent = &mut *players[slot(side)];
        if let Some((previous, action)) = pending[slot(side)].take()
            && agent.is_learning()
        {
            let terminal = state.board().relative_view(side).encode();
            let reward = env.reward(previous, action, terminal)?;
            agent.update(
                env,
                &Transition {
                    state: previous,
                    action,
                    reward,
                    next_state: terminal,
                },
            )?;
        }
        agent.after_gameplay();
    }

    let outcome = state.winner().unwrap_or(GameOutcome::Draw);
    Ok(GameRecord { outcome, moves })
}

/// Series of games between two agents that alternate colours, the first
/// player taking Black in even-numbered games.
pub struct Tournament {
    config: TournamentConfig,
    observers: Vec<Box<dyn Observer>>,
    repository: Option<Arc<dyn KnowledgeRepository + Send + Sync>>,
}

impl Tournament {
    pub fn new(config: TournamentConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            repository: None,
        }
    }

    /// Add an observer to the tournament
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Repository receiving periodic checkpoints
    pub fn with_repository(
        mut self,
        repository: Arc<dyn KnowledgeRepository + Send + Sync>,
    ) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn run(
        &mut self,
        env: &Environment,
        first: &mut dyn Agent,
        second: &mut dyn Agent,
    ) -> Result<TournamentResult> {
        if let Some(seed) = self.config.seed {
            first.set_rng_seed(seed);
            second.set_rng_seed(seed.wrapping_add(1));
        }
        first.set_learning(self.config.learn_first);
        second.set_learning(self.config.learn_second);
        first.initialize(env)?;
        second.initialize(env)?;

        for observer in &mut self.observers {
            observer.on_tournament_start(self.config.games)?;
        }

        let (mut first_wins, mut second_wins, mut draws) = (0, 0, 0);
        for game_num in 0..self.config.games {
            let first_is_black = game_num % 2 == 0;
            let record = if first_is_black {
                play_game(env, first, second, game_num, &mut self.observers)?
            } else {
                play_game(env, second, first, game_num, &mut self.observers)?
            };

            let first_side = if first_is_black {
                Player::Black
            } else {
                Player::White
            };
            match record.outcome {
                GameOutcome::Win(side) if side == first_side => first_wins += 1,
                GameOutcome::Win(_) => second_wins += 1,
                GameOutcome::Draw => draws += 1,
            }

            for observer in &mut self.observers {
                observer.on_game_end(game_num, record.outcome, !first_is_black)?;
            }

            if let Some(interval) = self.config.checkpoint_interval
                && interval > 0
                && (game_num + 1).is_multiple_of(interval)
            {
                self.checkpoint(env, game_num + 1, &[&*first, &*second])?;
            }
        }

        for observer in &mut self.observers {
            observer.on_tournament_end()?;
        }

        let result = TournamentResult::new(first_wins, second_wins, draws);
        tracing::info!(
            games = result.games,
            first_wins,
            second_wins,
            draws,
            "tournament finished"
        );
        Ok(result)
    }

    fn checkpoint(&self, env: &Environment, games: usize, agents: &[&dyn Agent]) -> Result<()> {
        let Some(repository) = &self.repository else {
            return Ok(());
        };
        for agent in agents.iter().filter(|a| a.is_learning()) {
            if let Some(blob) = agent.data_to_save()? {
                repository.save(env.size(), agent.name(), &blob)?;
                tracing::info!(
                    agent = agent.name(),
                    games,
                    bytes = blob.len(),
                    "checkpoint saved"
                );
            }
        }
        Ok(())
    }
}
