//! End-to-end behaviour of the learning agents on small boards

use reversi_agents::{
    agents::{MctsAgent, RandomAgent, SarsaLambdaAgent, TdParams, ValueIterationAgent},
    backend::LiveBackend,
    environment::Environment,
    game::{BoardSize, GameState},
    gameplay::{Tournament, TournamentConfig, play_game},
    ports::Agent,
};

fn live_env(side: usize) -> Environment {
    Environment::new(Box::new(LiveBackend::new(BoardSize::square(side).unwrap())))
}

#[test]
fn test_value_iteration_converges_on_4x4() {
    let env = live_env(4);
    let mut agent = ValueIterationAgent::new(0.95, 1e-4, 10_000);
    agent.initialize(&env).unwrap();

    let report = *agent.report().unwrap();
    assert!(report.converged);
    assert!(report.final_delta < 1e-4);
    assert_eq!(report.states, env.all_states().unwrap().len());

    // Every non-terminal state has a legal planned action.
    let policy = agent.policy().unwrap();
    for &state in env.all_states().unwrap() {
        let actions = env.possible_actions(state).unwrap();
        match policy.get(&state) {
            Some(action) => assert!(actions.contains(action)),
            None => assert!(actions.is_empty()),
        }
    }
}

#[test]
fn test_value_iteration_self_play_terminates() {
    let env = live_env(4);
    let mut black = ValueIterationAgent::new(0.95, 1e-4, 10_000);
    black.initialize(&env).unwrap();
    let mut white = black.clone();

    let record = play_game(&env, &mut black, &mut white, 0, &mut []).unwrap();
    assert!(record.moves > 0);
    assert!(record.moves <= 12);

    // A deterministic policy on both sides replays the same game.
    let again = play_game(&env, &mut black, &mut white, 1, &mut []).unwrap();
    assert_eq!(again.moves, record.moves);
    assert_eq!(again.outcome, record.outcome);
}

#[test]
fn test_value_iteration_beats_random_play() {
    let env = live_env(4);
    let mut planner = ValueIterationAgent::new(0.95, 1e-4, 10_000);
    let mut random = RandomAgent::new();

    let config = TournamentConfig {
        games: 200,
        seed: Some(11),
        learn_first: false,
        learn_second: false,
        ..TournamentConfig::default()
    };
    let result = Tournament::new(config)
        .run(&env, &mut planner, &mut random)
        .unwrap();
    assert_eq!(result.games, 200);
    assert!(
        result.first_wins > result.second_wins,
        "value iteration won {} of 200",
        result.first_wins
    );
}

#[test]
fn test_sarsa_lambda_traces_reset_between_games() {
    let env = live_env(4);
    let mut learner = SarsaLambdaAgent::new(TdParams::new(0.2, 0.25, 0.99), 0.5, 1e-6);
    learner.set_rng_seed(5);
    let mut opponent = RandomAgent::new().with_seed(6);

    play_game(&env, &mut learner, &mut opponent, 0, &mut []).unwrap();
    assert!(learner.active_traces() > 0);
    assert!(!learner.q_table().is_empty());

    learner.before_gameplay();
    assert_eq!(learner.active_traces(), 0);
    assert!(learner.planned_action().is_none());

    // Traces still start empty after the learner switched colours.
    play_game(&env, &mut opponent, &mut learner, 1, &mut []).unwrap();
    learner.before_gameplay();
    assert_eq!(learner.active_traces(), 0);
}

#[test]
fn test_mcts_root_statistics_after_simulations() {
    let env = live_env(4);
    let root = GameState::initial(env.size());
    let state = Environment::state_of(&root);

    let mut agent = MctsAgent::new(2.0, 200);
    agent.set_rng_seed(3);
    let action = agent.select_action(&env, state).unwrap();
    assert!(env.possible_actions(state).unwrap().contains(&action));

    let stats = agent.stats(env.game_state(state).unwrap().key());
    assert_eq!(stats.visits, 200);
    assert!((-1.0..=1.0).contains(&stats.average()));
    assert!(agent.node_count() > 1);
}

#[test]
fn test_mcts_plays_full_games_on_6x6() {
    let env = live_env(6);
    let mut mcts = MctsAgent::new(2.0, 5);
    let mut random = RandomAgent::new();

    let config = TournamentConfig {
        games: 4,
        seed: Some(21),
        ..TournamentConfig::default()
    };
    let result = Tournament::new(config)
        .run(&env, &mut mcts, &mut random)
        .unwrap();
    assert_eq!(result.first_wins + result.second_wins + result.draws, 4);
    assert!(mcts.node_count() > 0);
}
