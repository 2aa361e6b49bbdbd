//! Tournaments, knowledge persistence and the agent registry

use std::path::Path;

use reversi_agents::{
    Error,
    adapters::MsgPackRepository,
    agents::{QLearningAgent, RandomAgent},
    app::{AgentConfig, AgentRegistry, App, AppBuilder},
    backend::{LiveBackend, PreparedBackend},
    environment::Environment,
    game::BoardSize,
    gameplay::{Tournament, TournamentConfig, TournamentResult},
    ports::{Agent, KnowledgeRepository},
};
use tempfile::TempDir;

fn four() -> BoardSize {
    BoardSize::square(4).unwrap()
}

fn random_histogram(env: &Environment, seed: u64) -> [usize; 3] {
    let config = TournamentConfig {
        games: 1000,
        seed: Some(seed),
        ..TournamentConfig::default()
    };
    let mut first = RandomAgent::new();
    let mut second = RandomAgent::new();
    Tournament::new(config)
        .run(env, &mut first, &mut second)
        .unwrap()
        .histogram()
}

fn app_in(dir: &Path) -> App {
    AppBuilder::new()
        .with_repository(MsgPackRepository::new(dir))
        .build()
}

#[test]
fn test_seeded_random_tournament_is_reproducible() {
    let env = Environment::new(Box::new(LiveBackend::new(four())));
    let histogram = random_histogram(&env, 1234);

    assert_eq!(histogram.iter().sum::<usize>(), 1000);
    assert_eq!(random_histogram(&env, 1234), histogram);
}

#[test]
fn test_backends_give_the_same_seeded_tournament() {
    let dir = TempDir::new().unwrap();
    let live = Environment::new(Box::new(LiveBackend::new(four())));
    let prepared = Environment::new(Box::new(
        PreparedBackend::open(four(), &dir.path().join("4x4.msgpack")).unwrap(),
    ));

    assert_eq!(random_histogram(&live, 99), random_histogram(&prepared, 99));
}

#[test]
fn test_result_export_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results").join("run.json");

    let result = TournamentResult::new(6, 3, 1);
    result.save(&path).unwrap();
    let loaded = TournamentResult::load(&path).unwrap();
    assert_eq!(loaded, result);
    assert_eq!(loaded.games, 10);
    assert!((loaded.first_win_rate - 0.6).abs() < 1e-12);
}

#[test]
fn test_learned_knowledge_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let env = Environment::new(Box::new(LiveBackend::new(four())));

    let app = app_in(dir.path());
    let mut learner = app
        .create_agent(QLearningAgent::NAME, AgentConfig::default().with_seed(8))
        .unwrap();
    let mut opponent = RandomAgent::new();
    let config = TournamentConfig {
        games: 50,
        seed: Some(8),
        learn_second: false,
        ..TournamentConfig::default()
    };
    Tournament::new(config)
        .run(&env, learner.as_mut(), &mut opponent)
        .unwrap();
    assert!(app.save_knowledge(learner.as_ref(), four()).unwrap());

    let restarted = app_in(dir.path());
    let mut reloaded = restarted
        .create_agent(QLearningAgent::NAME, AgentConfig::default())
        .unwrap();
    assert!(restarted.load_knowledge(reloaded.as_mut(), four()).unwrap());

    let before = learner.as_any().downcast_ref::<QLearningAgent>().unwrap();
    let after = reloaded.as_any().downcast_ref::<QLearningAgent>().unwrap();
    assert!(!before.q_table().is_empty());
    assert_eq!(before.q_table(), after.q_table());

    // Knowledge is stored per board size.
    let mut other_size = restarted
        .create_agent(QLearningAgent::NAME, AgentConfig::default())
        .unwrap();
    assert!(
        !restarted
            .load_knowledge(other_size.as_mut(), BoardSize::square(6).unwrap())
            .unwrap()
    );
}

#[test]
fn test_every_builtin_agent_plays_and_persists() {
    let dir = TempDir::new().unwrap();
    let env = Environment::new(Box::new(LiveBackend::new(four())));
    let app = app_in(dir.path());
    let repository = MsgPackRepository::new(dir.path());

    let names: Vec<String> = app.registry().names().map(str::to_string).collect();
    for name in &names {
        let mut agent = app
            .create_agent(name, AgentConfig::default().with_seed(1))
            .unwrap();
        let mut opponent = RandomAgent::new();
        let config = TournamentConfig {
            games: 4,
            seed: Some(2),
            ..TournamentConfig::default()
        };
        let result = Tournament::new(config)
            .run(&env, agent.as_mut(), &mut opponent)
            .unwrap();
        assert_eq!(result.games, 4, "{name}");

        let saved = app.save_knowledge(agent.as_ref(), four()).unwrap();
        assert_eq!(saved, repository.load(four(), name).unwrap().is_some(), "{name}");
        if saved {
            let mut fresh = app.create_agent(name, AgentConfig::default()).unwrap();
            assert!(app.load_knowledge(fresh.as_mut(), four()).unwrap(), "{name}");
            assert_eq!(
                fresh.data_to_save().unwrap().map(|b| b.len()),
                agent.data_to_save().unwrap().map(|b| b.len()),
                "{name}"
            );
        }
    }
}

#[test]
fn test_registry_rejects_duplicates_and_unknown_names() {
    fn make_random(_config: &AgentConfig) -> Box<dyn Agent> {
        Box::new(RandomAgent::new())
    }

    let mut registry = AgentRegistry::builtin();
    assert!(matches!(
        registry.register(RandomAgent::NAME, make_random),
        Err(Error::DuplicateAgent { .. })
    ));
    registry.register("coin_flip", make_random).unwrap();
    assert!(registry.contains("coin_flip"));

    match registry.create("minimax", &AgentConfig::default()) {
        Err(Error::UnknownAgent { name, expected }) => {
            assert_eq!(name, "minimax");
            assert!(expected.contains("coin_flip"));
        }
        other => panic!("expected UnknownAgent, got {:?}", other.map(|a| a.name().to_string())),
    }
}
