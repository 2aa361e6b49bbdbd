//! Reversi engine and learning agents
//!
//! This crate provides:
//! - A Reversi board engine for any even board size up to 64 cells, with a
//!   bijective integer encoding of every position
//! - An MDP view of the game that folds a move and the opponent's reply into
//!   one stochastic transition, served live or from a prepared table
//! - Tabular and approximate learning agents: value iteration, SARSA,
//!   expected SARSA, SARSA(λ), Q-learning, double Q-learning, MCTS and a
//!   linear value approximator
//! - Knowledge persistence, a headless tournament driver and a CLI

pub mod adapters;
pub mod agents;
pub mod app;
pub mod backend;
pub mod cli;
pub mod environment;
pub mod error;
pub mod game;
pub mod gameplay;
pub mod ports;

pub use error::{Error, Result};
