//! CLI infrastructure for the reversi agents
//!
//! Commands prepare transition tables, run tournaments between registered
//! agents and list what the registry offers.

pub mod commands;
pub mod output;
