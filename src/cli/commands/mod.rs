//! CLI subcommands

pub mod agents;
pub mod play;
pub mod prepare;

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::{
    backend::{BackendMode, create_backend},
    environment::Environment,
    game::BoardSize,
};

/// Where game dynamics come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Compute moves with the board engine on demand
    Live,
    /// Serve moves from a prepared transition table
    Prepared,
}

/// Board and backend selection shared by commands that build an environment
#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    /// Board size, `N` or `RxC` (even dimensions, at most 64 cells)
    #[arg(long, short = 's', default_value = "4")]
    pub size: BoardSize,

    /// Backend serving the game dynamics
    #[arg(long, value_enum, default_value_t = BackendKind::Live)]
    pub backend: BackendKind,

    /// Transition table file for the prepared backend
    /// (defaults to `tables/<size>.msgpack`)
    #[arg(long)]
    pub table: Option<PathBuf>,
}

impl BoardArgs {
    pub fn table_path(&self) -> PathBuf {
        self.table
            .clone()
            .unwrap_or_else(|| default_table_path(self.size))
    }

    pub fn backend_mode(&self) -> BackendMode {
        match self.backend {
            BackendKind::Live => BackendMode::Live,
            BackendKind::Prepared => BackendMode::Prepared {
                path: self.table_path(),
            },
        }
    }

    pub fn environment(&self) -> crate::Result<Environment> {
        let backend = create_backend(self.size, &self.backend_mode())?;
        Ok(Environment::new(backend))
    }
}

/// `tables/<rows>x<cols>.msgpack`
pub fn default_table_path(size: BoardSize) -> PathBuf {
    PathBuf::from("tables").join(format!("{size}.msgpack"))
}
