//! Configuration types for agent creation.

use std::{fs::File, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Hyperparameters shared by every agent the registry can build.
///
/// Each algorithm reads only the fields it uses. Missing fields fall back to
/// the defaults when loaded from JSON.
///
/// # Examples
///
/// ```
/// use reversi_agents::app::AgentConfig;
///
/// let config = AgentConfig::new()
///     .with_alpha(0.1)
///     .with_epsilon(0.05)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Step size α of the temporal-difference learners
    pub alpha: f64,
    /// Exploration rate ε of ε-greedy selection
    pub epsilon: f64,
    /// Discount γ of the online learners
    pub discount: f64,
    /// Trace decay λ of SARSA(λ)
    pub lambda: f64,
    /// Eligibility traces below this value are dropped
    pub trace_cutoff: f64,
    /// UCB1 exploration constant c of MCTS
    pub exploration: f64,
    /// MCTS simulations run per decision
    pub simulations_per_move: usize,
    /// Discount γ used by value iteration
    pub vi_discount: f64,
    /// Convergence threshold θ of value iteration
    pub vi_theta: f64,
    /// Upper bound on value-iteration sweeps
    pub vi_max_sweeps: usize,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self {
            alpha: 0.2,
            epsilon: 0.25,
            discount: 0.99,
            lambda: 0.5,
            trace_cutoff: 1e-6,
            exploration: 2.0,
            simulations_per_move: 1,
            vi_discount: 0.95,
            vi_theta: 1e-4,
            vi_max_sweeps: 10_000,
            seed: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_trace_cutoff(mut self, cutoff: f64) -> Self {
        self.trace_cutoff = cutoff;
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_simulations_per_move(mut self, simulations: usize) -> Self {
        self.simulations_per_move = simulations;
        self
    }

    /// Set value-iteration discount and convergence threshold.
    pub fn with_value_iteration(mut self, discount: f64, theta: f64) -> Self {
        self.vi_discount = discount;
        self.vi_theta = theta;
        self
    }

    pub fn with_vi_max_sweeps(mut self, sweeps: usize) -> Self {
        self.vi_max_sweeps = sweeps;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every field against its admissible range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("alpha", self.alpha),
            ("epsilon", self.epsilon),
            ("discount", self.discount),
            ("lambda", self.lambda),
            ("vi_discount", self.vi_discount),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }

        let positive = [
            ("trace_cutoff", self.trace_cutoff),
            ("vi_theta", self.vi_theta),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be positive, got {value}"),
                });
            }
        }

        if self.exploration.is_nan() || self.exploration < 0.0 {
            return Err(Error::InvalidConfiguration {
                message: format!("exploration must be non-negative, got {}", self.exploration),
            });
        }
        if self.simulations_per_move == 0 {
            return Err(Error::InvalidConfiguration {
                message: "simulations_per_move must be at least 1".to_string(),
            });
        }
        if self.vi_max_sweeps == 0 {
            return Err(Error::InvalidConfiguration {
                message: "vi_max_sweeps must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        let config: AgentConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.alpha, 0.2);
        assert_eq!(config.epsilon, 0.25);
        assert_eq!(config.discount, 0.99);
        assert_eq!(config.lambda, 0.5);
        assert_eq!(config.exploration, 2.0);
        assert_eq!(config.simulations_per_move, 1);
        assert_eq!(config.vi_discount, 0.95);
        assert_eq!(config.vi_theta, 1e-4);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = AgentConfig::new().with_epsilon(1.5);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(AgentConfig::new().with_simulations_per_move(0).validate().is_err());
        assert!(AgentConfig::new().with_value_iteration(0.9, 0.0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"alpha": 0.5, "seed": 7}"#).unwrap();
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.lambda, 0.5);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("agent.json");
        let config = AgentConfig::new().with_lambda(0.9).with_seed(3);

        config.save(&path).unwrap();
        assert_eq!(AgentConfig::load(&path).unwrap(), config);
    }
}
