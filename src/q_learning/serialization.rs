//! Serialization support for trained Q-learning results.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    gridworld::Environment,
    q_learning::{config::QLearningConfig, q_table::QTable, solver::QLearningReport},
    types::Policy,
};

/// A trained Q-table together with the world and settings that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQLearning {
    pub version: u32,
    pub environment: Environment,
    pub config: QLearningConfig,
    pub seed: Option<u64>,
    pub total_steps: usize,
    pub final_epsilon: f64,
    pub q_table: QTable,
    pub policy: Policy,
}

impl SavedQLearning {
    pub const VERSION: u32 = 1;

    pub fn from_report(
        environment: &Environment,
        config: QLearningConfig,
        seed: Option<u64>,
        report: &QLearningReport,
    ) -> Self {
        Self {
            version: Self::VERSION,
            environment: environment.clone(),
            config,
            seed,
            total_steps: report.total_steps,
            final_epsilon: report.final_epsilon,
            q_table: report.q_table.clone(),
            policy: report.policy.clone(),
        }
    }

    /// Reject other format versions and tables that do not fit the saved world
    fn check(self) -> Result<Self> {
        if self.version != Self::VERSION {
            return Err(anyhow!(
                "Unsupported Q-learning save format version: {}. Expected {}",
                self.version,
                Self::VERSION
            ));
        }
        let num_states = self.environment.num_states();
        if self.q_table.num_states() != num_states {
            return Err(anyhow!(
                "Saved Q-table covers {} states but the grid has {}",
                self.q_table.num_states(),
                num_states
            ));
        }
        if self.policy.len() != num_states {
            return Err(anyhow!(
                "Saved policy covers {} states but the grid has {}",
                self.policy.len(),
                num_states
            ));
        }
        self.config
            .validate()
            .context("Saved Q-learning configuration is invalid")?;
        Ok(self)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).context("Failed to serialize Q-learning result")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let saved: Self =
            rmp_serde::from_slice(bytes).context("Failed to deserialize Q-learning result")?;
        saved.check()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create file: {}", path.as_ref().display()))?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, self)
            .context("Failed to serialize Q-learning result")?;
        writer
            .flush()
            .with_context(|| format!("Failed to write file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open file: {}", path.as_ref().display()))?;
        let reader = BufReader::new(file);

        let saved: Self = rmp_serde::decode::from_read(reader)
            .context("Failed to deserialize Q-learning result")?;
        saved.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gridworld::{Action, State},
        pipeline::NoopObserver,
        q_learning::QLearningSolver,
    };

    fn trained() -> Result<SavedQLearning> {
        let env = Environment::new("001".parse()?)?;
        let config = QLearningConfig::new(0.9, 0.1, 50);
        let mut solver = QLearningSolver::seeded(&env, config, 7)?;
        let report = solver.train(&mut NoopObserver)?;
        Ok(SavedQLearning::from_report(&env, config, Some(7), &report))
    }

    #[test]
    fn test_roundtrip_preserves_tables() -> Result<()> {
        let saved = trained()?;
        let loaded = SavedQLearning::from_bytes(&saved.to_bytes()?)?;

        assert_eq!(loaded.q_table, saved.q_table);
        assert_eq!(loaded.policy, saved.policy);
        assert_eq!(loaded.environment, saved.environment);
        assert_eq!(loaded.seed, Some(7));
        assert_eq!(
            loaded.q_table.get(State::new(0), Action::Right),
            saved.q_table.get(State::new(0), Action::Right)
        );
        Ok(())
    }

    #[test]
    fn test_version_mismatch_rejected() -> Result<()> {
        let mut saved = trained()?;
        saved.version = 99;
        let bytes = rmp_serde::to_vec(&saved)?;
        assert!(SavedQLearning::from_bytes(&bytes).is_err());
        Ok(())
    }

    #[test]
    fn test_corrupted_grid_rejected() -> Result<()> {
        let mut value = serde_json::to_value(trained()?)?;
        value["environment"]["grid"]["rows"] = serde_json::json!(5);
        let bytes = rmp_serde::to_vec(&value)?;
        assert!(SavedQLearning::from_bytes(&bytes).is_err());
        Ok(())
    }

    #[test]
    fn test_table_size_mismatch_rejected() -> Result<()> {
        let mut value = serde_json::to_value(trained()?)?;
        value["policy"]
            .as_array_mut()
            .ok_or_else(|| anyhow!("policy is not an array"))?
            .pop();
        assert!(SavedQLearning::from_bytes(&rmp_serde::to_vec(&value)?).is_err());

        let mut value = serde_json::to_value(trained()?)?;
        value["q_table"]["values"]
            .as_array_mut()
            .ok_or_else(|| anyhow!("q-table values are not an array"))?
            .push(serde_json::json!([0.0, 0.0, 0.0, 0.0]));
        value["q_table"]["visits"]
            .as_array_mut()
            .ok_or_else(|| anyhow!("q-table visits are not an array"))?
            .push(serde_json::json!([0, 0, 0, 0]));
        assert!(SavedQLearning::from_bytes(&rmp_serde::to_vec(&value)?).is_err());
        Ok(())
    }

    #[test]
    fn test_file_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("q.msgpack");
        let saved = trained()?;
        saved.save_to_file(&path)?;
        let loaded = SavedQLearning::load_from_file(&path)?;
        assert_eq!(loaded.total_steps, saved.total_steps);
        Ok(())
    }
}
