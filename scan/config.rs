// ========================================================================================
//                                 Sweep configuration
// ========================================================================================

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// How a forked branch of a sweep is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkMode {
    /// Hand the forked branch to the rayon pool with `rayon::join`.
    #[default]
    Pool,
    /// Run the forked branch on a freshly spawned scoped OS thread.
    Spawn,
}

/// Tuning for both sweeps.
///
/// `fork_depth` is the fan-out threshold D: nodes at recursion depth `< D` fork one
/// child as a concurrent task, deeper nodes recurse sequentially. At most `2^D`
/// branches are ever active at once, and `D = 0` is a fully sequential run. The
/// result never depends on either field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub fork_depth: usize,
    pub fork_mode: ForkMode,
}

/// Errors from reading or writing a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML config file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config to TOML format: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// ceil(log2(cores)): the smallest depth whose 2^D branches cover every logical core.
/// A single-core machine gets 0 and runs sequentially.
pub fn default_fork_depth() -> usize {
    depth_for_cores(num_cpus::get())
}

fn depth_for_cores(cores: usize) -> usize {
    cores.max(1).next_power_of_two().trailing_zeros() as usize
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fork_depth: default_fork_depth(),
            fork_mode: ForkMode::default(),
        }
    }
}

impl ScanConfig {
    /// A configuration that never forks.
    pub fn sequential() -> Self {
        Self {
            fork_depth: 0,
            fork_mode: ForkMode::default(),
        }
    }

    pub fn with_fork_depth(mut self, fork_depth: usize) -> Self {
        self.fork_depth = fork_depth;
        self
    }

    pub fn with_fork_mode(mut self, fork_mode: ForkMode) -> Self {
        self.fork_mode = fork_mode;
        self
    }

    /// Loads a configuration from a TOML file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config = toml::from_str(&toml_string)?;
        Ok(config)
    }

    /// Saves the configuration as human-readable TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ScanConfig = toml::from_str("fork_depth = 3").unwrap();
        assert_eq!(config.fork_depth, 3);
        assert_eq!(config.fork_mode, ForkMode::Pool);

        let config: ScanConfig = toml::from_str("fork_mode = \"spawn\"").unwrap();
        assert_eq!(config.fork_mode, ForkMode::Spawn);
        assert_eq!(config.fork_depth, default_fork_depth());
    }

    #[test]
    fn default_depth_covers_cores_without_oversubscribing() {
        assert_eq!(depth_for_cores(0), 0);
        assert_eq!(depth_for_cores(1), 0);
        assert_eq!(depth_for_cores(2), 1);
        assert_eq!(depth_for_cores(6), 3);
        assert_eq!(depth_for_cores(8), 3);
        assert_eq!(depth_for_cores(32), 5);

        let cores = num_cpus::get();
        let branches = 1usize << default_fork_depth();
        assert!(branches >= cores && branches < 2 * cores.max(1));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(toml::from_str::<ScanConfig>("fork_mode = \"fibers\"").is_err());
    }

    #[test]
    fn builders_set_fields() {
        let config = ScanConfig::sequential()
            .with_fork_depth(5)
            .with_fork_mode(ForkMode::Spawn);
        assert_eq!(
            config,
            ScanConfig {
                fork_depth: 5,
                fork_mode: ForkMode::Spawn
            }
        );
    }
}
