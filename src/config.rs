use chrono::NaiveDateTime;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mailing_scheduler::factory::global_budget;
use mailing_scheduler::generator::GeneratorOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub scheduling: SchedulingConfig,
    pub generator: GeneratorOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Messages per minute the whole system may send
    pub max_send_speed: u32,
    /// Cycle length in minutes
    pub work_interval: u32,
    /// Messages taken from a dataset per cycle
    pub max_to_fetch: usize,
    pub priority_fraction: f64,
    pub non_priority_fraction: f64,
    pub uniform_fraction: f64,
    /// Planning threads per tier; hardware parallelism when unset
    pub workers: Option<usize>,
    /// Clock used for receive times; local now when unset
    pub reference_time: Option<NaiveDateTime>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_send_speed: 15_000,
            work_interval: 3,
            max_to_fetch: 100_000,
            priority_fraction: 0.1,
            non_priority_fraction: 0.05,
            uniform_fraction: 0.1,
            workers: None,
            reference_time: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override scheduling values from `lookup`, keyed by environment variable name.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let s = &mut self.scheduling;
        override_from(&lookup, "MAX_SEND_SPEED", &mut s.max_send_speed)?;
        override_from(&lookup, "WORK_INTERVAL", &mut s.work_interval)?;
        override_from(&lookup, "MAX_TO_FETCH", &mut s.max_to_fetch)?;
        override_from(&lookup, "PRIORITY_FRACTION", &mut s.priority_fraction)?;
        override_from(&lookup, "NON_PRIORITY_FRACTION", &mut s.non_priority_fraction)?;
        override_from(&lookup, "UNIFORM_FRACTION", &mut s.uniform_fraction)?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scheduling;
        if s.max_send_speed == 0 {
            eyre::bail!("scheduling.max_send_speed must be > 0");
        }
        if s.work_interval == 0 {
            eyre::bail!("scheduling.work_interval must be > 0");
        }
        if s.max_to_fetch == 0 {
            eyre::bail!("scheduling.max_to_fetch must be > 0");
        }
        for (key, value) in [
            ("scheduling.priority_fraction", s.priority_fraction),
            ("scheduling.non_priority_fraction", s.non_priority_fraction),
            ("scheduling.uniform_fraction", s.uniform_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                eyre::bail!("{} must be in (0, 1], got {}", key, value);
            }
        }
        if s.workers == Some(0) {
            eyre::bail!("scheduling.workers must be > 0");
        }
        if !(0.0..=1.0).contains(&self.generator.priority_share) {
            eyre::bail!(
                "generator.priority_share must be in [0, 1], got {}",
                self.generator.priority_share
            );
        }
        Ok(())
    }

    /// Messages admitted per cycle: `max_send_speed * work_interval`.
    pub fn global_budget(&self) -> u64 {
        global_budget(self.scheduling.max_send_speed, self.scheduling.work_interval)
    }
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw))?;
        log::info!("{} overridden from environment", key);
    }
    Ok(())
}
