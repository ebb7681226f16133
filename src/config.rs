//! Configuration for the coordinator, the demo services and the exercises.
//!
//! Values are resolved in three layers: built-in defaults, an optional JSON
//! file named by `TETHER_CONFIG`, then individual `TETHER_*` environment
//! variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runtime::error::{TetherError, TetherResult};

pub const CONFIG_PATH_ENV: &str = "TETHER_CONFIG";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub coordinator: CoordinatorSettings,
    pub user_service: UserServiceSettings,
    pub chain: ChainSettings,
    pub exercises: ExerciseSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    pub request_timeout_ms: u64,
    pub workers: Vec<WorkerSettings>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            workers: vec![
                WorkerSettings {
                    name: "status goroutine".to_string(),
                    target: "http://httpbin.org/status/200,200,200,500".to_string(),
                    interval_ms: 1_000,
                    fatal_statuses: vec![500],
                    echo_header: None,
                },
                WorkerSettings {
                    name: "delay goroutine".to_string(),
                    target: "http://httpbin.org/delay/1".to_string(),
                    interval_ms: 0,
                    fatal_statuses: Vec::new(),
                    echo_header: Some("date".to_string()),
                },
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub interval_ms: u64,
    #[serde(default)]
    pub fatal_statuses: Vec<u16>,
    #[serde(default)]
    pub echo_header: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserServiceSettings {
    pub bind: String,
}

impl Default for UserServiceSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    pub first_bind: String,
    pub second_bind: String,
    /// Base URL the first service calls.
    pub remote: String,
    pub request_timeout_ms: u64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            first_bind: "0.0.0.0:3000".to_string(),
            second_bind: "0.0.0.0:4000".to_string(),
            remote: "http://localhost:4000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseSettings {
    pub bind: String,
    pub sum_race: SumRaceSettings,
    pub request_timeout_ms: u64,
}

impl Default for ExerciseSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            sum_race: SumRaceSettings::default(),
            request_timeout_ms: 2_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SumRaceSettings {
    pub target: u64,
    /// Exclusive upper bound of the drawn values.
    pub upper: u64,
    pub deadline_ms: u64,
}

impl Default for SumRaceSettings {
    fn default() -> Self {
        Self {
            target: 1234,
            upper: 100_000_000,
            deadline_ms: 2_000,
        }
    }
}

impl TetherConfig {
    /// Defaults, then `TETHER_CONFIG`, then `TETHER_*` overrides.
    pub fn load() -> TetherResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TetherResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            TetherError::config(format!("read {} failed: {}", path.display(), err))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> TetherResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| TetherError::config(format!("parse config failed: {}", err)))
    }

    /// Apply `TETHER_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> TetherResult<()> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(bind) = value("TETHER_USER_BIND") {
            self.user_service.bind = bind;
        }
        if let Some(bind) = value("TETHER_FIRST_BIND") {
            self.chain.first_bind = bind;
        }
        if let Some(bind) = value("TETHER_SECOND_BIND") {
            self.chain.second_bind = bind;
        }
        if let Some(remote) = value("TETHER_REMOTE") {
            self.chain.remote = remote;
        }
        if let Some(bind) = value("TETHER_EXERCISE_BIND") {
            self.exercises.bind = bind;
        }
        if let Some(raw) = value("TETHER_SUM_DEADLINE_MS") {
            self.exercises.sum_race.deadline_ms = parse_number("TETHER_SUM_DEADLINE_MS", &raw)?;
        }
        if let Some(raw) = value("TETHER_REQUEST_TIMEOUT_MS") {
            self.coordinator.request_timeout_ms =
                parse_number("TETHER_REQUEST_TIMEOUT_MS", &raw)?;
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> TetherResult<u64> {
    raw.trim()
        .parse()
        .map_err(|err| TetherError::config(format!("{key} must be a number: {err}")))
}
