use std::env;
use std::fmt;
use std::str::FromStr;

use crate::workflows::progress::DuplicateRunPolicy;

/// Distinguishes runtime behavior for different stages of the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the desk.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("DESK_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("DESK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let memo_profile = match env::var("DESK_MEMO_PROFILE") {
            Ok(raw) => MemoProfile::parse(&raw).ok_or(ConfigError::InvalidChoice {
                var: "DESK_MEMO_PROFILE",
                value: raw,
                expected: "staged or uniform",
            })?,
            Err(_) => MemoProfile::Staged,
        };
        let duplicate_runs = match env::var("DESK_DUPLICATE_RUNS") {
            Ok(raw) => parse_policy(&raw).ok_or(ConfigError::InvalidChoice {
                var: "DESK_DUPLICATE_RUNS",
                value: raw,
                expected: "reject or supersede",
            })?,
            Err(_) => DuplicateRunPolicy::Reject,
        };

        let engine = EngineConfig {
            upload_tick_ms: parse_var("DESK_UPLOAD_TICK_MS", 50)?,
            memo_profile,
            memo_tick_ms: parse_var("DESK_MEMO_TICK_MS", memo_profile.default_tick_ms())?,
            memo_step: parse_var("DESK_MEMO_STEP", 1.0)?,
            stage_pause_ms: parse_var("DESK_STAGE_PAUSE_MS", 200)?,
            duplicate_runs,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine,
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_policy(raw: &str) -> Option<DuplicateRunPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "reject" => Some(DuplicateRunPolicy::Reject),
        "supersede" | "restart" => Some(DuplicateRunPolicy::Supersede),
        _ => None,
    }
}

/// Which stage-timing profile drives memo generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoProfile {
    Staged,
    Uniform,
}

impl MemoProfile {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "staged" => Some(Self::Staged),
            "uniform" => Some(Self::Uniform),
            _ => None,
        }
    }

    pub const fn default_tick_ms(self) -> u64 {
        match self {
            Self::Staged => 50,
            Self::Uniform => 100,
        }
    }
}

/// Cadence and policy knobs for the progress engines.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub upload_tick_ms: u64,
    pub memo_profile: MemoProfile,
    pub memo_tick_ms: u64,
    pub memo_step: f64,
    pub stage_pause_ms: u64,
    pub duplicate_runs: DuplicateRunPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upload_tick_ms: 50,
            memo_profile: MemoProfile::Staged,
            memo_tick_ms: MemoProfile::Staged.default_tick_ms(),
            memo_step: 1.0,
            stage_pause_ms: 200,
            duplicate_runs: DuplicateRunPolicy::Reject,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber {
        var: &'static str,
        value: String,
    },
    InvalidChoice {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a non-negative number, found '{value}'")
            }
            ConfigError::InvalidChoice {
                var,
                value,
                expected,
            } => write!(f, "{var} must be {expected}, found '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "DESK_ENV",
            "DESK_LOG_LEVEL",
            "DESK_UPLOAD_TICK_MS",
            "DESK_MEMO_PROFILE",
            "DESK_MEMO_TICK_MS",
            "DESK_MEMO_STEP",
            "DESK_STAGE_PAUSE_MS",
            "DESK_DUPLICATE_RUNS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn uniform_profile_defaults_to_slower_ticks() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DESK_MEMO_PROFILE", "Uniform");
        env::set_var("DESK_DUPLICATE_RUNS", "supersede");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.engine.memo_profile, MemoProfile::Uniform);
        assert_eq!(config.engine.memo_tick_ms, 100);
        assert_eq!(config.engine.duplicate_runs, DuplicateRunPolicy::Supersede);
        reset_env();
    }

    #[test]
    fn rejects_malformed_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DESK_UPLOAD_TICK_MS", "fast");
        let err = AppConfig::load().expect_err("non-numeric tick rejected");
        assert!(err.to_string().contains("DESK_UPLOAD_TICK_MS"));

        reset_env();
        env::set_var("DESK_MEMO_PROFILE", "bursty");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidChoice {
                var: "DESK_MEMO_PROFILE",
                ..
            })
        ));
        reset_env();
    }
}
