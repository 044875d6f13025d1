//! Process-level harness configuration
//!
//! Nothing here reaches the decode path: the fuzz input is the only thing
//! that determines decoded operator parameters. The configuration only
//! controls logging, progress reporting, panic handling and where artifacts
//! for unexpected failures are written.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

pub const ENV_PROGRESS_INTERVAL: &str = "OPFUZZ_PROGRESS_INTERVAL";
pub const ENV_PANIC_POLICY: &str = "OPFUZZ_PANIC_POLICY";
pub const ENV_ARTIFACT_DIR: &str = "OPFUZZ_ARTIFACT_DIR";
pub const ENV_LOG: &str = "OPFUZZ_LOG";

/// Default number of iterations between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

static GLOBAL_CONFIG: OnceLock<(HarnessConfig, Vec<ConfigError>)> = OnceLock::new();

/// Configuration errors. Invalid values never abort a fuzzing run; the
/// offending field keeps its default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected a positive integer, got {value:?}")]
    InvalidInterval { var: &'static str, value: String },

    #[error("{var}: expected `catch` or `propagate`, got {value:?}")]
    InvalidPanicPolicy { var: &'static str, value: String },

    #[error("{var}: artifact directory must not be empty")]
    EmptyArtifactDir { var: &'static str },
}

/// What the entry point does with a panic escaping a harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanicPolicy {
    /// Classify the panic as an unexpected failure and discard the input.
    #[default]
    Catch,
    /// Re-raise the panic so the fuzzing engine records a crash.
    Propagate,
}

impl std::str::FromStr for PanicPolicy {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "catch" => Ok(PanicPolicy::Catch),
            "propagate" | "abort" => Ok(PanicPolicy::Propagate),
            _ => Err(()),
        }
    }
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub progress_interval: u64,
    pub panic_policy: PanicPolicy,
    pub artifact_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            panic_policy: PanicPolicy::Catch,
            artifact_dir: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Build a configuration from the process environment.
    ///
    /// Rejected values are returned rather than logged: the environment is
    /// read before any subscriber exists, so callers pass them to
    /// [`report_invalid`] once logging is up.
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Returns the resulting configuration together with every value that was
    /// rejected; rejected fields keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = lookup(ENV_PROGRESS_INTERVAL) {
            match value.trim().parse::<u64>() {
                Ok(n) if n > 0 => config.progress_interval = n,
                _ => errors
                    .push(ConfigError::InvalidInterval { var: ENV_PROGRESS_INTERVAL, value }),
            }
        }

        if let Some(value) = lookup(ENV_PANIC_POLICY) {
            match value.parse::<PanicPolicy>() {
                Ok(policy) => config.panic_policy = policy,
                Err(()) => {
                    errors.push(ConfigError::InvalidPanicPolicy { var: ENV_PANIC_POLICY, value })
                }
            }
        }

        if let Some(value) = lookup(ENV_ARTIFACT_DIR) {
            if value.trim().is_empty() {
                errors.push(ConfigError::EmptyArtifactDir { var: ENV_ARTIFACT_DIR });
            } else {
                config.artifact_dir = Some(PathBuf::from(value));
            }
        }

        if let Some(value) = lookup(ENV_LOG) {
            if !value.trim().is_empty() {
                config.log_filter = value;
            }
        }

        (config, errors)
    }

    /// Validate a configuration built by other means (deserialized, CLI).
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidInterval {
                var: ENV_PROGRESS_INTERVAL,
                value: "0".to_string(),
            });
        }
        if matches!(&self.artifact_dir, Some(dir) if dir.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyArtifactDir { var: ENV_ARTIFACT_DIR });
        }
        Ok(())
    }

    /// Process-wide configuration, read from the environment on first use.
    pub fn global() -> &'static HarnessConfig {
        &GLOBAL_CONFIG.get_or_init(Self::from_env).0
    }

    /// Values rejected while building [`HarnessConfig::global`].
    pub fn global_errors() -> &'static [ConfigError] {
        &GLOBAL_CONFIG.get_or_init(Self::from_env).1
    }
}

/// Log every rejected configuration value at `warn` level.
pub fn report_invalid(errors: &[ConfigError]) {
    for err in errors {
        tracing::warn!("ignoring invalid configuration: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let (config, errors) = HarnessConfig::from_lookup(|_| None);
        assert_eq!(config, HarnessConfig::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn all_fields_are_read() {
        let (config, errors) = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_PROGRESS_INTERVAL, "500"),
            (ENV_PANIC_POLICY, "Propagate"),
            (ENV_ARTIFACT_DIR, "/tmp/opfuzz"),
            (ENV_LOG, "debug"),
        ]));
        assert!(errors.is_empty());
        assert_eq!(config.progress_interval, 500);
        assert_eq!(config.panic_policy, PanicPolicy::Propagate);
        assert_eq!(config.artifact_dir, Some(PathBuf::from("/tmp/opfuzz")));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let (config, errors) = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_PROGRESS_INTERVAL, "0"),
            (ENV_PANIC_POLICY, "explode"),
            (ENV_ARTIFACT_DIR, "  "),
        ]));
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ConfigError::InvalidInterval { .. }));
        assert!(matches!(errors[1], ConfigError::InvalidPanicPolicy { .. }));
        assert!(matches!(errors[2], ConfigError::EmptyArtifactDir { .. }));
    }

    #[test]
    fn rejected_values_are_logged() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (_, errors) = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_PROGRESS_INTERVAL, "soon"),
            (ENV_PANIC_POLICY, "explode"),
        ]));
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || report_invalid(&errors));

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("ignoring invalid configuration").count(), 2);
        assert!(text.contains("WARN"));
        assert!(text.contains("\"soon\""));
        assert!(text.contains(ENV_PANIC_POLICY));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let config = HarnessConfig { progress_interval: 0, ..HarnessConfig::default() };
        assert!(config.validate().is_err());
        assert!(HarnessConfig::default().validate().is_ok());
    }
}
