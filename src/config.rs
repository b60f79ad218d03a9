//! Engine settings.
//!
//! Every timing knob in the engine is policy, not a derived constant - the
//! idle threshold in particular is inherently speculative (it distinguishes
//! a stuck prompt from slow-but-silent legitimate output), so it is exposed
//! here rather than buried in the run loop.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tuning knobs for the session engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sustained silence (no output, no recent send) after which an
    /// unrecognized prompt is inferred. Milliseconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Granularity of the bounded output wait. Milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Cap of the rolling scan buffer, in bytes.
    #[serde(default = "default_scan_buffer_cap")]
    pub scan_buffer_cap: usize,

    /// Default per-call deadline when the caller does not set one. Seconds;
    /// zero or negative means no deadline.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: i64,
}

fn default_idle_timeout_ms() -> u64 {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_scan_buffer_cap() -> usize {
    8_000
}

fn default_timeout_secs() -> i64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            scan_buffer_cap: default_scan_buffer_cap(),
            default_timeout_secs: default_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.idle_timeout_ms, 1_000);
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.scan_buffer_cap, 8_000);
        assert_eq!(config.default_timeout_secs, 60);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "idle_timeout_ms = 250").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.idle_timeout_ms, 250);
        assert_eq!(config.poll_interval_ms, 200);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(EngineConfig::from_file(Path::new("/nonexistent/config.toml")).is_err());
    }
}
