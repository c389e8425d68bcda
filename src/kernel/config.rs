//! Configuration consumed once at `ApplicationScope` construction.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::trace::{B3Encoding, TraceContextInjection};

pub const SESSION_MAX_DURATION: Duration = Duration::from_secs(4 * 60 * 60);
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_TRACE_SAMPLE_RATE: f32 = 20.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Application id must not be empty")]
    EmptyApplicationId,

    #[error("{field} must be within 0..=100, got {value}")]
    InvalidSampleRate { field: &'static str, value: f32 },

    #[error("{0} must be greater than zero")]
    InvalidDuration(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RumConfig {
    pub application_id: String,
    /// Percentage of sessions kept, 0..=100.
    pub session_sample_rate: f32,
    pub background_events_tracking: bool,
    #[serde(rename = "session_max_duration_ms", with = "duration_ms")]
    pub session_max_duration: Duration,
    #[serde(rename = "session_timeout_ms", with = "duration_ms")]
    pub session_timeout: Duration,
    pub first_party_hosts: Vec<String>,
    /// Percentage of first-party requests traced, 0..=100.
    pub trace_sample_rate: f32,
    pub trace_context_injection: TraceContextInjection,
    pub b3_encoding: B3Encoding,
}

impl Default for RumConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            session_sample_rate: 100.0,
            background_events_tracking: false,
            session_max_duration: SESSION_MAX_DURATION,
            session_timeout: SESSION_TIMEOUT,
            first_party_hosts: Vec::new(),
            trace_sample_rate: DEFAULT_TRACE_SAMPLE_RATE,
            trace_context_injection: TraceContextInjection::Sampled,
            b3_encoding: B3Encoding::Single,
        }
    }
}

impl RumConfig {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RumConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_id.trim().is_empty() {
            return Err(ConfigError::EmptyApplicationId);
        }
        check_rate("session_sample_rate", self.session_sample_rate)?;
        check_rate("trace_sample_rate", self.trace_sample_rate)?;
        if self.session_max_duration.is_zero() {
            return Err(ConfigError::InvalidDuration("session_max_duration"));
        }
        if self.session_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration("session_timeout"));
        }
        Ok(())
    }
}

fn check_rate(field: &'static str, value: f32) -> Result<(), ConfigError> {
    // NaN fails the range check too
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSampleRate { field, value })
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = RumConfig::from_json_str(r#"{ "application_id": "app-1" }"#).unwrap();
        assert_eq!(config.application_id, "app-1");
        assert_eq!(config.session_sample_rate, 100.0);
        assert_eq!(config.session_max_duration, SESSION_MAX_DURATION);
        assert_eq!(config.session_timeout, SESSION_TIMEOUT);
        assert!(!config.background_events_tracking);
    }

    #[test]
    fn durations_are_read_as_milliseconds() {
        let config = RumConfig::from_json_str(
            r#"{ "application_id": "a", "session_timeout_ms": 1500, "b3_encoding": "multiple" }"#,
        )
        .unwrap();
        assert_eq!(config.session_timeout, Duration::from_millis(1500));
        assert_eq!(config.b3_encoding, B3Encoding::Multiple);
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let err = RumConfig::from_json_str(r#"{ "application_id": "a", "session_sample_rate": 120 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSampleRate { field: "session_sample_rate", .. }));
    }

    #[test]
    fn rejects_empty_application_id() {
        assert!(matches!(RumConfig::default().validate(), Err(ConfigError::EmptyApplicationId)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = RumConfig::from_json_str(r#"{ "application_id": "a", "session_timeout_ms": 0 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration("session_timeout")));
    }
}
