//! Runtime knobs for the wrap/unwrap pipeline.
//!
//! Protocol constants (version byte, salt, kinds) are not configurable and
//! live in [`crate::wire`] and [`crate::event`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timestamp::{DEFAULT_FUTURE_SKEW_SECS, DEFAULT_MAX_AGE_SECS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapConfig {
    /// Jitter window for gift wrap timestamps, and the validation window.
    pub max_timestamp_age_secs: u64,
    /// Accepted clock skew into the future.
    pub future_skew_secs: u64,
    /// Check id and signature of inbound gift wraps and seals.
    pub verify_signatures: bool,
    /// Also wrap outgoing messages to the sender, so other devices can read them.
    pub include_sender_copy: bool,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            max_timestamp_age_secs: DEFAULT_MAX_AGE_SECS,
            future_skew_secs: DEFAULT_FUTURE_SKEW_SECS,
            verify_signatures: true,
            include_sender_copy: false,
        }
    }
}

impl WrapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_timestamp_age_secs == 0 {
            return Err(Error::InvalidConfig("max_timestamp_age_secs must be positive"));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::InvalidConfig("malformed json"))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WrapConfig::default();
        assert_eq!(config.max_timestamp_age_secs, 172_800);
        assert_eq!(config.future_skew_secs, 60);
        assert!(config.verify_signatures);
        assert!(!config.include_sender_copy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = WrapConfig::from_json(r#"{"include_sender_copy": true}"#).unwrap();
        assert!(config.include_sender_copy);
        assert_eq!(config.max_timestamp_age_secs, DEFAULT_MAX_AGE_SECS);
    }

    #[test]
    fn rejects_zero_window_and_bad_json() {
        assert!(matches!(
            WrapConfig::from_json(r#"{"max_timestamp_age_secs": 0}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            WrapConfig::from_json("{"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
