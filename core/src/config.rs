//! Client configuration.
//!
//! # Design
//! `ClientConfig` is plain data with serde derives so it can be embedded in a
//! larger JSON settings file by the orchestration layer. Every field has a
//! default, and `from_env` overlays the two knobs an operator is most likely
//! to touch without a file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the socket timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";

/// Environment variable toggling certificate verification (`0`/`false`/`no`/`off` disable it).
pub const ENV_TLS_VERIFY: &str = "DDNS_TLS_VERIFY";

/// Settings shared by every request an `HttpClient` issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Read, write and connect timeout, in seconds.
    pub timeout_secs: u64,

    /// Validate the server certificate chain against the bundled web PKI roots.
    ///
    /// Turning this off accepts any certificate. It exists for hosts with
    /// self-signed certificates and should stay on otherwise.
    pub verify_certificates: bool,

    /// Size of each socket read while draining a response.
    pub read_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            verify_certificates: true,
            read_buffer_size: 4096,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse a JSON settings fragment; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ClientConfig =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()
    }

    /// Defaults overlaid with `DDNS_HTTP_TIMEOUT_SECS` and `DDNS_TLS_VERIFY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ClientConfig::default();
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TIMEOUT_SECS}={raw} is not a number")))?;
        }
        if let Some(raw) = lookup(ENV_TLS_VERIFY) {
            config.verify_certificates = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(Error::Config(format!(
                        "{ENV_TLS_VERIFY}={raw} is not a boolean"
                    )))
                }
            };
        }
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        // A zero duration is rejected by `set_read_timeout`.
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::Config("read_buffer_size must be at least 1".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_verify_and_use_five_seconds() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.verify_certificates);
        assert_eq!(config.read_buffer_size, 4096);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = ClientConfig::from_json(r#"{"verify_certificates":false}"#).unwrap();
        assert!(!config.verify_certificates);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn json_rejects_zero_timeout() {
        let err = ClientConfig::from_json(r#"{"timeout_secs":0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn json_rejects_wrong_types() {
        let err = ClientConfig::from_json(r#"{"timeout_secs":"soon"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "12"), (ENV_TLS_VERIFY, "off")]))
                .unwrap();
        assert_eq!(config.timeout_secs, 12);
        assert!(!config.verify_certificates);
    }

    #[test]
    fn env_absent_keeps_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn env_rejects_garbage() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_TLS_VERIFY, "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "-1")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
