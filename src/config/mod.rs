#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::digit::DEFAULT_MODEL_PATH;
use crate::core::ConfigProvider;
use crate::domain::model::ClassifierKind;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
pub const MIN_BODY_BYTES: usize = 1024;

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    /// The one port the listener binds.
    pub port: u16,
    /// Port advertised by the surrounding container description, if known.
    pub expose_port: Option<u16>,
    pub classifier: ClassifierKind,
    pub model_path: String,
    pub max_body_bytes: usize,
    pub monitor: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            expose_port: None,
            classifier: ClassifierKind::Echo,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            monitor: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `(bound, exposed)` when an advertised port disagrees with the bound one.
    pub fn port_mismatch(&self) -> Option<(u16, u16)> {
        match self.expose_port {
            Some(exposed) if exposed != self.port => Some((self.port, exposed)),
            _ => None,
        }
    }
}

impl ConfigProvider for ServerConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn classifier_kind(&self) -> ClassifierKind {
        self.classifier
    }

    fn model_path(&self) -> &str {
        &self.model_path
    }

    fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.host)?;
        validate_range("server.port", self.port, 1, u16::MAX)?;
        if let Some(exposed) = self.expose_port {
            validate_range("server.expose_port", exposed, 1, u16::MAX)?;
        }
        validate_positive_number("server.max_body_bytes", self.max_body_bytes, MIN_BODY_BYTES)?;
        if self.classifier == ClassifierKind::Digit {
            validate_path("classifier.model_path", &self.model_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_bind_8081() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8081");
        assert!(config.validate().is_ok());
        assert!(config.port_mismatch().is_none());
    }

    #[test]
    fn test_port_mismatch_is_reported() {
        let config = ServerConfig {
            expose_port: Some(5000),
            ..ServerConfig::default()
        };
        assert_eq!(config.port_mismatch(), Some((8081, 5000)));

        let aligned = ServerConfig {
            expose_port: Some(8081),
            ..ServerConfig::default()
        };
        assert!(aligned.port_mismatch().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_port = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(zero_port.validate().is_err());

        let tiny_body = ServerConfig {
            max_body_bytes: 10,
            ..ServerConfig::default()
        };
        assert!(tiny_body.validate().is_err());

        let digit_without_model = ServerConfig {
            classifier: ClassifierKind::Digit,
            model_path: String::new(),
            ..ServerConfig::default()
        };
        assert!(digit_without_model.validate().is_err());
    }
}
