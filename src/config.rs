//! Конфигурация сервера и конвейера

use std::net::SocketAddr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::ClassifierConfig;
use crate::preprocessing::PipelineConfig;

pub const CONFIG_ENV: &str = "PASSENGER_ML_CONFIG";
pub const HOST_ENV: &str = "PASSENGER_ML_HOST";
pub const PORT_ENV: &str = "PASSENGER_ML_PORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            pipeline: PipelineConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AppConfig {
    /// JSON-файл из `PASSENGER_ML_CONFIG` (если задан), затем переменные хоста и порта
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {path}"))?;
                Self::from_json(&text).with_context(|| format!("Invalid config file {path}"))?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(std::env::var(HOST_ENV).ok(), std::env::var(PORT_ENV).ok())?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(host) = host.filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = port.filter(|p| !p.is_empty()) {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid {PORT_ENV} value '{port}'"))?;
        }
        Ok(())
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassifierKind;
    use crate::preprocessing::FlagEncoding;

    #[test]
    fn empty_json_gives_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.addr().unwrap().port(), 8000);
    }

    #[test]
    fn nested_sections_deserialize() {
        let config = AppConfig::from_json(
            r#"{
                "port": 9100,
                "pipeline": { "flag_encoding": "boolean" },
                "classifier": { "kind": "majority", "seed": 7 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.pipeline.flag_encoding, FlagEncoding::Boolean);
        assert_eq!(config.classifier.kind, ClassifierKind::Majority);
        assert_eq!(config.classifier.seed, 7);
        assert_eq!(config.classifier.holdout_fraction, 0.2);
    }

    #[test]
    fn overrides_replace_host_and_port() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(Some("127.0.0.1".to_string()), Some("8081".to_string()))
            .unwrap();
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8081");

        assert!(config
            .apply_overrides(None, Some("not-a-port".to_string()))
            .is_err());
    }
}
