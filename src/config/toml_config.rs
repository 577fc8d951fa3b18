use crate::config::ServerConfig;
use crate::domain::model::ClassifierKind;
use crate::utils::error::{EchoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub classifier: ClassifierSection,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub expose_port: Option<u16>,
    pub max_body_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierSection {
    pub kind: Option<ClassifierKind>,
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EchoError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EchoError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODEL_PATH})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::{Captures, Regex};
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|e| panic!("invalid env pattern: {e}"))
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// Overlays the values present in this file onto `base`.
    pub fn apply_to(&self, base: &mut ServerConfig) {
        if let Some(host) = &self.server.host {
            base.host = host.clone();
        }
        if let Some(port) = self.server.port {
            base.port = port;
        }
        if self.server.expose_port.is_some() {
            base.expose_port = self.server.expose_port;
        }
        if let Some(limit) = self.server.max_body_bytes {
            base.max_body_bytes = limit;
        }
        if let Some(kind) = self.classifier.kind {
            base.classifier = kind;
        }
        if let Some(path) = &self.classifier.model_path {
            base.model_path = path.clone();
        }
        if let Some(monitoring) = &self.monitoring {
            base.monitor = monitoring.enabled;
        }
    }
}
