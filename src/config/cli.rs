use crate::config::toml_config::TomlConfig;
use crate::config::ServerConfig;
use crate::domain::model::ClassifierKind;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "echo-server")]
#[command(about = "HTTP service that decodes base64 images and classifies them")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Port the container description exposes; a mismatch with --port is reported
    #[arg(long)]
    pub expose_port: Option<u16>,

    /// Classifier backing /classify/v0
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierKind>,

    /// Weights file for the digit classifier
    #[arg(long)]
    pub model_path: Option<String>,

    /// Maximum accepted request body in bytes
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

impl CliConfig {
    /// Defaults, then the TOML file, then command line flags.
    pub fn resolve(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.expose_port.is_some() {
            config.expose_port = self.expose_port;
        }
        if let Some(kind) = self.classifier {
            config.classifier = kind;
        }
        if let Some(path) = &self.model_path {
            config.model_path = path.clone();
        }
        if let Some(limit) = self.max_body_bytes {
            config.max_body_bytes = limit;
        }
        if self.monitor {
            config.monitor = true;
        }

        Ok(config)
    }
}
