pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod packaging;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::ServerConfig;
pub use crate::core::{build_classifier, digit::DigitClassifier, echo::EchoClassifier};
pub use utils::error::{EchoError, Result};
