use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchoError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("{message}")]
    InvalidBase64 { message: String },

    #[error("{message}")]
    PreprocessingError { message: String },

    #[error("Failed to load model from '{path}': {message}")]
    ModelLoadError { path: String, message: String },

    #[error("Model not loaded. Cannot perform classification.")]
    ModelNotLoaded,

    #[error("Image file not found at {path}")]
    FileNotFound { path: String },

    #[error("Invalid URL format '{url}'")]
    InvalidUrl { url: String },

    #[error("Could not connect to the API at {url}")]
    ConnectionError { url: String },

    #[error("Dockerfile parse error at line {line}: {message}")]
    DockerfileParseError { line: usize, message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Input,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EchoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EchoError::InvalidConfigValueError { .. }
            | EchoError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EchoError::HttpError(_)
            | EchoError::InvalidUrl { .. }
            | EchoError::ConnectionError { .. } => ErrorCategory::Network,
            EchoError::SerializationError(_)
            | EchoError::InvalidBase64 { .. }
            | EchoError::PreprocessingError { .. }
            | EchoError::FileNotFound { .. }
            | EchoError::DockerfileParseError { .. } => ErrorCategory::Input,
            EchoError::ModelLoadError { .. } | EchoError::ModelNotLoaded => ErrorCategory::Model,
            EchoError::IoError(_) | EchoError::ServerError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Model => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EchoError::ConnectionError { .. } | EchoError::HttpError(_) => {
                "Please ensure the server is running and accessible at this address."
            }
            EchoError::InvalidUrl { .. } => {
                "Please ensure the URL includes 'http://' or 'https://'."
            }
            EchoError::FileNotFound { .. } => "Check the image path and try again.",
            EchoError::ModelLoadError { .. } | EchoError::ModelNotLoaded => {
                "Please ensure the model file is mounted correctly in the container."
            }
            EchoError::InvalidBase64 { .. } | EchoError::PreprocessingError { .. } => {
                "Send a base64 encoded PNG, JPEG, GIF or BMP image in the 'image' field."
            }
            EchoError::DockerfileParseError { .. } => "Fix the Dockerfile syntax and re-run the check.",
            _ if self.category() == ErrorCategory::Configuration => {
                "Review the configuration file and command line flags."
            }
            _ => "Check the logs for details.",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EchoError::FileNotFound { path } => format!("Error: Image file not found at {}", path),
            EchoError::InvalidUrl { url } => format!("Error: Invalid URL format '{}'.", url),
            EchoError::ConnectionError { url } => {
                format!("Error: Could not connect to the API at {}.", url)
            }
            other => format!("Error: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EchoError>;
