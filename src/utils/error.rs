use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Pattern compilation error: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Model returned {status}: {message}")]
    ModelError { status: u16, message: String },

    #[error("Failed to get valid response after {attempts} attempts for {document}")]
    RetriesExhausted { document: String, attempts: u32 },

    #[error("Could not recover JSON from model output for {document}: {reason} (text: {excerpt})")]
    JsonRecoveryError {
        document: String,
        reason: String,
        excerpt: String,
    },

    #[error("Model output for {document} is {found}, expected an object or a list of objects (text: {excerpt})")]
    SchemaMismatchError {
        document: String,
        found: String,
        excerpt: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::ModelError { .. } | Self::RetriesExhausted { .. } => {
                ErrorCategory::Network
            }
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::JsonRecoveryError { .. }
            | Self::SchemaMismatchError { .. } => ErrorCategory::Data,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::PatternError(_) => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(_) | Self::ModelError { .. } | Self::RetriesExhausted { .. } => {
                ErrorSeverity::Medium
            }
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::JsonRecoveryError { .. }
            | Self::SchemaMismatchError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::PatternError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) | Self::ModelError { .. } => {
                "Check network access, the model endpoint and that the access token is still valid"
            }
            Self::RetriesExhausted { .. } => {
                "Increase retry.max_retries or retry.backoff_seconds, or re-run the failed document"
            }
            Self::JsonRecoveryError { .. } | Self::SchemaMismatchError { .. } => {
                "Inspect the model output for this document; enabling model.json_response usually helps"
            }
            Self::CsvError(_) => "Make sure the output file is not open in another program",
            Self::IoError(_) => "Check that the paths exist and that the process may read and write them",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Fix the configuration file or the command-line flags and try again"
            }
            Self::PatternError(_) => "This is a bug in a built-in pattern, please report it",
            Self::SerializationError(_) => "Re-run with --verbose to see the failing input",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::RetriesExhausted { document, attempts } => {
                format!("The model gave no usable answer for {document} after {attempts} attempts")
            }
            Self::JsonRecoveryError { document, .. } | Self::SchemaMismatchError { document, .. } => {
                format!("The model answer for {document} could not be read as claim data")
            }
            Self::MissingConfigError { field } => {
                format!("Missing required setting '{field}'")
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{field}' is invalid: {reason}")
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
