use thiserror::Error;

#[derive(Error, Debug)]
pub enum EligibilityError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

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

    #[error("Invalid experience {field} = {value}: {reason}")]
    InvalidExperience {
        field: String,
        value: i64,
        reason: String,
    },

    #[error("Invalid proficiency {value}: must be between 1 and 5 stars")]
    InvalidProficiency { value: i64 },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Validation,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EligibilityError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) => ErrorCategory::Io,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
            Self::TomlError(_)
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::InvalidExperience { .. } | Self::InvalidProficiency { .. } => {
                ErrorCategory::Validation
            }
            Self::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::IoError(_) => "Check that the input file exists and the output directory is writable".to_string(),
            Self::CsvError(_) => "Make sure the sheet has a header row with experience_months and proficiency columns".to_string(),
            Self::SerializationError(_) => "The report could not be encoded; re-run with --verbose for details".to_string(),
            Self::TomlError(_) => "Make sure the configuration file is valid TOML".to_string(),
            Self::ConfigValidationError { field, .. }
            | Self::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' setting in your configuration", field)
            }
            Self::MissingConfigError { field } => {
                format!("Add the '{}' setting to your configuration", field)
            }
            Self::InvalidExperience { .. } => {
                "Years must be between 0 and 10 (10 means 10+), months between 0 and 11".to_string()
            }
            Self::InvalidProficiency { .. } => "Pick a rating from 1 to 5 stars".to_string(),
            Self::ProcessingError { .. } => "Re-run with --verbose to see which row failed".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not access a file: {}", self),
            ErrorCategory::Data => format!("The skill sheet could not be read: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Validation => format!("Invalid input: {}", self),
            ErrorCategory::Processing => format!("Audit failed: {}", self),
        }
    }

    /// 依嚴重程度對應 CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EligibilityError>;
