use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid profile collection in {source_name}: {reason}")]
    StructuralError { source_name: String, reason: String },

    #[error("Profile store not found: {path}")]
    MissingStoreError { path: String },

    #[error("Merge failed: {message}")]
    MergeError { message: String },

    #[error("Spreadsheet error: {message}")]
    SpreadsheetError { message: String },

    #[error("Photo processing error: {message}")]
    PhotoError { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("{feature} is not available in this build (enable the `{cargo_feature}` feature)")]
    FeatureUnavailableError {
        feature: String,
        cargo_feature: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Configuration,
    Dependency,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CvError {
    pub fn structural(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CvError::StructuralError {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CvError::IoError(_) | CvError::ZipError(_) => ErrorCategory::Io,
            CvError::CsvError(_)
            | CvError::SerializationError(_)
            | CvError::StructuralError { .. }
            | CvError::MissingStoreError { .. }
            | CvError::SpreadsheetError { .. } => ErrorCategory::Input,
            CvError::ConfigError { .. } | CvError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            CvError::FeatureUnavailableError { .. } => ErrorCategory::Dependency,
            CvError::MergeError { .. } | CvError::PhotoError { .. } | CvError::RenderError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CvError::PhotoError { .. } => ErrorSeverity::Low,
            CvError::RenderError { .. } => ErrorSeverity::Medium,
            CvError::IoError(_) | CvError::ZipError(_) | CvError::FeatureUnavailableError { .. } => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    /// 行程結束代碼 (0 表示僅為警告)
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CvError::StructuralError { .. } | CvError::SerializationError(_) => {
                "The file must be a JSON array of profiles or an object with a \"profiles\" array"
            }
            CvError::MissingStoreError { .. } => {
                "Create the profile store or combine your files with merge-profiles first"
            }
            CvError::MergeError { .. } => "Check that both the extra file and the store are valid JSON",
            CvError::SpreadsheetError { .. } | CvError::CsvError(_) => {
                "Make sure the first sheet has a header row and the file is not open elsewhere"
            }
            CvError::FeatureUnavailableError { .. } => {
                "Rebuild with the missing feature enabled or run without the option that needs it"
            }
            CvError::ConfigError { .. } | CvError::InvalidConfigValueError { .. } => {
                "Review the command line flags and the configuration file"
            }
            CvError::PhotoError { .. } => "Check the source photo; the original will be used instead",
            CvError::RenderError { .. } => "Check that the output directory is writable",
            CvError::IoError(_) | CvError::ZipError(_) => "Check file permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CvError::MissingStoreError { path } => format!("Profile store '{}' does not exist", path),
            CvError::StructuralError { source_name, .. } => {
                format!("'{}' is not a valid profile collection", source_name)
            }
            CvError::FeatureUnavailableError { feature, .. } => {
                format!("{} was requested but is not available", feature)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CvError>;
