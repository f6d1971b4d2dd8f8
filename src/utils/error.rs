use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Column '{column}' not found")]
    MissingColumnError { column: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Model error: {message}")]
    ModelError { message: String },

    #[error("Chart rendering error: {message}")]
    ChartError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Model,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        EtlError::ModelError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EtlError::ValidationError {
            message: message.into(),
        }
    }

    pub fn missing_column(column: impl Into<String>) -> Self {
        EtlError::MissingColumnError {
            column: column.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_)
            | EtlError::MissingColumnError { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
            EtlError::ModelError { .. } | EtlError::SerializationError(_) => ErrorCategory::Model,
            EtlError::ChartError { .. } => ErrorCategory::Output,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ChartError { .. } | EtlError::ValidationError { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::CsvError(_) => "Check that every input CSV has a header row and consistent field counts",
            EtlError::IoError(_) => "Check that the data, outputs and models directories exist and are writable",
            EtlError::SerializationError(_) | EtlError::ModelError { .. } => {
                "Re-run the `train` command to regenerate the model artifact"
            }
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => "Fix the configuration file and try again",
            EtlError::MissingColumnError { .. } => {
                "Make sure the input CSV uses the expected column names or add a rename mapping"
            }
            EtlError::ProcessingError { .. } => "Inspect the input rows for non-numeric statistics",
            EtlError::ChartError { .. } => "Check the chart input data; the stage that drew it wrote nothing",
            EtlError::ValidationError { .. } => "Review the input data for the reported inconsistency",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingColumnError { column } => {
                format!("The input data has no '{}' column", column)
            }
            EtlError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_is_data_error() {
        let err = EtlError::missing_column("points");
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("points"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: EtlError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_chart_error_fails_the_stage() {
        let err = EtlError::ChartError {
            message: "scatter chart has no points".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.category(), ErrorCategory::Output);
    }
}
