use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension) => Ok(()),
        Some(extension) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    for value in values {
        validate_non_empty_string(field_name, value)?;
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Open interval check, both bounds excluded.
pub fn validate_open_range(field_name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(value > min && value < max) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be strictly between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("paths.data_dir", "data").is_ok());
        assert!(validate_path("paths.data_dir", "").is_err());
        assert!(validate_path("paths.data_dir", "da\0ta").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("training.n_estimators", 200, 1).is_ok());
        assert!(validate_positive_number("training.n_estimators", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("paths.model_path", "models/m.json", &["json"]).is_ok());
        assert!(validate_file_extension("paths.model_path", "models/m.pkl", &["json"]).is_err());
        assert!(validate_file_extension("paths.model_path", "models/m", &["json"]).is_err());
    }

    #[test]
    fn test_validate_non_empty_list() {
        let features = vec!["points".to_string(), "Wins".to_string()];
        assert!(validate_non_empty_list("training.features", &features).is_ok());
        assert!(validate_non_empty_list("training.features", &[]).is_err());
        assert!(validate_non_empty_list("training.features", &[" ".to_string()]).is_err());
    }

    #[test]
    fn test_validate_open_range() {
        assert!(validate_open_range("training.test_size", 0.2, 0.0, 1.0).is_ok());
        assert!(validate_open_range("training.test_size", 0.0, 0.0, 1.0).is_err());
        assert!(validate_open_range("training.test_size", 1.0, 0.0, 1.0).is_err());
    }
}
