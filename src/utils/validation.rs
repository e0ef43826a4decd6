use crate::utils::error::{CvError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(CvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if raw.contains('\0') {
        return Err(CvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_min<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min_value: T,
) -> Result<()> {
    if value < min_value {
        return Err(CvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, path: &Path, allowed_extensions: &[&str]) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if allowed_extensions.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(CvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(CvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_dir", &PathBuf::from("output")).is_ok());
        assert!(validate_path("output_dir", &PathBuf::from("")).is_err());
        assert!(validate_path("output_dir", &PathBuf::from("  ")).is_err());
    }

    #[test]
    fn test_validate_min() {
        assert!(validate_min("target_size", 600u32, 16).is_ok());
        assert!(validate_min("target_size", 8u32, 16).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        let allowed = ["csv", "xlsx"];
        assert!(validate_file_extension("spreadsheet", Path::new("people.CSV"), &allowed).is_ok());
        assert!(validate_file_extension("spreadsheet", Path::new("people.txt"), &allowed).is_err());
        assert!(validate_file_extension("spreadsheet", Path::new("people"), &allowed).is_err());
    }
}
