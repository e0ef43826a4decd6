use crate::config::BatchConfig;
use crate::utils::error::{CvError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 批次設定檔; 每個欄位都是選填, 未填的沿用預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub photos: PhotosSection,
    #[serde(default)]
    pub merge: MergeSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsSection {
    pub project_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub photos_dir: Option<PathBuf>,
    pub profiles_file: Option<PathBuf>,
    pub extra_file: Option<PathBuf>,
    pub processed_dir: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotosSection {
    pub normalize: Option<bool>,
    pub target_size: Option<u32>,
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeSection {
    pub merge_extra: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| CvError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CV_OUTPUT}); 未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CvError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 將檔案中有設定的值覆蓋到 `config`
    pub fn apply_to(&self, config: &mut BatchConfig) {
        let paths = &self.paths;
        if let Some(v) = &paths.project_root {
            config.project_root = v.clone();
        }
        if let Some(v) = &paths.output_dir {
            config.output_dir = v.clone();
        }
        if let Some(v) = &paths.photos_dir {
            config.photos_dir = v.clone();
        }
        if let Some(v) = &paths.profiles_file {
            config.profiles_file = v.clone();
        }
        if let Some(v) = &paths.extra_file {
            config.extra_file = v.clone();
        }
        if paths.processed_dir.is_some() {
            config.processed_dir = paths.processed_dir.clone();
        }
        if paths.spreadsheet.is_some() {
            config.spreadsheet = paths.spreadsheet.clone();
        }

        if let Some(v) = self.photos.normalize {
            config.normalize_photos = v;
        }
        if let Some(v) = self.photos.target_size {
            config.target_size_px = v;
        }
        if let Some(v) = self.photos.max_bytes {
            config.max_photo_bytes = v;
        }
        if let Some(v) = self.merge.merge_extra {
            config.merge_extra = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[paths]
output_dir = "build/cvs"

[photos]
normalize = true
target_size = 400
"#;

        let file_config = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut config = BatchConfig::default();
        file_config.apply_to(&mut config);

        assert_eq!(config.output_dir, PathBuf::from("build/cvs"));
        assert!(config.normalize_photos);
        assert_eq!(config.target_size_px, 400);
        // 未設定的值沿用預設
        assert_eq!(config.max_photo_bytes, 200 * 1024);
        assert_eq!(config.photos_dir, PathBuf::from("assets/photos"));
        assert!(!config.merge_extra);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CV_BATCH_TEST_PHOTOS", "/srv/photos");

        let toml_content = r#"
[paths]
photos_dir = "${CV_BATCH_TEST_PHOTOS}"
extra_file = "${CV_BATCH_TEST_UNDEFINED_VAR}"
"#;

        let file_config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(file_config.paths.photos_dir, Some(PathBuf::from("/srv/photos")));
        assert_eq!(
            file_config.paths.extra_file,
            Some(PathBuf::from("${CV_BATCH_TEST_UNDEFINED_VAR}"))
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[merge]\nmerge_extra = true").unwrap();

        let file_config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(file_config.merge.merge_extra, Some(true));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[photos\nnormalize = ").unwrap_err();
        assert!(matches!(err, CvError::ConfigError { .. }));
    }
}
