#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::batch::BatchOptions;
use crate::core::photo::PhotoResolver;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_min, validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use toml_config::TomlConfig;

pub const MIN_TARGET_SIZE_PX: u32 = 16;
pub const MIN_PHOTO_BYTES: u64 = 1024;

/// 一次批次執行所需的全部設定, 由 CLI 層組好後交給各元件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub photos_dir: PathBuf,
    pub profiles_file: PathBuf,
    pub extra_file: PathBuf,
    /// `None` means `<output_dir>/_photos_processed`.
    pub processed_dir: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
    pub normalize_photos: bool,
    pub target_size_px: u32,
    pub max_photo_bytes: u64,
    pub merge_extra: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            photos_dir: PathBuf::from("assets/photos"),
            profiles_file: PathBuf::from("data/profiles.json"),
            extra_file: PathBuf::from("data/profiles_extra.json"),
            processed_dir: None,
            spreadsheet: None,
            normalize_photos: false,
            target_size_px: 600,
            max_photo_bytes: 200 * 1024,
            merge_extra: false,
        }
    }
}

impl BatchConfig {
    /// Relative paths are taken from the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    pub fn photos_dir(&self) -> PathBuf {
        self.resolve(&self.photos_dir)
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.resolve(&self.profiles_file)
    }

    pub fn extra_file(&self) -> PathBuf {
        self.resolve(&self.extra_file)
    }

    pub fn processed_dir(&self) -> PathBuf {
        match &self.processed_dir {
            Some(dir) => self.resolve(dir),
            None => self.output_dir().join("_photos_processed"),
        }
    }

    pub fn spreadsheet(&self) -> Option<PathBuf> {
        self.spreadsheet.as_deref().map(|p| self.resolve(p))
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            output_dir: self.output_dir(),
            normalize_photos: self.normalize_photos,
            target_size_px: self.target_size_px,
            max_photo_bytes: self.max_photo_bytes,
        }
    }

    pub fn photo_resolver(&self) -> PhotoResolver {
        PhotoResolver::new(self.project_root.clone(), self.photos_dir())
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        validate_path("project_root", &self.project_root)?;
        validate_path("output_dir", &self.output_dir)?;
        validate_path("photos_dir", &self.photos_dir)?;
        validate_path("profiles_file", &self.profiles_file)?;
        validate_path("extra_file", &self.extra_file)?;
        if let Some(dir) = &self.processed_dir {
            validate_path("processed_dir", dir)?;
        }
        if let Some(sheet) = &self.spreadsheet {
            validate_file_extension("spreadsheet", sheet, &["csv", "xlsx", "xlsm", "xls", "ods"])?;
        }

        validate_min("target_size", self.target_size_px, MIN_TARGET_SIZE_PX)?;
        validate_min("max_bytes", self.max_photo_bytes, MIN_PHOTO_BYTES)?;
        Ok(())
    }
}
