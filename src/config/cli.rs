use crate::config::{BatchConfig, TomlConfig};
use crate::core::merge::fragment_files;
use crate::utils::error::{CvError, Result};
use clap::Parser;
use std::path::PathBuf;

/// `cv-batch` 命令列參數; 有給的旗標覆蓋設定檔, 設定檔覆蓋預設值
#[derive(Debug, Clone, Parser)]
#[command(name = "cv-batch")]
#[command(about = "Generates one résumé document per stored profile")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Base directory for relative paths [default: .]")]
    pub project_root: Option<PathBuf>,

    #[arg(long, help = "Directory for generated documents [default: output]")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Directory searched for photos [default: assets/photos]")]
    pub photos_dir: Option<PathBuf>,

    #[arg(long, help = "Profile store [default: data/profiles.json]")]
    pub profiles_file: Option<PathBuf>,

    #[arg(long, help = "Extra profiles file [default: data/profiles_extra.json]")]
    pub extra_file: Option<PathBuf>,

    #[arg(long, help = "Directory for processed photos [default: <output-dir>/_photos_processed]")]
    pub processed_dir: Option<PathBuf>,

    #[arg(long, help = "Spreadsheet (csv/xlsx/xls/ods) with additional profiles")]
    pub spreadsheet: Option<PathBuf>,

    #[arg(long, help = "Square-crop, resize and compress photos before rendering")]
    pub normalize_photos: bool,

    #[arg(long, help = "Side of the normalized photo in pixels [default: 600]")]
    pub target_size: Option<u32>,

    #[arg(long, help = "Size budget of the normalized photo in bytes [default: 204800]")]
    pub max_bytes: Option<u64>,

    #[arg(long, help = "Merge the extra file into the store before generating")]
    pub merge_extra: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Defaults, then the `--config` file, then explicit flags.
    pub fn to_batch_config(&self) -> Result<BatchConfig> {
        let mut config = BatchConfig::default();

        if let Some(path) = &self.config {
            tracing::debug!("Loading configuration from {}", path.display());
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }

        if let Some(v) = &self.project_root {
            config.project_root = v.clone();
        }
        if let Some(v) = &self.output_dir {
            config.output_dir = v.clone();
        }
        if let Some(v) = &self.photos_dir {
            config.photos_dir = v.clone();
        }
        if let Some(v) = &self.profiles_file {
            config.profiles_file = v.clone();
        }
        if let Some(v) = &self.extra_file {
            config.extra_file = v.clone();
        }
        if self.processed_dir.is_some() {
            config.processed_dir = self.processed_dir.clone();
        }
        if self.spreadsheet.is_some() {
            config.spreadsheet = self.spreadsheet.clone();
        }
        if let Some(v) = self.target_size {
            config.target_size_px = v;
        }
        if let Some(v) = self.max_bytes {
            config.max_photo_bytes = v;
        }
        config.normalize_photos |= self.normalize_photos;
        config.merge_extra |= self.merge_extra;

        Ok(config)
    }
}

/// `merge-profiles` 命令列參數
#[derive(Debug, Clone, Parser)]
#[command(name = "merge-profiles")]
#[command(about = "Combines profile fragment files into one collection")]
pub struct MergeCliConfig {
    #[arg(
        long,
        num_args = 1..,
        required_unless_present = "all",
        conflicts_with = "all",
        help = "Fragment files to merge, in order"
    )]
    pub inputs: Vec<PathBuf>,

    #[arg(long, help = "Merge every *.json fragment in --data-dir")]
    pub all: bool,

    #[arg(long, default_value = "data", help = "Directory scanned by --all")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = "data/profiles.json", help = "Collection file to write")]
    pub target: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl MergeCliConfig {
    /// Files to merge: the explicit list, or the fragments found by `--all`.
    /// Finding nothing to merge is an error.
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        let inputs = if self.all {
            fragment_files(&self.data_dir, &self.target)?
        } else {
            self.inputs.clone()
        };

        if inputs.is_empty() {
            return Err(CvError::ConfigError {
                message: format!("no fragment files to merge in {}", self.data_dir.display()),
            });
        }
        Ok(inputs)
    }
}
