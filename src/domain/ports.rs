use crate::domain::model::Profile;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Byte-level access to profile collection files.
pub trait Storage {
    fn exists(&self, path: &Path) -> bool;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
}

/// Turns one fully resolved profile into a document inside `output_dir`.
pub trait DocumentRenderer {
    fn render(&self, profile: &Profile, output_dir: &Path) -> Result<PathBuf>;
}

/// Square-crops, resizes and compresses a photo, returning the processed file.
pub trait ImageCodec {
    fn normalize(&self, source: &Path, target_size_px: u32, max_bytes: u64) -> Result<PathBuf>;
}
