use crate::core::compress::compress_to_budget;
use crate::domain::ports::ImageCodec;
use crate::utils::error::{CvError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

fn photo_error(source: &Path, e: impl std::fmt::Display) -> CvError {
    CvError::PhotoError {
        message: format!("{}: {}", source.display(), e),
    }
}

/// Centered square crop with side `min(width, height)`.
fn square_crop(img: &DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let side = width.min(height);
    img.crop_imm((width - side) / 2, (height - side) / 2, side, side)
}

/// JPEG normalizer writing `<stem>_<px>.jpg` files into one directory.
#[derive(Debug, Clone)]
pub struct JpegCodec {
    output_dir: PathBuf,
}

impl JpegCodec {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn target_path(&self, source: &Path, target_size_px: u32) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        self.output_dir
            .join(format!("{}_{}.jpg", stem, target_size_px))
    }
}

impl ImageCodec for JpegCodec {
    fn normalize(&self, source: &Path, target_size_px: u32, max_bytes: u64) -> Result<PathBuf> {
        let img = image::open(source).map_err(|e| photo_error(source, e))?;
        let rgb = square_crop(&img)
            .resize_exact(target_size_px, target_size_px, FilterType::Lanczos3)
            .to_rgb8();

        let compressed = compress_to_budget(max_bytes, |quality| {
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, quality)
                .encode_image(&rgb)
                .map_err(|e| photo_error(source, e))?;
            Ok(buf)
        })?;

        fs::create_dir_all(&self.output_dir)?;
        let target = self.target_path(source, target_size_px);
        fs::write(&target, &compressed.bytes)?;

        tracing::debug!(
            "📷 {} -> {} (quality {}, {} bytes)",
            source.display(),
            target.display(),
            compressed.quality,
            compressed.bytes.len()
        );
        Ok(target)
    }
}
