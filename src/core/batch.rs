use crate::core::photo::PhotoResolver;
use crate::core::validate::validate;
use crate::domain::model::Profile;
use crate::domain::ports::{DocumentRenderer, ImageCodec};
use crate::utils::error::{CvError, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub normalize_photos: bool,
    pub target_size_px: u32,
    pub max_photo_bytes: u64,
}

/// Terminal state of one profile in a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    Rendered(PathBuf),
    /// Rendered, but the requested photo was missing or could not be processed.
    RenderedDegraded { path: PathBuf, note: String },
    SkippedInvalid { missing: Vec<&'static str> },
    Errored { message: String },
}

impl ProfileOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(
            self,
            ProfileOutcome::Rendered(_) | ProfileOutcome::RenderedDegraded { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct ProfileResult {
    pub name: String,
    pub outcome: ProfileOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<ProfileResult>,
    pub warnings: usize,
}

impl BatchReport {
    pub fn rendered(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_rendered()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ProfileOutcome::SkippedInvalid { .. }))
            .count()
    }

    pub fn errored(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ProfileOutcome::Errored { .. }))
            .count()
    }
}

/// Photo chosen for one profile and, when degraded, why.
struct PhotoChoice {
    path: Option<PathBuf>,
    note: Option<String>,
}

pub struct BatchEngine<R: DocumentRenderer> {
    options: BatchOptions,
    resolver: PhotoResolver,
    renderer: R,
    codec: Option<Box<dyn ImageCodec>>,
}

impl<R: DocumentRenderer> BatchEngine<R> {
    pub fn new(options: BatchOptions, resolver: PhotoResolver, renderer: R) -> Self {
        Self {
            options,
            resolver,
            renderer,
            codec: None,
        }
    }

    pub fn with_codec(mut self, codec: Box<dyn ImageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Processes every profile in order. Only setup problems abort the run;
    /// per-profile failures end up in the report.
    pub fn run(&self, profiles: &[Profile]) -> Result<BatchReport> {
        if self.options.normalize_photos && self.codec.is_none() {
            return Err(CvError::FeatureUnavailableError {
                feature: "Photo normalization".to_string(),
                cargo_feature: "photos".to_string(),
            });
        }

        fs::create_dir_all(&self.options.output_dir)?;
        tracing::info!(
            "Generating {} profiles into {}",
            profiles.len(),
            self.options.output_dir.display()
        );

        let mut report = BatchReport::default();
        for profile in profiles {
            let outcome = self.process_one(profile, &mut report.warnings);
            report.results.push(ProfileResult {
                name: profile.name.clone(),
                outcome,
            });
        }

        tracing::info!(
            "Done. Documents generated: {} -> {} (skipped: {}, failed: {})",
            report.rendered(),
            self.options.output_dir.display(),
            report.skipped(),
            report.errored()
        );
        Ok(report)
    }

    fn process_one(&self, profile: &Profile, warnings: &mut usize) -> ProfileOutcome {
        let validation = validate(profile);
        if !validation.is_valid() {
            tracing::warn!(
                "Profile '{}' skipped, missing required fields: {:?}",
                profile.name,
                validation.missing
            );
            *warnings += 1;
            return ProfileOutcome::SkippedInvalid {
                missing: validation.missing,
            };
        }

        let photo = self.choose_photo(profile, warnings);
        let resolved = profile.with_resolved_photo(photo.path);

        match self.renderer.render(&resolved, &self.options.output_dir) {
            Ok(path) => {
                tracing::info!("Document generated: {}", path.display());
                match photo.note {
                    Some(note) => ProfileOutcome::RenderedDegraded { path, note },
                    None => ProfileOutcome::Rendered(path),
                }
            }
            Err(e) => {
                tracing::error!("Failed to generate CV for '{}': {}", profile.name, e);
                ProfileOutcome::Errored {
                    message: e.to_string(),
                }
            }
        }
    }

    fn choose_photo(&self, profile: &Profile, warnings: &mut usize) -> PhotoChoice {
        if !profile.include_photo {
            return PhotoChoice {
                path: None,
                note: None,
            };
        }

        let Some(source) = self.resolver.resolve(profile) else {
            tracing::info!(
                "'{}' asks for a photo but none was found; rendering without it",
                profile.name
            );
            return PhotoChoice {
                path: None,
                note: Some("photo not found".to_string()),
            };
        };

        match (&self.codec, self.options.normalize_photos) {
            (Some(codec), true) => match self.normalize(codec.as_ref(), &source) {
                Ok(processed) => {
                    tracing::info!("Photo processed: {}", processed.display());
                    PhotoChoice {
                        path: Some(processed),
                        note: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not process photo '{}': {}. Using the original",
                        source.display(),
                        e
                    );
                    *warnings += 1;
                    PhotoChoice {
                        path: Some(source),
                        note: Some(format!("photo processing failed: {}", e)),
                    }
                }
            },
            _ => PhotoChoice {
                path: Some(source),
                note: None,
            },
        }
    }

    fn normalize(&self, codec: &dyn ImageCodec, source: &Path) -> Result<PathBuf> {
        codec.normalize(
            source,
            self.options.target_size_px,
            self.options.max_photo_bytes,
        )
    }
}
