use crate::core::text::slug;
use crate::domain::model::Profile;
use std::fs;
use std::path::{Path, PathBuf};

/// Probe order when a photo reference has no extension.
pub const PHOTO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

fn has_photo_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Exact file in `dir`. Without an extension, probes png > jpg > jpeg > webp.
pub fn resolve_by_basename(dir: &Path, filename: &str) -> Option<PathBuf> {
    let filename = filename.trim();
    if filename.is_empty() {
        return None;
    }

    if Path::new(filename).extension().is_some() {
        let candidate = dir.join(filename);
        return candidate.is_file().then_some(candidate);
    }

    PHOTO_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", filename, ext)))
        .find(|candidate| candidate.is_file())
}

/// Photo whose slugged stem contains, or is contained in, the slugged name.
///
/// Entries are scanned in file-name order so the first match is stable
/// across platforms.
pub fn resolve_by_name_guess(dir: &Path, person_name: &str) -> Option<PathBuf> {
    let name_slug = slug(person_name);
    if name_slug.is_empty() {
        return None;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot scan photos dir {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_photo_extension(path))
        .collect();
    candidates.sort();

    candidates.into_iter().find(|path| {
        let stem_slug = path
            .file_stem()
            .map(|stem| slug(&stem.to_string_lossy()))
            .unwrap_or_default();
        !stem_slug.is_empty() && (name_slug.contains(&stem_slug) || stem_slug.contains(&name_slug))
    })
}

/// Absolute paths must exist as given; relative ones are tried against
/// the project root, then the photos root.
pub fn resolve_path(raw: &str, project_root: &Path, photos_root: &Path) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }

    [project_root, photos_root]
        .iter()
        .map(|root| root.join(path))
        .find(|candidate| candidate.exists())
}

/// `path` relative to `root` when it lives underneath it.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Debug, Clone)]
pub struct PhotoResolver {
    project_root: PathBuf,
    photos_dir: PathBuf,
}

impl PhotoResolver {
    pub fn new(project_root: impl Into<PathBuf>, photos_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            photos_dir: photos_dir.into(),
        }
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    /// explicit path → basename in photos dir → name guess
    pub fn resolve(&self, profile: &Profile) -> Option<PathBuf> {
        if let Some(raw) = profile.photo_path.as_deref() {
            if let Some(found) = resolve_path(raw, &self.project_root, &self.photos_dir) {
                return Some(found);
            }
            let basename = Path::new(raw.trim())
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(found) = resolve_by_basename(&self.photos_dir, &basename) {
                tracing::debug!("Photo '{}' found by basename: {}", raw, found.display());
                return Some(found);
            }
        }

        let guess = resolve_by_name_guess(&self.photos_dir, &profile.name);
        if let Some(found) = &guess {
            tracing::debug!("Photo for '{}' guessed from name: {}", profile.name, found.display());
        }
        guess
    }

    /// Spreadsheet rows: named file first, then a guess from the person's name.
    pub fn locate(&self, filename: Option<&str>, person_name: &str) -> Option<PathBuf> {
        filename
            .and_then(|name| resolve_by_basename(&self.photos_dir, name))
            .or_else(|| resolve_by_name_guess(&self.photos_dir, person_name))
    }

    /// Stored form of a located photo: relative to the project root when possible.
    pub fn to_stored_path(&self, found: &Path) -> String {
        relative_to(found, &self.project_root).to_string_lossy().into_owned()
    }
}
