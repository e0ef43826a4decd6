use crate::domain::model::Profile;
use crate::domain::ports::Storage;
use crate::utils::error::{CvError, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Two profiles are duplicates only when all three parts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub title: String,
    pub fingerprint: String,
}

pub fn identity_key(profile: &Profile) -> IdentityKey {
    let name = profile.name.trim().to_lowercase();
    let title = profile.title.trim().to_lowercase();
    let fingerprint = match serde_json::to_vec(profile) {
        Ok(bytes) => format!("{:x}", Sha256::digest(&bytes)),
        Err(_) => format!("{}|{}", name, title),
    };
    IdentityKey {
        name,
        title,
        fingerprint,
    }
}

/// Concatenates collections in order and keeps the first occurrence of every key.
pub fn merge<I>(collections: I) -> Vec<Profile>
where
    I: IntoIterator<Item = Vec<Profile>>,
{
    let mut seen = HashSet::new();
    collections
        .into_iter()
        .flatten()
        .filter(|profile| seen.insert(identity_key(profile)))
        .collect()
}

fn profiles_array(raw: &Value) -> Option<&Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("profiles")
            .or_else(|| map.get("perfiles"))
            .and_then(Value::as_array),
        _ => None,
    }
}

/// A record that could not be read as a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// 1-based position in the collection.
    pub position: usize,
    pub reason: String,
}

/// Profiles read from one collection plus the records left out of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub profiles: Vec<Profile>,
    pub rejected: Vec<RejectedRecord>,
}

impl Collection {
    fn from_items(items: &[Value]) -> Self {
        let mut collection = Collection::default();
        for (idx, item) in items.iter().enumerate() {
            let outcome = if item.is_object() {
                serde_json::from_value::<Profile>(item.clone()).map_err(|e| e.to_string())
            } else {
                Err("not an object".to_string())
            };
            match outcome {
                Ok(profile) => collection.profiles.push(profile),
                Err(reason) => collection.rejected.push(RejectedRecord {
                    position: idx + 1,
                    reason,
                }),
            }
        }
        collection
    }

    fn warn_rejected(&self, source_name: &str) {
        for record in &self.rejected {
            tracing::warn!(
                "Skipping profile #{} in {}: {}",
                record.position,
                source_name,
                record.reason
            );
        }
    }
}

/// `{"profiles": [...]}` or a bare array; any other shape is a structural error.
/// Records inside a well-shaped collection are read one by one.
pub fn read_collection(raw: Value, source_name: &str) -> Result<Collection> {
    let items = profiles_array(&raw).ok_or_else(|| {
        CvError::structural(
            source_name,
            "expected a list of profiles or an object with a \"profiles\" list",
        )
    })?;
    Ok(Collection::from_items(items))
}

/// Like [`read_collection`], logging and dropping unreadable records.
pub fn normalize_collection(raw: Value, source_name: &str) -> Result<Vec<Profile>> {
    let collection = read_collection(raw, source_name)?;
    collection.warn_rejected(source_name);
    Ok(collection.profiles)
}

/// Loose reading used when combining arbitrary fragment files: also accepts a
/// single profile object; anything without profiles yields an empty collection.
pub fn collect_profiles(raw: Value, source_name: &str) -> Collection {
    let collection = match profiles_array(&raw) {
        Some(items) => Collection::from_items(items),
        None => match &raw {
            Value::Object(map)
                if ["name", "nombre", "title", "cargo"]
                    .iter()
                    .any(|key| map.contains_key(*key)) =>
            {
                Collection::from_items(std::slice::from_ref(&raw))
            }
            _ => Collection::default(),
        },
    };
    collection.warn_rejected(source_name);
    collection
}

fn refuse_lossy_rewrite(collection: &Collection, path: &Path) -> Result<()> {
    match collection.rejected.first() {
        None => Ok(()),
        Some(first) => Err(CvError::MergeError {
            message: format!(
                "{} has {} unreadable records (first: #{} {}); left unchanged",
                path.display(),
                collection.rejected.len(),
                first.position,
                first.reason
            ),
        }),
    }
}

/// Files in a data directory that are never profile fragments.
pub const NON_FRAGMENT_FILES: [&str; 4] = [
    "profiles.json",
    "profiles_sample.json",
    "sample_profile.json",
    "numeros_disponibles.json",
];

/// Every `*.json` file in `data_dir`, sorted, minus the known non-fragment
/// files and the merge target itself.
pub fn fragment_files(data_dir: &Path, target: &Path) -> Result<Vec<PathBuf>> {
    let target_name = target.file_name();
    let mut files: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
        })
        .filter(|path| {
            let name = path.file_name();
            name != target_name
                && !NON_FRAGMENT_FILES
                    .iter()
                    .any(|excluded| name.and_then(|n| n.to_str()) == Some(*excluded))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[derive(Serialize)]
struct CollectionDocument<'a> {
    profiles: &'a [Profile],
}

/// Reads and writes profile collection files through a [`Storage`].
pub struct ProfileStore<S: Storage> {
    storage: S,
}

impl<S: Storage> ProfileStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.storage.exists(path)
    }

    fn read_json(&self, path: &Path) -> Result<Value> {
        let bytes = self.storage.read_file(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CvError::structural(path.display().to_string(), format!("malformed JSON: {}", e)))
    }

    /// Reads a collection file, keeping track of unreadable records.
    pub fn load_collection(&self, path: &Path) -> Result<Collection> {
        if !self.storage.exists(path) {
            return Err(CvError::MissingStoreError {
                path: path.display().to_string(),
            });
        }
        let raw = self.read_json(path)?;
        read_collection(raw, &path.display().to_string())
    }

    /// Profiles of a collection file; unreadable records are logged and skipped.
    pub fn load(&self, path: &Path) -> Result<Vec<Profile>> {
        let collection = self.load_collection(path)?;
        collection.warn_rejected(&path.display().to_string());
        Ok(collection.profiles)
    }

    pub fn save(&self, path: &Path, profiles: &[Profile]) -> Result<()> {
        let json = serde_json::to_string_pretty(&CollectionDocument { profiles })?;
        self.storage.write_file(path, json.as_bytes())
    }

    /// Persistent merge: store first, then the extra file; the store is overwritten.
    /// Returns `None` when there is no extra file.
    pub fn merge_into_store(&self, extra_path: &Path, store_path: &Path) -> Result<Option<usize>> {
        if !self.storage.exists(extra_path) {
            tracing::info!("No extra profiles at {}, nothing to merge", extra_path.display());
            return Ok(None);
        }

        let extra = self.load(extra_path)?;
        let existing = self.load_collection(store_path)?;
        // 改寫前確認 store 的每一筆都讀得到, 否則會被悄悄刪掉
        refuse_lossy_rewrite(&existing, store_path)?;
        let merged = merge([existing.profiles, extra]);
        self.save(store_path, &merged)?;
        Ok(Some(merged.len()))
    }

    /// In-memory merge of an auxiliary collection; nothing is written.
    /// Returns the combined list and how many profiles the auxiliary source added.
    pub fn merge_with_auxiliary(
        &self,
        primary: Vec<Profile>,
        aux_path: &Path,
    ) -> Result<(Vec<Profile>, usize)> {
        if !self.storage.exists(aux_path) {
            return Ok((primary, 0));
        }
        let auxiliary = self.load(aux_path)?;
        let before = primary.len();
        let merged = merge([primary, auxiliary]);
        let added = merged.len() - before;
        Ok((merged, added))
    }

    /// Combines fragment files into `target`. Existing target content keeps its
    /// place at the front; unreadable or profile-less inputs are skipped.
    pub fn merge_files(&self, inputs: &[impl AsRef<Path>], target: &Path) -> Result<usize> {
        let mut gathered = Vec::new();

        for input in inputs {
            let input = input.as_ref();
            let name = input.display().to_string();
            match self.read_json(input) {
                Ok(raw) => {
                    let profiles = collect_profiles(raw, &name).profiles;
                    if profiles.is_empty() {
                        tracing::info!("No profiles in {}, skipped", name);
                        continue;
                    }
                    tracing::info!("{} profiles from {}", profiles.len(), name);
                    gathered.push(profiles);
                }
                Err(e) => tracing::warn!("Could not read {}: {}", name, e),
            }
        }

        if self.storage.exists(target) {
            match self.read_json(target) {
                Ok(raw) => {
                    let existing = collect_profiles(raw, &target.display().to_string());
                    refuse_lossy_rewrite(&existing, target)?;
                    let existing = existing.profiles;
                    if !existing.is_empty() {
                        tracing::info!(
                            "Keeping {} existing profiles from {}",
                            existing.len(),
                            target.display()
                        );
                        gathered.insert(0, existing);
                    }
                }
                Err(e) => tracing::warn!("Could not read existing {}: {}", target.display(), e),
            }
        }

        let merged = merge(gathered);
        self.save(target, &merged)?;
        Ok(merged.len())
    }
}
