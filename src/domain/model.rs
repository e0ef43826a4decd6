use crate::core::fields::parse_languages;
use crate::core::text::{coerce_bool, split_list};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// JSON `null` 視為欄位的空值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// 純量轉成文字; 試算表匯出的 `2021` 或 `true` 也接受
fn scalar_text(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected text, found {}", kind(&other))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = scalar_text(Value::deserialize(deserializer)?).map_err(D::Error::custom)?;
    Ok(text.unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

/// A list of scalars, or one delimited string (`"Go; Rust"`).
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(text) = scalar_text(item).map_err(D::Error::custom)? {
                    out.push(text);
                }
            }
            Ok(out)
        }
        Value::String(s) => Ok(split_list(&s)),
        other => Ok(scalar_text(other)
            .map_err(D::Error::custom)?
            .into_iter()
            .collect()),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_bool(Some(&Value::deserialize(deserializer)?)))
}

fn lenient_languages<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Array(_) => Err(D::Error::custom(format!(
            "expected a language map, found {}",
            kind(&value)
        ))),
        value => Ok(parse_languages(Some(&value))),
    }
}

/// Unknown layouts fall back to the default instead of rejecting the record.
fn lenient_layout<'de, D>(deserializer: D) -> Result<PhotoLayout, D::Error>
where
    D: Deserializer<'de>,
{
    match scalar_text(Value::deserialize(deserializer)?).map_err(D::Error::custom)? {
        None => Ok(PhotoLayout::default()),
        Some(raw) => Ok(raw.parse().unwrap_or_else(|e| {
            tracing::warn!("{}, using {}", e, PhotoLayout::default());
            PhotoLayout::default()
        })),
    }
}

/// Where the photo sits relative to the header text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhotoLayout {
    /// Own right-aligned paragraph below the header block.
    #[default]
    #[serde(alias = "right_paragraph")]
    RightInline,
    /// Two-column header: text left, photo right.
    #[serde(alias = "right_table")]
    RightBesideText,
    /// Two-column header: photo left, text right.
    #[serde(alias = "left_table")]
    LeftBesideText,
}

impl PhotoLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoLayout::RightInline => "right-inline",
            PhotoLayout::RightBesideText => "right-beside-text",
            PhotoLayout::LeftBesideText => "left-beside-text",
        }
    }

    pub fn is_beside_text(&self) -> bool {
        !matches!(self, PhotoLayout::RightInline)
    }
}

impl fmt::Display for PhotoLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "right-inline" | "right_paragraph" => Ok(PhotoLayout::RightInline),
            "right-beside-text" | "right_table" => Ok(PhotoLayout::RightBesideText),
            "left-beside-text" | "left_table" => Ok(PhotoLayout::LeftBesideText),
            other => Err(format!("unknown photo layout '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(alias = "puesto", deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(alias = "empresa", deserialize_with = "lenient_string")]
    pub employer: String,
    #[serde(alias = "periodo", deserialize_with = "lenient_string")]
    pub period: String,
    #[serde(
        alias = "ubicacion",
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(alias = "logros", deserialize_with = "lenient_list")]
    pub achievements: Vec<String>,
    #[serde(alias = "actividades", deserialize_with = "lenient_list")]
    pub activities: Vec<String>,
    #[serde(alias = "proyectos", deserialize_with = "lenient_list")]
    pub projects: Vec<String>,
    /// Keys this model does not know, kept so stored records round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(alias = "grado", deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(alias = "institucion", deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(
        alias = "detalle",
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical résumé record. Every field tolerates absence so that validation
/// can report what is missing instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "nombre", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(alias = "cargo", deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(alias = "contacto", deserialize_with = "lenient_list")]
    pub contact: Vec<String>,
    #[serde(
        alias = "ubicacion",
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(alias = "resumen", deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(alias = "experiencias", deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(alias = "educacion", deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(alias = "certificaciones", deserialize_with = "lenient_list")]
    pub certifications: Vec<String>,
    #[serde(alias = "habilidades", deserialize_with = "lenient_list")]
    pub skills: Vec<String>,
    #[serde(alias = "idiomas", deserialize_with = "lenient_languages")]
    pub languages: BTreeMap<String, String>,
    #[serde(alias = "incluir_foto", deserialize_with = "lenient_bool")]
    pub include_photo: bool,
    #[serde(
        alias = "ruta_foto",
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_path: Option<String>,
    #[serde(alias = "photo_position", deserialize_with = "lenient_layout")]
    pub photo_layout: PhotoLayout,
    /// Keys this model does not know. They take part in the identity
    /// fingerprint and are written back when a store is saved.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Copy of this profile pointing at a resolved (or processed) photo.
    /// The source record is left untouched so it can be merged again.
    pub fn with_resolved_photo(&self, photo: Option<PathBuf>) -> Profile {
        let mut copy = self.clone();
        copy.photo_path = photo.map(|p| p.to_string_lossy().into_owned());
        copy
    }

    /// Contact entries shown on the document; social network handles are dropped.
    pub fn visible_contacts(&self) -> impl Iterator<Item = &str> {
        self.contact
            .iter()
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty() && !c.to_lowercase().contains("linkedin"))
    }
}
