use crate::core::text::split_list;
use crate::domain::model::{EducationEntry, ExperienceEntry};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// One spreadsheet row keyed by case-folded, trimmed header.
pub type Row = BTreeMap<String, Value>;

/// First alias whose cell is present and not blank.
pub fn first_present<'a>(row: &'a Row, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| !is_blank(value))
}

/// Text of the first non-blank alias, trimmed.
pub fn first_text(row: &Row, aliases: &[&str]) -> Option<String> {
    first_present(row, aliases).and_then(cell_text)
}

pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Cell split into items; arrays are taken element by element.
pub fn cell_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(cell_text).collect(),
        Some(other) => cell_text(other).map(|s| split_list(&s)).unwrap_or_default(),
        None => Vec::new(),
    }
}

/// JSON 欄位快速路徑: 字串內嵌 JSON 或已結構化的陣列
fn embedded_sequence<T: DeserializeOwned>(row: &Row, aliases: &[&str]) -> Option<Vec<T>> {
    let raw = first_present(row, aliases)?;
    let data = match raw {
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        other => other.clone(),
    };
    if !data.is_array() {
        return None;
    }
    match serde_json::from_value::<Vec<T>>(data) {
        Ok(entries) => Some(entries),
        Err(e) => {
            tracing::debug!("Embedded JSON in {:?} is not a list of entries: {}", aliases, e);
            None
        }
    }
}

fn flat_experience(row: &Row) -> Option<ExperienceEntry> {
    let role = first_text(row, &["puesto", "cargo_experiencia", "role"])?;
    let employer = first_text(row, &["empresa", "employer"])?;

    Some(ExperienceEntry {
        role,
        employer,
        period: first_text(row, &["periodo", "fecha", "period"]).unwrap_or_default(),
        location: first_text(row, &["ubicacion_experiencia", "ubicacion", "location"]),
        sector: first_text(row, &["sector"]),
        achievements: cell_list(first_present(row, &["logros", "achievements"])),
        activities: cell_list(first_present(row, &["actividades", "activities"])),
        projects: cell_list(first_present(row, &["proyectos", "projects"])),
        ..ExperienceEntry::default()
    })
}

fn flat_education(row: &Row) -> Option<EducationEntry> {
    let degree = first_text(row, &["grado", "degree"])?;
    let institution = first_text(row, &["institucion", "universidad", "institution"])?;

    Some(EducationEntry {
        degree,
        institution,
        detail: first_text(row, &["detalle", "detail"]),
        ..EducationEntry::default()
    })
}

/// Experience entries of a row: embedded JSON list first, then the flat columns.
pub fn parse_experience(row: &Row) -> Vec<ExperienceEntry> {
    embedded_sequence(
        row,
        &["experiencias_json", "experiencias", "experience_json", "experience"],
    )
    .or_else(|| flat_experience(row).map(|entry| vec![entry]))
    .unwrap_or_default()
}

/// Education entries of a row: embedded JSON list first, then the flat columns.
pub fn parse_education(row: &Row) -> Vec<EducationEntry> {
    embedded_sequence(
        row,
        &["educacion_json", "educacion", "education_json", "education"],
    )
    .or_else(|| flat_education(row).map(|entry| vec![entry]))
    .unwrap_or_default()
}

/// `{"Español":"Nativo"}` or `"Español:Nativo; Inglés:B2"`.
pub fn parse_languages(value: Option<&Value>) -> BTreeMap<String, String> {
    let text = match value {
        Some(Value::Object(map)) => return object_to_labels(map),
        Some(other) => match cell_text(other) {
            Some(text) => text,
            None => return BTreeMap::new(),
        },
        None => return BTreeMap::new(),
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text) {
        return object_to_labels(&map);
    }

    split_list(&text)
        .into_iter()
        .map(|item| match item.split_once(':') {
            Some((language, level)) => (language.trim().to_string(), level.trim().to_string()),
            None => (item, String::new()),
        })
        .collect()
}

fn object_to_labels(map: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(language, level)| {
            let label = match level {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (language.clone(), label)
        })
        .collect()
}
