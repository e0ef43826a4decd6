use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const TRUE_TOKENS: [&str; 7] = ["1", "true", "yes", "y", "x", "si", "sí"];

/// ASCII-ish slug used to compare person names against photo file stems.
///
/// `"José  Pérez_Ávila"` becomes `"jose-perez-avila"`.
pub fn slug(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut out = String::with_capacity(folded.len());
    for ch in folded.trim().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if matches!(ch, ' ' | '-' | '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Splits on newline, comma and semicolon alike, trimming and dropping empty items.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truthiness of a loosely typed cell (`"Sí"`, `"x"`, `1`, `true` ...).
pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => is_true_token(s),
        Some(Value::Number(n)) => is_true_token(&n.to_string()),
        Some(_) => false,
    }
}

fn is_true_token(raw: &str) -> bool {
    let token = raw.trim().to_lowercase();
    TRUE_TOKENS.contains(&token.as_str())
}
