use common::CodePattern;
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)-?([0-9]+)([A-Z]*)$").expect("code pattern"));

/// Trims, uppercases and removes spaces. Idempotent.
pub fn normalize_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| *ch != ' ')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Splits a code into series letters, numeric id and suffix. Codes that do
/// not look like `ABC-123` return `None` and stay opaque.
pub fn extract_pattern(code: &str) -> Option<CodePattern> {
    let code = normalize_code(code);
    let caps = CODE_PATTERN.captures(&code)?;
    Some(CodePattern {
        series: caps[1].to_string(),
        number: caps[2].to_string(),
        suffix: caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    })
}
