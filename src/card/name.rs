use serde_json::Value;

/// Name used when a card's name sanitizes to nothing
const UNNAMED: &str = "unnamed";

/// Returns the character name stored in a card document
///
/// Looks at the top-level `name` first, then `data.name` (current-shape
/// cards nest most fields under `data`). Blank names are ignored.
pub fn character_name(document: &Value) -> Option<String> {
    [document.get("name"), document.pointer("/data/name")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// Makes a character name safe to use as a directory and URL segment
///
/// Path separators and characters reserved on common filesystems are
/// replaced: `\ / * < > |` become spaces, while `: ? "` become their
/// full-width look-alikes so the name stays readable.
///
/// # Examples
///
/// ```
/// use card_localizer::sanitize_character_name;
///
/// assert_eq!(sanitize_character_name("Aria: Night/Day?"), "Aria： Night Day？");
/// assert_eq!(sanitize_character_name("  "), "unnamed");
/// ```
pub fn sanitize_character_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '<' | '>' | '|' => ' ',
            ':' => '：',
            '?' => '？',
            '"' => '”',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        UNNAMED.to_string()
    } else {
        sanitized.to_string()
    }
}
