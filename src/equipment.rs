use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Marker is case-sensitive and not word-bounded; the token runs as far as the class allows.
    static ref EQUIPMENT_MARKER: Regex = Regex::new(r"ONT\s+([0-9A-Za-z\s()\-]+)")
        .expect("equipment pattern is valid");
}

/// Extracts equipment tokens following the `ONT` marker, in order of appearance.
pub fn extract(description: Option<&str>) -> Vec<String> {
    let Some(text) = description else {
        return Vec::new();
    };
    EQUIPMENT_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
