//! Text normalization shared by ingestion and matching.

use crate::store::models::Gender;

/// Sport aliases seen in scraped headers and hand-entered data.
/// Keys are lowercase; values are canonical sport keys.
const SPORT_ALIASES: &[(&str, &str)] = &[
    ("cross country", "cross-country skiing"),
    ("cross-country", "cross-country skiing"),
    ("cross country skiing", "cross-country skiing"),
    ("alpine", "alpine skiing"),
    ("freestyle", "freestyle skiing"),
    ("snowboard", "snowboarding"),
    ("short track", "short track speed skating"),
    ("short-track speed skating", "short track speed skating"),
    ("bobsled", "bobsleigh"),
    ("hockey", "ice hockey"),
    ("skimo", "ski mountaineering"),
];

/// Leading words that only restate the gender of an event.
const GENDER_WORDS: &[&str] = &["men", "mens", "women", "womens", "ladies", "mixed"];

/// Canonical sport key: trimmed, lowercase, whitespace collapsed, aliases applied.
pub fn normalize_sport(text: &str) -> String {
    let key = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    SPORT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// Infer the category from free text. `Mixed` when nothing gendered is found.
pub fn extract_gender(text: &str) -> Gender {
    find_gender(text).unwrap_or(Gender::Mixed)
}

/// The category the text states explicitly, if any.
pub fn find_gender(text: &str) -> Option<Gender> {
    let tokens = tokenize(text);
    let has = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));

    if has(&["mixed", "pairs"]) || text.to_lowercase().contains("ice dance") {
        Some(Gender::Mixed)
    } else if has(&["women", "womens", "ladies", "female"]) {
        Some(Gender::Women)
    } else if has(&["men", "mens", "male"]) {
        Some(Gender::Men)
    } else {
        None
    }
}

/// Lowercase, drop apostrophes, turn every other separator into a space and
/// collapse runs of whitespace.
pub fn normalize_name(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized name with any leading gender words removed.
/// "Women's Downhill" → "downhill"
pub fn strip_gender_prefix(text: &str) -> String {
    let normalized = normalize_name(text);
    let words: Vec<&str> = normalized
        .split(' ')
        .skip_while(|w| GENDER_WORDS.contains(w))
        .collect();
    words.join(" ")
}

/// Words longer than two characters, used for keyword overlap.
pub fn keywords(text: &str) -> Vec<String> {
    tokenize(text).into_iter().filter(|t| t.len() > 2).collect()
}

fn tokenize(text: &str) -> Vec<String> {
    normalize_name(text)
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
