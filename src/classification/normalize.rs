use regex::Regex;
use std::sync::LazyLock;

/// Runs of non-breaking space, carriage return, line feed and tab.
static LAYOUT_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{a0}\r\n\t]+").unwrap());

/// Canonical display text for a raw text node.
///
/// Layout whitespace collapses to single spaces, the result is trimmed and its
/// first character upper-cased. Only that one character changes; see
/// [`title_case`] for the per-word variant. `None` passes through so callers
/// can apply their own default.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    raw.map(|text| capitalize_first(&clean_fragment(text)))
}

/// Collapse layout whitespace and trim, leaving case untouched.
pub fn clean_fragment(raw: &str) -> String {
    LAYOUT_WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// Non-breaking spaces become plain spaces, then trim.
pub fn clean_nbsp(raw: &str) -> String {
    raw.replace('\u{a0}', " ").trim().to_string()
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// A word starts at any letter that follows a non-letter, so `"tube,
/// tracheal (w/wo connector)"` becomes `"Tube, Tracheal (W/Wo Connector)"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
