use super::text::{strip_html, words};

pub const FORMATTING_ONLY_SUMMARY: &str = "Formatting changes only";
pub const TEXT_CHANGES_SUMMARY: &str = "Text changes";

/// Word-count delta that has to be exceeded before a save is described
/// as an addition or a removal.
const WORD_DELTA_THRESHOLD: i64 = 3;

/// Coarse, human-readable description of what changed between two
/// template bodies. Only the visible word count is compared.
pub fn summarize(old_html: &str, new_html: &str) -> String {
    let old_text = strip_html(old_html);
    let new_text = strip_html(new_html);

    if old_text == new_text {
        return FORMATTING_ONLY_SUMMARY.to_string();
    }

    let delta = words(&new_text).len() as i64 - words(&old_text).len() as i64;
    if delta > WORD_DELTA_THRESHOLD {
        format!("~{} words added", delta)
    } else if delta < -WORD_DELTA_THRESHOLD {
        format!("~{} words removed", delta.abs())
    } else {
        TEXT_CHANGES_SUMMARY.to_string()
    }
}

/// Join a caller supplied description with the computed summary:
/// `"{description} ({summary lowercased})"` when both are present.
pub fn combine_change_description(description: Option<&str>, summary: Option<&str>) -> String {
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    match (description, summary) {
        (Some(d), Some(s)) => format!("{} ({})", d, s.to_lowercase()),
        (Some(d), None) => d.to_string(),
        (None, Some(s)) => s.to_string(),
        (None, None) => TEXT_CHANGES_SUMMARY.to_string(),
    }
}
