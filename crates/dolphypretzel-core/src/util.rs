//! Small shared helpers.

/// Trim text and cap it at 180 characters, for log and error payloads.
#[must_use]
pub fn compact_text(text: &str) -> String {
    text.trim().chars().take(180).collect()
}
