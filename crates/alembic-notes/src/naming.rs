//! Note file names and attachment ids
//!
//! Format: `{YYYY-MM-DD} - {title}.md`, then `{YYYY-MM-DD} - {title} (n).md`
//! on collision. Attachment folders are `{YYYY-MM-DD}_{8-hex}`.

use chrono::NaiveDate;
use uuid::Uuid;

/// Title used when a topic sanitizes to nothing
pub const UNTITLED: &str = "Untitled Insight";

/// Characters that are unsafe in file names on common filesystems
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip forbidden characters and surrounding whitespace.
pub fn sanitize_title(topic: &str) -> String {
    let cleaned: String = topic
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned.to_string()
    }
}

/// File name for attempt `n` (0 is the unsuffixed name).
pub fn note_file_name(date: NaiveDate, title: &str, n: u32) -> String {
    if n == 0 {
        format!("{} - {title}.md", date.format("%Y-%m-%d"))
    } else {
        format!("{} - {title} ({n}).md", date.format("%Y-%m-%d"))
    }
}

/// Fresh attachment folder id for a note written on `date`.
pub fn attachment_id(date: NaiveDate) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}_{}", date.format("%Y-%m-%d"), &simple[..8])
}
