//! Insight note rendering

use crate::naming::UNTITLED;
use alembic_core::InsightRecord;
use chrono::NaiveDate;
use std::fmt::Write;

/// Everything needed to render one note besides the record itself.
#[derive(Debug, Clone)]
pub struct NoteContext<'a> {
    /// Write date, shown in the frontmatter
    pub date: NaiveDate,
    /// Original dropped file name
    pub source: &'a str,
    /// Vault-relative embed targets, already in display order
    pub attachments: &'a [String],
}

/// Render `record` as an Obsidian-style markdown note.
pub fn render_note(record: &InsightRecord, ctx: &NoteContext<'_>) -> String {
    let mut out = String::new();
    let topic = if record.topic.trim().is_empty() {
        UNTITLED
    } else {
        record.topic.as_str()
    };

    let _ = writeln!(out, "---");
    let _ = writeln!(out, "date: {}", ctx.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "source: {}", ctx.source);
    let _ = writeln!(out, "tags: [{}]", record.tags.join(", "));
    let _ = writeln!(out, "status: unverified");
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "# {topic}\n");

    let _ = writeln!(out, "## Context\n{}\n", record.problem_context);
    let _ = writeln!(out, "## The Solution\n{}", record.solution_insight);

    if let Some(snippet) = record.code_snippet() {
        let _ = writeln!(out, "\n## Artifacts\n```\n{snippet}\n```");
    }

    if !ctx.attachments.is_empty() {
        let _ = writeln!(out, "\n## Attachments");
        for target in ctx.attachments {
            let _ = writeln!(out, "![[{target}]]");
        }
    }

    let _ = writeln!(out, "\n## Blog Post draft\n{}", record.blog_post);
    out
}
