//! Markdown note output for Alembic.
//!
//! [`MarkdownNoteWriter`] turns an [`alembic_core::InsightRecord`] into a
//! dated markdown note with YAML frontmatter and copies any scraped images
//! into the vault's attachment folder.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod markdown;
pub mod naming;
mod writer;

pub use markdown::{render_note, NoteContext};
pub use naming::{sanitize_title, UNTITLED};
pub use writer::MarkdownNoteWriter;
