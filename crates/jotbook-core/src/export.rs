//! Note export helpers shared by the CLI commands.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::Note;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable note representation used in JSON and Markdown exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNote {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    /// RFC 3339, when known
    pub created_at: Option<String>,
}

/// Convert a note into an export record with stable tag ordering.
#[must_use]
pub fn note_to_export_item(note: &Note) -> ExportNote {
    let mut tags = note.tags.clone();
    tags.sort();
    tags.dedup();

    ExportNote {
        id: note.id.get(),
        title: note.title.clone(),
        content: note.content.clone(),
        tags,
        images: note.images.iter().map(|image| image.url.clone()).collect(),
        created_at: note.created_at.map(|at| at.to_rfc3339()),
    }
}

/// Render notes as pretty-printed JSON.
pub fn render_json_export(notes: &[Note]) -> serde_json::Result<String> {
    let items = notes
        .iter()
        .map(note_to_export_item)
        .collect::<Vec<ExportNote>>();
    serde_json::to_string_pretty(&items)
}

/// Render notes in Markdown, one frontmatter block per note.
#[must_use]
pub fn render_markdown_export(notes: &[Note]) -> String {
    let mut output = String::new();

    for (index, note) in notes.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let export_note = note_to_export_item(note);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", export_note.id);
        if let Some(created_at) = &export_note.created_at {
            let _ = writeln!(output, "created_at: {created_at}");
        }
        let _ = writeln!(output, "tags:");
        for tag in &export_note.tags {
            let _ = writeln!(output, "  - {tag}");
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        let _ = writeln!(output, "# {}", export_note.title);
        let _ = writeln!(output);
        output.push_str(&export_note.content);
        output.push('\n');
        if !export_note.images.is_empty() {
            let _ = writeln!(output);
            for (position, url) in export_note.images.iter().enumerate() {
                let _ = writeln!(output, "![image {}]({url})", position + 1);
            }
        }
    }

    output
}

/// Render notes based on selected export format.
pub fn render_notes_export(notes: &[Note], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(notes),
        ExportFormat::Markdown => Ok(render_markdown_export(notes)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp: i64) -> String {
    format!("jotbook-export-{timestamp}.{}", format.extension())
}
