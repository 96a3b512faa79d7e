use std::path::{Path, PathBuf};

use jotbook_core::export::{
    render_notes_export, suggested_export_file_name, ExportFormat as RenderFormat,
};
use jotbook_core::util::unix_timestamp_now;
use jotbook_core::Note;

use crate::cli::ExportFormat;
use crate::commands::common::{load_notes, write_output, AppContext};
use crate::error::CliError;

pub async fn run_export(
    context: &AppContext,
    format: ExportFormat,
    filter: Option<&str>,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let notes = load_notes(context, filter).await?;
    let output_path = output_path.map(|path| resolve_export_path(path, format, unix_timestamp_now()));
    write_export(&notes, format, output_path.as_deref())?;
    if let Some(path) = output_path {
        println!("{}", path.display());
    }
    Ok(())
}

/// Render `notes` and write them to `output_path` (stdout when `None`).
pub fn write_export(
    notes: &[Note],
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let mut rendered = render_notes_export(notes, render_format(format))?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    write_output(rendered.as_bytes(), output_path)
}

/// An existing directory gets a timestamped file name inside it.
pub fn resolve_export_path(path: &Path, format: ExportFormat, timestamp: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(render_format(format), timestamp))
    } else {
        path.to_path_buf()
    }
}

const fn render_format(format: ExportFormat) -> RenderFormat {
    match format {
        ExportFormat::Json => RenderFormat::Json,
        ExportFormat::Markdown => RenderFormat::Markdown,
    }
}
