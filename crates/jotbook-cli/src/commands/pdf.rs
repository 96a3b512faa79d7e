use std::path::{Path, PathBuf};

use crate::commands::common::{parse_note_id, write_output, AppContext};
use crate::error::CliError;

pub async fn run_pdf(
    context: &AppContext,
    id: &str,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    context.require_user()?;

    let bytes = context.notes_api().export_pdf(note_id).await?;
    let path = output_path.map_or_else(|| default_pdf_path(&note_id.to_string()), Path::to_path_buf);
    write_output(&bytes, Some(&path))?;
    println!("{}", path.display());
    Ok(())
}

pub fn default_pdf_path(note_id: &str) -> PathBuf {
    PathBuf::from(format!("note-{note_id}.pdf"))
}
