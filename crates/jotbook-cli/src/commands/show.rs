use jotbook_core::NotesBackend;

use crate::commands::common::{format_note_details, parse_note_id, AppContext};
use crate::error::CliError;

pub async fn run_show(context: &AppContext, id: &str, as_json: bool) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    context.require_user()?;
    let api = context.notes_api();

    let mut note = api.get_note(note_id).await?;
    if note.images.is_empty() {
        note.images = api.list_images(note_id).await?;
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{}", format_note_details(&note));
    }
    Ok(())
}
