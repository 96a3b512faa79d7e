use crate::commands::common::{
    format_note_lines, load_notes, note_to_list_item, AppContext, NoteListItem,
};
use crate::error::CliError;

pub async fn run_list(
    context: &AppContext,
    filter: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let notes = load_notes(context, filter).await?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes found");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
