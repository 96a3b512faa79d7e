use crate::commands::common::{
    format_note_lines, load_notes, normalize_search_query, note_to_list_item, AppContext,
    NoteListItem,
};
use crate::error::CliError;

pub async fn run_search(
    context: &AppContext,
    query: &str,
    remote: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let notes = if remote {
        context.require_user()?;
        context.notes_api().search_notes(&normalized_query).await?
    } else {
        load_notes(context, Some(&normalized_query)).await?
    };

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
