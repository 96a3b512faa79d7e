use crate::commands::common::{parse_note_id, AppContext};
use crate::error::CliError;

pub async fn run_delete(context: &AppContext, id: &str) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let controller = context.note_list()?;

    controller.remove(note_id).await?;
    println!("{note_id}");
    Ok(())
}
