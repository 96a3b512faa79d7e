use std::path::Path;

use jotbook_core::NewImage;

use crate::cli::ImageCommands;
use crate::commands::common::{parse_image_id, parse_note_id, AppContext};
use crate::error::CliError;

pub async fn run_images(context: &AppContext, command: ImageCommands) -> Result<(), CliError> {
    match command {
        ImageCommands::List { note_id, json } => list_images(context, &note_id, json).await,
        ImageCommands::Add { note_id, path } => add_image(context, &note_id, &path).await,
        ImageCommands::Delete { note_id, image_id } => {
            let note_id = parse_note_id(&note_id)?;
            let image_id = parse_image_id(&image_id)?;
            context
                .note_list()?
                .remove_image(note_id, image_id)
                .await?;
            println!("{image_id}");
            Ok(())
        }
    }
}

async fn list_images(context: &AppContext, note_id: &str, as_json: bool) -> Result<(), CliError> {
    let note_id = parse_note_id(note_id)?;
    let images = context.note_list()?.refresh_images(note_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&images)?);
    } else if images.is_empty() {
        println!("Note {note_id} has no images");
    } else {
        for image in &images {
            println!("{:>6}  {:<32}  {}", image.id, image.filename, image.url);
        }
    }
    Ok(())
}

async fn add_image(context: &AppContext, note_id: &str, path: &Path) -> Result<(), CliError> {
    let note_id = parse_note_id(note_id)?;
    let controller = context.note_list()?;
    let image = NewImage::from_path(path)?;

    let uploaded = controller.add_image(note_id, image).await?;
    println!("{}  {}", uploaded.id, uploaded.url);
    Ok(())
}
