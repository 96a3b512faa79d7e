use std::path::PathBuf;

use jotbook_core::NoteDraft;

use crate::commands::common::{collect_tags, read_images, resolve_note_content, AppContext};
use crate::error::CliError;

pub async fn run_add(
    context: &AppContext,
    title: &str,
    content_parts: &[String],
    tags: &[String],
    image_paths: &[PathBuf],
) -> Result<(), CliError> {
    let controller = context.note_list()?;
    let images = read_images(image_paths)?;
    let content = resolve_note_content(content_parts)?;
    let draft = NoteDraft::new(title.trim(), content).with_tags(collect_tags(tags));

    let note = controller.create(draft, images).await?;
    println!("{}", note.id);
    Ok(())
}
