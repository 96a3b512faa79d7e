use std::path::PathBuf;

use jotbook_core::{NewImage, NotePatch};

use crate::commands::common::{
    capture_editor_input_with_initial, collect_tags, parse_image_id, parse_note_id, AppContext,
};
use crate::error::CliError;

/// Flags accepted by `jot edit`
#[derive(Debug, Default)]
pub struct EditArgs {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
    pub remove_images: Vec<String>,
    pub add_image: Option<PathBuf>,
}

impl EditArgs {
    pub fn to_patch(&self) -> Result<NotePatch, CliError> {
        let tags = if self.clear_tags {
            Some(Vec::new())
        } else if self.tags.is_empty() {
            None
        } else {
            Some(collect_tags(&self.tags))
        };

        Ok(NotePatch {
            title: self.title.clone(),
            content: self.content.clone(),
            tags,
            remove_image_ids: self
                .remove_images
                .iter()
                .map(String::as_str)
                .map(parse_image_id)
                .collect::<Result<_, _>>()?,
        })
    }
}

pub async fn run_edit(context: &AppContext, id: &str, args: EditArgs) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let controller = context.note_list()?;
    let mut patch = args.to_patch()?;
    let new_image = args
        .add_image
        .as_deref()
        .map(NewImage::from_path)
        .transpose()?;

    if patch.is_empty() && new_image.is_none() {
        let note = controller.open(note_id).await?;
        let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
            return Err(CliError::EmptyEditedContent);
        };

        if edited_content == note.content {
            println!("{}", note.id);
            return Ok(());
        }
        patch.content = Some(edited_content);
    }

    let updated = controller.update(note_id, patch, new_image).await?;
    println!("{}", updated.id);
    Ok(())
}
