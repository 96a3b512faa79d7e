//! Notes and image endpoints.

use std::future::Future;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};

use super::error::{ApiError, ApiResult};
use super::{read_json, read_text, require_json, wire, ApiClient};
use crate::models::{Image, ImageId, NewImage, Note, NoteDraft, NoteId};
use crate::session::SessionStore;
use crate::storage::KeyValueStore;
use crate::validation::ValidationErrors;

/// Operations the notes lifecycle needs from the backend.
pub trait NotesBackend: Send + Sync {
    fn list_notes(&self) -> impl Future<Output = ApiResult<Vec<Note>>> + Send;

    fn get_note(&self, id: NoteId) -> impl Future<Output = ApiResult<Note>> + Send;

    fn create_note(
        &self,
        draft: &NoteDraft,
        images: &[NewImage],
    ) -> impl Future<Output = ApiResult<Note>> + Send;

    /// Replace every field of `note` on the server.
    fn update_note(
        &self,
        note: &Note,
        removed_images: &[ImageId],
        new_images: &[NewImage],
    ) -> impl Future<Output = ApiResult<Note>> + Send;

    fn delete_note(&self, id: NoteId) -> impl Future<Output = ApiResult<()>> + Send;

    fn list_images(&self, note_id: NoteId) -> impl Future<Output = ApiResult<Vec<Image>>> + Send;

    fn add_image(
        &self,
        note_id: NoteId,
        image: &NewImage,
    ) -> impl Future<Output = ApiResult<Image>> + Send;

    fn delete_image(&self, image_id: ImageId) -> impl Future<Output = ApiResult<()>> + Send;
}

/// HTTP implementation of [`NotesBackend`] plus the calls views use directly.
#[derive(Debug, Clone)]
pub struct NotesApi<S: KeyValueStore> {
    client: ApiClient,
    session: SessionStore<S>,
}

impl<S: KeyValueStore> NotesApi<S> {
    pub const fn new(client: ApiClient, session: SessionStore<S>) -> Self {
        Self { client, session }
    }

    pub const fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    /// Server-side search; the backend matches the term against note content.
    pub async fn search_notes(&self, term: &str) -> ApiResult<Vec<Note>> {
        let term = term.trim();
        if term.is_empty() {
            let mut errors = ValidationErrors::default();
            errors.push("term", "Search term is required");
            return Err(errors.into());
        }
        let path = format!("/notes/search/{}", urlencoding::encode(term));
        let request = self.client.request(Method::GET, &path);
        let response = self.client.send_authenticated(&self.session, request).await?;
        read_json(response)
            .await?
            .map_or_else(|| Ok(Vec::new()), wire::decode_notes)
    }

    /// Download the rendered PDF for one note.
    pub async fn export_pdf(&self, id: NoteId) -> ApiResult<Vec<u8>> {
        let request = self
            .client
            .request(Method::GET, &format!("/pdf/{id}/export/pdf"))
            .header(reqwest::header::ACCEPT, "application/pdf");
        let response = self.client.send_authenticated(&self.session, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ApiError::from_transport(&error))?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidResponse("PDF export was empty".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

impl<S: KeyValueStore> NotesBackend for NotesApi<S> {
    async fn list_notes(&self) -> ApiResult<Vec<Note>> {
        let request = self.client.request(Method::GET, "/notes/get");
        let response = self.client.send_authenticated(&self.session, request).await?;
        read_json(response)
            .await?
            .map_or_else(|| Ok(Vec::new()), wire::decode_notes)
    }

    async fn get_note(&self, id: NoteId) -> ApiResult<Note> {
        let request = self.client.request(Method::GET, &format!("/notes/get/{id}"));
        let response = self.client.send_authenticated(&self.session, request).await?;
        wire::decode_note(require_json(response).await?)
    }

    async fn create_note(&self, draft: &NoteDraft, images: &[NewImage]) -> ApiResult<Note> {
        draft.validate()?;

        let mut form = Form::new()
            .text("title", draft.title.trim().to_string())
            .text("description", draft.content.clone())
            .text("tags", draft.joined_tags());
        if let Some(user_id) = self.session.current_user().and_then(|user| user.user_id) {
            form = form.text("userId", user_id.to_string());
        }
        for image in images {
            form = form.part("images", image_part(image)?);
        }

        let request = self.client.request(Method::POST, "/notes").multipart(form);
        let response = self.client.send_authenticated(&self.session, request).await?;
        wire::decode_note(require_json(response).await?)
    }

    async fn update_note(
        &self,
        note: &Note,
        removed_images: &[ImageId],
        new_images: &[NewImage],
    ) -> ApiResult<Note> {
        let body = serde_json::to_string(&wire::encode_note_update(note, removed_images))
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))?;
        let note_part = Part::text(body)
            .mime_str("application/json")
            .map_err(|error| ApiError::from_transport(&error))?;

        let mut form = Form::new().part("note", note_part);
        for image in new_images {
            form = form.part("images", image_part(image)?);
        }

        let request = self
            .client
            .request(Method::PUT, &format!("/notes/editdeep/{}", note.id))
            .multipart(form);
        let response = self.client.send_authenticated(&self.session, request).await?;
        wire::decode_note(require_json(response).await?)
    }

    async fn delete_note(&self, id: NoteId) -> ApiResult<()> {
        let request = self
            .client
            .request(Method::DELETE, &format!("/notes/delete/{id}"));
        let response = self.client.send_authenticated(&self.session, request).await?;
        let confirmation = read_text(response).await?;
        tracing::debug!("Deleted note {}: {}", id, confirmation);
        Ok(())
    }

    async fn list_images(&self, note_id: NoteId) -> ApiResult<Vec<Image>> {
        let request = self
            .client
            .request(Method::GET, &format!("/image/note/{note_id}"));
        match self.client.send_authenticated(&self.session, request).await {
            Ok(response) => read_json(response)
                .await?
                .map_or_else(|| Ok(Vec::new()), wire::decode_images),
            // The backend answers 404 when a note simply has no images.
            Err(ApiError::Backend { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    async fn add_image(&self, note_id: NoteId, image: &NewImage) -> ApiResult<Image> {
        let form = Form::new().part("image", image_part(image)?);
        let request = self
            .client
            .request(Method::POST, &format!("/image/{note_id}/images"))
            .multipart(form);
        let response = self.client.send_authenticated(&self.session, request).await?;
        wire::decode_image(require_json(response).await?)
    }

    async fn delete_image(&self, image_id: ImageId) -> ApiResult<()> {
        let request = self
            .client
            .request(Method::DELETE, &format!("/image/delete/{image_id}"));
        self.client
            .send_authenticated(&self.session, request)
            .await
            .map(drop)
    }
}

fn image_part(image: &NewImage) -> ApiResult<Part> {
    Part::bytes(image.bytes.clone())
        .file_name(image.filename.clone())
        .mime_str(&image.content_type)
        .map_err(|_| {
            let mut errors = ValidationErrors::default();
            errors.push(
                "images",
                format!(
                    "{} has an unsupported content type '{}'",
                    image.filename, image.content_type
                ),
            );
            ApiError::Validation(errors)
        })
}
