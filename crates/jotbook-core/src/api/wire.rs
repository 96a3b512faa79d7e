//! Wire payloads to canonical models.
//!
//! Each entity has exactly one decoding function. Known field aliases are
//! folded here; anything that cannot become a complete [`Note`] or [`Image`]
//! is reported as [`ApiError::InvalidResponse`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use crate::models::{Image, ImageId, Note, NoteId};
use crate::util::split_tags;

#[derive(Debug, Deserialize)]
struct RawNote {
    id: Option<Value>,
    title: Option<String>,
    content: Option<String>,
    description: Option<String>,
    tags: Option<RawTags>,
    tag: Option<RawTags>,
    images: Option<Vec<Value>>,
    #[serde(rename = "createdAt", alias = "created_at")]
    created_at: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

impl RawTags {
    fn into_tags(self) -> Vec<String> {
        match self {
            Self::List(tags) => tags
                .into_iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
            Self::Joined(raw) => split_tags(&raw),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawImage {
    id: Option<Value>,
    url: Option<String>,
    filename: Option<String>,
}

/// Body of the `note` part sent to the edit endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateBody<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub images_to_delete: Vec<i64>,
}

pub fn decode_note(value: Value) -> ApiResult<Note> {
    let raw: RawNote = serde_json::from_value(value)
        .map_err(|error| ApiError::InvalidResponse(format!("note: {error}")))?;

    let id = NoteId::new(decode_id(raw.id.as_ref(), "note")?);
    let title = raw
        .title
        .ok_or_else(|| ApiError::InvalidResponse(format!("note {id} has no title")))?;
    let content = raw
        .content
        .or(raw.description)
        .ok_or_else(|| ApiError::InvalidResponse(format!("note {id} has no content")))?;
    let tags = raw
        .tags
        .or(raw.tag)
        .map(RawTags::into_tags)
        .unwrap_or_default();
    let images = raw
        .images
        .unwrap_or_default()
        .into_iter()
        .map(decode_image)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Note {
        id,
        title,
        content,
        tags,
        images,
        created_at: raw.created_at.as_ref().and_then(decode_timestamp),
    })
}

pub fn decode_notes(value: Value) -> ApiResult<Vec<Note>> {
    expect_array(value, "note list")?
        .into_iter()
        .map(decode_note)
        .collect()
}

pub fn decode_image(value: Value) -> ApiResult<Image> {
    let raw: RawImage = serde_json::from_value(value)
        .map_err(|error| ApiError::InvalidResponse(format!("image: {error}")))?;

    let id = ImageId::new(decode_id(raw.id.as_ref(), "image")?);
    let url = raw
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidResponse(format!("image {id} has no url")))?;

    let mut image = Image::new(id, url);
    if let Some(filename) = raw.filename.filter(|name| !name.trim().is_empty()) {
        image.filename = filename;
    }
    Ok(image)
}

pub fn decode_images(value: Value) -> ApiResult<Vec<Image>> {
    expect_array(value, "image list")?
        .into_iter()
        .map(decode_image)
        .collect()
}

/// Parse a response body as JSON.
pub fn parse_body(bytes: &[u8]) -> ApiResult<Value> {
    serde_json::from_slice(bytes)
        .map_err(|error| ApiError::InvalidResponse(format!("body is not JSON: {error}")))
}

#[must_use]
pub fn encode_note_update<'a>(note: &'a Note, removed: &[ImageId]) -> NoteUpdateBody<'a> {
    NoteUpdateBody {
        title: &note.title,
        content: &note.content,
        tags: &note.tags,
        images_to_delete: removed.iter().map(|id| id.get()).collect(),
    }
}

fn expect_array(value: Value, what: &str) -> ApiResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ApiError::InvalidResponse(format!(
            "expected {what} array, got {}",
            kind(&other)
        ))),
    }
}

fn decode_id(value: Option<&Value>, what: &str) -> ApiResult<i64> {
    let id = match value {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(raw)) => raw.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| ApiError::InvalidResponse(format!("{what} is missing a numeric id")))
}

/// RFC 3339, a zone-less local timestamp, or epoch milliseconds.
fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
