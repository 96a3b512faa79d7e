use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use jotbook_core::{
    ApiClient, AuthApi, ImageId, NewImage, Note, NoteId, NoteListController, NotesApi,
    Preferences, SessionStore, SessionUser,
};
use serde::Serialize;

use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;
use crate::storage::KeyringStorage;

/// Everything one `jot` invocation needs to talk to the backend.
pub struct AppContext {
    pub profile: String,
    pub storage: KeyringStorage,
    pub session: SessionStore<KeyringStorage>,
    pub client: ApiClient,
}

impl AppContext {
    /// Resolve the profile and restore whatever session its keychain holds.
    pub fn load(explicit_profile: Option<&str>) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile = config.resolve_profile_name(explicit_profile);
        let client_config = config
            .profile(&profile)
            .cloned()
            .unwrap_or_default()
            .client_config()?;
        tracing::debug!(
            "Using profile '{}' against {}",
            profile,
            client_config.api_base_url
        );

        let storage = KeyringStorage::new(&profile);
        let session = SessionStore::new(storage.clone());
        let client = ApiClient::new(client_config)?;
        Ok(Self {
            profile,
            storage,
            session,
            client,
        })
    }

    pub fn require_user(&self) -> Result<SessionUser, CliError> {
        self.session.current_user().ok_or(CliError::NotLoggedIn)
    }

    pub fn auth_api(&self) -> AuthApi<KeyringStorage> {
        AuthApi::new(self.client.clone(), self.session.clone())
    }

    pub fn notes_api(&self) -> NotesApi<KeyringStorage> {
        NotesApi::new(self.client.clone(), self.session.clone())
    }

    /// A note list controller for a signed-in user.
    pub fn note_list(&self) -> Result<NoteListController<NotesApi<KeyringStorage>>, CliError> {
        if !self.session.is_authenticated() {
            return Err(CliError::NotLoggedIn);
        }
        Ok(NoteListController::new(self.notes_api()))
    }

    pub fn preferences(&self) -> Preferences<KeyringStorage> {
        Preferences::new(self.storage.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: i64,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub created_at: Option<String>,
    pub relative_time: Option<String>,
    pub tags: Vec<String>,
    pub image_count: usize,
}

/// Load every note, optionally narrowed by a local filter.
pub async fn load_notes(context: &AppContext, filter: Option<&str>) -> Result<Vec<Note>, CliError> {
    let controller = context.note_list()?;
    controller.load_all().await?;
    if let Some(term) = filter {
        controller.apply_filter(term);
    }
    Ok(controller.snapshot().filtered)
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now = Utc::now();
    notes
        .iter()
        .map(|note| {
            let id = note.id.to_string();
            let title = note_title(note, 32);
            let preview = note_preview(note, 40);
            let relative_time = note
                .created_at
                .map(|at| format_relative_time(at, now))
                .unwrap_or_default();
            let tags = render_tags(note);

            if tags.is_empty() {
                format!("{id:>6}  {title:<32}  {preview:<40}  {relative_time}")
            } else {
                format!("{id:>6}  {title:<32}  {preview:<40}  {relative_time:<10}  {tags}")
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now = Utc::now();
    let mut tags = note.tags.clone();
    tags.sort();

    NoteListItem {
        id: note.id.get(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        created_at: note.created_at.map(|at| at.to_rfc3339()),
        relative_time: note.created_at.map(|at| format_relative_time(at, now)),
        tags,
        image_count: note.images.len(),
    }
}

/// Multi-line rendering used by `jot show`.
pub fn format_note_details(note: &Note) -> String {
    let mut lines = vec![format!("# {}", note.title), format!("id: {}", note.id)];
    if let Some(created_at) = note.created_at {
        lines.push(format!(
            "created: {}",
            created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    let tags = render_tags(note);
    if !tags.is_empty() {
        lines.push(format!("tags: {tags}"));
    }
    for image in &note.images {
        lines.push(format!("image {}: {} ({})", image.id, image.filename, image.url));
    }
    lines.push(String::new());
    lines.push(note.content.clone());
    lines.join("\n")
}

pub fn note_title(note: &Note, max_chars: usize) -> String {
    truncate_chars(&note.title_preview(usize::MAX), max_chars)
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn render_tags(note: &Note) -> String {
    let mut tags = note.tags.clone();
    tags.sort();
    tags.into_iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp).num_seconds().max(0);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn parse_note_id(raw: &str) -> Result<NoteId, CliError> {
    raw.parse::<NoteId>()
        .map_err(|_| CliError::InvalidNoteId(raw.trim().to_string()))
}

pub fn parse_image_id(raw: &str) -> Result<ImageId, CliError> {
    raw.parse::<ImageId>()
        .map_err(|_| CliError::InvalidImageId(raw.trim().to_string()))
}

pub fn read_images(paths: &[PathBuf]) -> Result<Vec<NewImage>, CliError> {
    paths
        .iter()
        .map(|path| NewImage::from_path(path).map_err(CliError::from))
        .collect()
}

/// Tags from repeated `--tag` flags; each flag may also hold a comma list.
pub fn collect_tags(values: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for tag in values.iter().flat_map(|value| jotbook_core::util::split_tags(value)) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input_with_initial("")? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("jotbook-note-{}-{now}.md", std::process::id()))
}

/// Write `bytes` to `path`, or to stdout when no path is given.
pub fn write_output(bytes: &[u8], path: Option<&Path>) -> Result<(), CliError> {
    use std::io::Write as _;

    if let Some(path) = path {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
    }
    Ok(())
}
