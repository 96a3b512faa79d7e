use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use jotbook_core::{Image, ImageId, Note, NoteId, NotePatch, Preferences};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::cli::{AuthCommands, Cli, Commands, CompletionShell, ExportFormat, ThemeCommands};
use crate::commands::common::{
    collect_tags, default_editor, format_note_details, format_note_lines, format_relative_time,
    normalize_content, normalize_search_query, note_preview, note_title, note_to_list_item,
    parse_image_id, parse_note_id,
};
use crate::commands::auth_cmd::resolve_password;
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::apply_profile_init;
use crate::commands::edit::EditArgs;
use crate::commands::export::{resolve_export_path, write_export};
use crate::commands::pdf::default_pdf_path;
use crate::commands::theme::theme_label;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;
use crate::storage::KeyringStorage;

fn note(id: i64, title: &str, content: &str, tags: &[&str]) -> Note {
    Note {
        id: NoteId::new(id),
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        images: Vec::new(),
        created_at: DateTime::from_timestamp(1_700_000_000, 0),
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn normalize_search_query_rejects_blank() {
    assert!(matches!(
        normalize_search_query("   "),
        Err(CliError::EmptySearchQuery)
    ));
    assert_eq!(normalize_search_query(" tent ").unwrap(), "tent");
}

#[test]
fn note_ids_must_be_numeric() {
    assert_eq!(parse_note_id(" 42 ").unwrap(), NoteId::new(42));
    assert!(matches!(
        parse_note_id("abc"),
        Err(CliError::InvalidNoteId(raw)) if raw == "abc"
    ));
    assert_eq!(parse_image_id("7").unwrap(), ImageId::new(7));
    assert!(matches!(parse_image_id(""), Err(CliError::InvalidImageId(_))));
}

#[test]
fn note_preview_uses_first_line_and_truncates() {
    let sample = note(1, "Trip", "Pack   the tent and the\nsecond line", &[]);
    assert_eq!(note_preview(&sample, 80), "Pack the tent and the");
    assert_eq!(note_preview(&sample, 10), "Pack th...");
}

#[test]
fn note_title_falls_back_to_content() {
    let untitled = note(1, "  ", "First line\nmore", &[]);
    assert_eq!(note_title(&untitled, 32), "First line");
}

#[test]
fn format_relative_time_buckets() {
    let now = Utc::now();
    assert_eq!(format_relative_time(now, now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
    assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
    assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
    assert_eq!(format_relative_time(now - Duration::days(400), now), "1y ago");
    assert_eq!(format_relative_time(now + Duration::hours(1), now), "just now");
}

#[test]
fn format_note_lines_include_id_title_and_sorted_tags() {
    let lines = format_note_lines(&[note(7, "Groceries", "Milk", &["shop", "home"])]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("     7  Groceries"));
    assert!(lines[0].ends_with("#home #shop"));
}

#[test]
fn note_details_list_images() {
    let mut sample = note(3, "Trip", "Pack the tent", &["camp"]);
    sample.images.push(Image::new(
        ImageId::new(9),
        "http://localhost:8080/image/tent.png",
    ));

    let details = format_note_details(&sample);
    assert!(details.starts_with("# Trip\nid: 3\n"));
    assert!(details.contains("tags: #camp"));
    assert!(details.contains("image 9: tent.png (http://localhost:8080/image/tent.png)"));
    assert!(details.ends_with("\n\nPack the tent"));
}

#[test]
fn note_list_item_serializes_created_at() {
    let item = note_to_list_item(&note(2, "A", "B", &["z", "a"]));
    assert_eq!(item.id, 2);
    assert_eq!(item.tags, vec!["a", "z"]);
    assert_eq!(item.created_at.as_deref(), Some("2023-11-14T22:13:20+00:00"));
}

#[test]
fn collect_tags_splits_commas_and_dedups() {
    let tags = collect_tags(&["work, urgent".to_string(), "work".to_string(), " ".to_string()]);
    assert_eq!(tags, vec!["work", "urgent"]);
}

#[test]
fn edit_args_build_a_patch() {
    let args = EditArgs {
        title: Some("New".to_string()),
        tags: vec!["a,b".to_string()],
        remove_images: vec!["4".to_string()],
        ..EditArgs::default()
    };
    assert_eq!(
        args.to_patch().unwrap(),
        NotePatch {
            title: Some("New".to_string()),
            content: None,
            tags: Some(vec!["a".to_string(), "b".to_string()]),
            remove_image_ids: vec![ImageId::new(4)],
        }
    );

    let cleared = EditArgs {
        clear_tags: true,
        ..EditArgs::default()
    };
    assert_eq!(cleared.to_patch().unwrap().tags, Some(Vec::new()));
    assert!(EditArgs::default().to_patch().unwrap().is_empty());

    let bad = EditArgs {
        remove_images: vec!["x".to_string()],
        ..EditArgs::default()
    };
    assert!(bad.to_patch().is_err());
}

#[test]
fn cli_parses_add_with_tags_and_images() {
    let cli = Cli::try_parse_from([
        "jot", "--profile", "work", "add", "--title", "Trip", "--tag", "camp", "--image",
        "tent.png", "Pack", "the", "tent",
    ])
    .unwrap();

    assert_eq!(cli.profile.as_deref(), Some("work"));
    let Commands::Add {
        title,
        tags,
        images,
        content,
    } = cli.command
    else {
        panic!("expected add command");
    };
    assert_eq!(title, "Trip");
    assert_eq!(tags, vec!["camp"]);
    assert_eq!(images, vec![PathBuf::from("tent.png")]);
    assert_eq!(content, vec!["Pack", "the", "tent"]);
}

#[test]
fn cli_parses_auth_and_theme() {
    let cli = Cli::try_parse_from([
        "jot", "auth", "login", "--email", "a@b.com", "--password", "secret1",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Auth {
            command: AuthCommands::Login { ref email, .. }
        } if email == "a@b.com"
    ));

    let cli = Cli::try_parse_from(["jot", "theme", "toggle"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Theme {
            command: Some(ThemeCommands::Toggle)
        }
    ));
}

#[test]
fn cli_rejects_conflicting_tag_flags() {
    assert!(Cli::try_parse_from(["jot", "edit", "1", "--tag", "a", "--clear-tags"]).is_err());
}

#[test]
fn cli_export_defaults_to_json() {
    let cli = Cli::try_parse_from(["jot", "export"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Export {
            format: ExportFormat::Json,
            filter: None,
            output: None
        }
    ));
}

#[test]
fn write_export_writes_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("notes.json");

    write_export(
        &[note(1, "Trip", "Pack the tent", &["camp"])],
        ExportFormat::Json,
        Some(&path),
    )
    .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed[0]["title"], "Trip");
    assert_eq!(parsed[0]["tags"][0], "camp");
}

#[test]
fn write_export_writes_markdown_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");

    write_export(
        &[note(1, "Trip", "Pack the tent", &[])],
        ExportFormat::Markdown,
        Some(&path),
    )
    .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("# Trip"));
    assert!(written.ends_with("Pack the tent\n"));
}

#[test]
fn export_into_directory_uses_suggested_name() {
    let dir = tempdir().unwrap();
    assert_eq!(
        resolve_export_path(dir.path(), ExportFormat::Markdown, 123),
        dir.path().join("jotbook-export-123.md")
    );

    let file = dir.path().join("mine.json");
    assert_eq!(resolve_export_path(&file, ExportFormat::Json, 123), file);
}

#[test]
fn completions_mention_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("jot"));

    let dir = tempdir().unwrap();
    let path = dir.path().join("jot.fish");
    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    assert!(!std::fs::read(&path).unwrap().is_empty());
}

#[test]
fn config_init_validates_and_activates() {
    let mut config = CliProfilesConfig::default();
    apply_profile_init(
        &mut config,
        "work",
        Some(" https://notes.example.com/ ".to_string()),
        Some(20),
        false,
    )
    .unwrap();

    let profile = config.profile("work").unwrap();
    assert_eq!(profile.api_base_url.as_deref(), Some("https://notes.example.com"));
    assert_eq!(profile.timeout_secs, Some(20));
    assert_eq!(config.active_profile.as_deref(), Some("work"));

    apply_profile_init(&mut config, "home", None, None, true).unwrap();
    assert_eq!(config.active_profile.as_deref(), Some("work"));

    assert!(apply_profile_init(&mut config, "work", Some("ftp://x".to_string()), None, true).is_err());
    assert!(apply_profile_init(&mut config, "work", None, Some(0), true).is_err());
}

#[test]
fn theme_preference_persists_per_profile() {
    let preferences = Preferences::new(KeyringStorage::in_memory("cli-test-theme"));
    preferences.set_dark_mode(false).unwrap();
    assert_eq!(theme_label(preferences.dark_mode().unwrap()), "light");
    assert!(preferences.toggle_dark_mode().unwrap());

    let reopened = Preferences::new(KeyringStorage::in_memory("cli-test-theme"));
    assert_eq!(theme_label(reopened.dark_mode().unwrap()), "dark");
}

#[test]
fn default_pdf_path_uses_note_id() {
    assert_eq!(default_pdf_path("12"), PathBuf::from("note-12.pdf"));
}

#[test]
fn auth_errors_suggest_logging_in() {
    assert!(CliError::NotLoggedIn.is_auth());
    assert!(CliError::Api(jotbook_core::ApiError::Unauthenticated("gone".to_string())).is_auth());
    assert!(!CliError::EmptyContent.is_auth());
}

#[test]
fn login_password_falls_back_to_env() {
    assert_eq!(
        resolve_password(Some("flag".to_string()), Some("env".to_string())).unwrap(),
        "flag"
    );
    assert_eq!(
        resolve_password(Some(String::new()), Some("env".to_string())).unwrap(),
        "env"
    );
    assert!(matches!(
        resolve_password(None, None),
        Err(CliError::MissingPassword)
    ));
}
