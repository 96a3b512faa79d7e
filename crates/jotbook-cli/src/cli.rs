use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "Your notes, tags and images from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name (backend URL, timeout, stored session)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, register, or manage the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// List notes
    #[command(alias = "ls")]
    List {
        /// Only show notes whose title or content contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search notes
    Search {
        /// Search text
        query: String,
        /// Ask the server instead of filtering locally (matches note content only)
        #[arg(long)]
        remote: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one note with its images
    Show {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        #[arg(short, long)]
        title: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Image file to upload with the note (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
        /// Note content (stdin or $EDITOR when omitted)
        content: Vec<String>,
    },
    /// Edit an existing note
    Edit {
        /// Note ID
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New content (opens $EDITOR when no other change is given)
        #[arg(short, long)]
        content: Option<String>,
        /// Replace tags with these (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
        /// Image ID to remove (repeatable)
        #[arg(long = "remove-image", value_name = "IMAGE_ID")]
        remove_images: Vec<String>,
        /// Image file to add
        #[arg(long = "add-image", value_name = "PATH")]
        add_image: Option<PathBuf>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID
        id: String,
    },
    /// Manage note images
    Images {
        #[command(subcommand)]
        command: ImageCommands,
    },
    /// Export notes
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Only export notes matching this filter
        #[arg(short, long)]
        filter: Option<String>,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Download a note as PDF
    Pdf {
        /// Note ID
        id: String,
        /// Output path (defaults to note-<id>.pdf)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Show or change the dark-mode preference
    Theme {
        #[command(subcommand)]
        command: Option<ThemeCommands>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in and store the session token in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password (falls back to $JOTBOOK_PASSWORD)
        #[arg(long, value_name = "PASSWORD")]
        password: Option<String>,
    },
    /// Create an account
    Register {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Password, at least 6 characters
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Password again
        #[arg(long, value_name = "PASSWORD")]
        confirm_password: String,
    },
    /// Request a password reset mail
    ForgotPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Show who is signed in
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign out and clear the stored session
    Logout,
}

#[derive(Subcommand)]
pub enum ImageCommands {
    /// List images attached to a note
    List {
        /// Note ID
        note_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload an image to a note
    Add {
        /// Note ID
        note_id: String,
        /// Image file
        path: PathBuf,
    },
    /// Remove an image from a note
    Delete {
        /// Note ID
        note_id: String,
        /// Image ID
        image_id: String,
    },
}

#[derive(Clone, Copy, Subcommand, Debug, Eq, PartialEq)]
pub enum ThemeCommands {
    /// Print the current preference
    Show,
    /// Turn dark mode on
    Dark,
    /// Turn dark mode off
    Light,
    /// Flip the current preference
    Toggle,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Backend base URL (e.g. <http://localhost:8080>)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the effective configuration for a profile
    Show,
}
