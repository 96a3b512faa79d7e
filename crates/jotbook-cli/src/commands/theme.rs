use crate::cli::ThemeCommands;
use crate::commands::common::AppContext;
use crate::error::CliError;

pub fn run_theme(context: &AppContext, command: Option<ThemeCommands>) -> Result<(), CliError> {
    let preferences = context.preferences();
    let dark_mode = match command.unwrap_or(ThemeCommands::Show) {
        ThemeCommands::Show => preferences.dark_mode()?,
        ThemeCommands::Dark => {
            preferences.set_dark_mode(true)?;
            true
        }
        ThemeCommands::Light => {
            preferences.set_dark_mode(false)?;
            false
        }
        ThemeCommands::Toggle => preferences.toggle_dark_mode()?,
    };

    println!("{}", theme_label(dark_mode));
    Ok(())
}

pub const fn theme_label(dark_mode: bool) -> &'static str {
    if dark_mode {
        "dark"
    } else {
        "light"
    }
}
