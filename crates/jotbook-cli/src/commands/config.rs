use jotbook_core::config::normalize_base_url;
use jotbook_core::util::normalize_text_option;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    profile: &'a str,
    active: bool,
    api_base_url: String,
    timeout_secs: u64,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_url,
            timeout_secs,
            no_activate,
        } => run_config_init(global_profile, api_url, timeout_secs, no_activate),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    apply_profile_init(&mut config, &profile_name, api_url, timeout_secs, no_activate)?;

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    println!("Run `jot auth login --email <email>` to sign in.");
    Ok(())
}

/// Merge explicit values into `profile_name`, validating them first.
pub fn apply_profile_init(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let api_url = normalize_text_option(api_url)
        .map(|url| normalize_base_url(&url))
        .transpose()?;
    if timeout_secs == Some(0) {
        return Err(CliError::Config(
            "timeout_secs must be a positive number of seconds".to_string(),
        ));
    }

    let profile = config.profile_mut_or_default(profile_name);
    if let Some(url) = api_url {
        profile.api_base_url = Some(url);
    }
    if let Some(secs) = timeout_secs {
        profile.timeout_secs = Some(secs);
    }

    if !no_activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let effective = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .client_config()?;

    let shown = EffectiveConfig {
        profile: &profile_name,
        active: config.active_profile.as_deref() == Some(profile_name.as_str()),
        api_base_url: effective.api_base_url,
        timeout_secs: effective.request_timeout.as_secs(),
    };
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
