use serde::Serialize;

use crate::cli::AuthCommands;
use crate::commands::common::AppContext;
use crate::error::CliError;

pub const PASSWORD_ENV: &str = "JOTBOOK_PASSWORD";

#[derive(Debug, Serialize)]
struct AuthStatus<'a> {
    profile: &'a str,
    signed_in: bool,
    email: Option<String>,
    user_id: Option<i64>,
    expires_at: Option<String>,
}

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    let auth = context.auth_api();

    match command {
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password, std::env::var(PASSWORD_ENV).ok())?;
            let user = auth.login(&email, &password).await?;
            println!(
                "Signed in profile '{}' as {}",
                context.profile, user.email
            );
        }
        AuthCommands::Register {
            email,
            password,
            confirm_password,
        } => {
            let message = auth.register(&email, &password, &confirm_password).await?;
            println!("{}", non_empty_or(&message, "Account created"));
            println!("Run `jot auth login --email {}` to sign in.", email.trim());
        }
        AuthCommands::ForgotPassword { email } => {
            let message = auth.forgot_password(&email).await?;
            println!(
                "{}",
                non_empty_or(&message, "If the account exists, a reset mail is on its way")
            );
        }
        AuthCommands::Status { json } => {
            let user = context.session.current_user();
            if json {
                let status = AuthStatus {
                    profile: &context.profile,
                    signed_in: user.is_some(),
                    email: user.as_ref().map(|user| user.email.clone()),
                    user_id: user.as_ref().and_then(|user| user.user_id),
                    expires_at: user
                        .as_ref()
                        .and_then(jotbook_core::SessionUser::expires_at_utc)
                        .map(|at| at.to_rfc3339()),
                };
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else if let Some(user) = user {
                let expires = user
                    .expires_at_utc()
                    .map_or_else(|| user.expires_at.to_string(), |at| at.to_rfc3339());
                println!(
                    "Profile '{}' is signed in as {} (expires_at={expires})",
                    context.profile, user.email
                );
            } else {
                println!("Profile '{}' is not signed in.", context.profile);
            }
        }
        AuthCommands::Logout => {
            auth.logout().await;
            println!("Signed out profile '{}'", context.profile);
        }
    }

    Ok(())
}

fn non_empty_or<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    let message = message.trim();
    if message.is_empty() {
        fallback
    } else {
        message
    }
}

/// `--password` wins over the environment; an empty value counts as missing.
pub fn resolve_password(
    explicit: Option<String>,
    from_env: Option<String>,
) -> Result<String, CliError> {
    explicit
        .filter(|password| !password.is_empty())
        .or_else(|| from_env.filter(|password| !password.is_empty()))
        .ok_or(CliError::MissingPassword)
}
