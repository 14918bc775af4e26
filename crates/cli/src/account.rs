//! `reconsole login` / `logout` / `whoami` — credential management.
//!
//! Tokens live in ~/.config/reconsole/auth.json; every other command picks
//! them up from there.

use std::io::{self, Write};

use reconsole_api_client::{
    auth_file_path, delete_auth, load_auth, save_auth, ApiClient, ApiError, AuthCredentials,
};

use crate::config;
use crate::exit_codes::{EXIT_AUTH_REJECTED, EXIT_ERROR, EXIT_USAGE};
use crate::CliError;

pub fn cmd_login(
    email: Option<String>,
    password: Option<String>,
    token: Option<String>,
    api_base: Option<String>,
) -> Result<(), CliError> {
    // Resolve base URL: flag > config file > error
    let api_base = match api_base.or_else(|| config::load_defaults().api_base) {
        Some(b) => b,
        None => {
            return Err(CliError {
                code: EXIT_USAGE,
                message: "No API base URL configured".into(),
                hint: Some(
                    "pass --api-base or set api_base in ~/.config/reconsole/config.toml".into(),
                ),
            });
        }
    };

    // A pre-issued token skips the password exchange entirely.
    let creds = if let Some(token) = token {
        AuthCredentials::new(token, api_base)
    } else {
        let email = match email {
            Some(e) => e,
            None => prompt("Email: ")?,
        };
        let password = match password {
            Some(p) => p,
            None => prompt("Password: ")?,
        };
        ApiClient::login(&api_base, &email, &password).map_err(login_error)?
    };

    // Verify before saving, and pick up the account email for display.
    let client = ApiClient::new(creds.clone());
    let user = client.verify_token().map_err(login_error)?;

    let creds = AuthCredentials {
        email: Some(user.email.clone()),
        ..creds
    };
    save_auth(&creds).map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;

    eprintln!("Authenticated as {}", user.email);
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    let had_creds = load_auth().is_some();
    delete_auth().map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    if had_creds {
        eprintln!("Logged out");
    } else {
        eprintln!("No stored credentials");
    }
    Ok(())
}

pub fn cmd_whoami(json: bool) -> Result<(), CliError> {
    let client = ApiClient::from_saved_auth().map_err(CliError::api)?;
    let user = client.verify_token().map_err(CliError::api)?;

    if json {
        let out = serde_json::to_string_pretty(&user)
            .map_err(|e| CliError::general(format!("JSON error: {e}")))?;
        println!("{out}");
    } else {
        println!("{}", user.email);
        if !user.roles.is_empty() {
            println!("roles: {}", user.roles.join(", "));
        }
        if let Some(path) = auth_file_path() {
            eprintln!("credentials: {}", path.display());
        }
    }
    Ok(())
}

pub fn cmd_change_password(client: &ApiClient) -> Result<(), CliError> {
    let current = prompt("Current password: ")?;
    let new = prompt("New password: ")?;
    client
        .change_password(&current, &new)
        .map_err(CliError::api)?;
    eprintln!("Password changed");
    Ok(())
}

pub fn cmd_verify_email(client: &ApiClient, code: &str) -> Result<(), CliError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CliError::args("verification code is required"));
    }
    client.verify_email(code).map_err(CliError::api)?;
    eprintln!("Email verified");
    Ok(())
}

fn prompt(label: &str) -> Result<String, CliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("{} required and stdin is not a TTY", label.trim_end_matches(": ")),
            hint: Some("pass --email/--password or --token".into()),
        });
    }
    eprint!("{label}");
    io::stderr().flush().ok();
    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
    let trimmed = buf.trim().to_string();
    if trimmed.is_empty() {
        return Err(CliError::args("empty input"));
    }
    Ok(trimmed)
}

fn login_error(err: ApiError) -> CliError {
    match err {
        ApiError::Http(401, _) | ApiError::Http(403, _) | ApiError::Validation(_) => CliError {
            code: EXIT_AUTH_REJECTED,
            message: "Login rejected".into(),
            hint: Some("check email/password, or ask an admin to reset the account".into()),
        },
        other => CliError::api(other),
    }
}
