//! `reconsole admin` — user and role administration.
//!
//! These are opaque passthroughs: the backend owns the schemas, we relay
//! request/response pairs and only interpret success/failure.

use clap::Subcommand;

use reconsole_api_client::ApiClient;

use crate::util::pad_right;
use crate::CliError;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// User accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Roles and assignments
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List user accounts
    List {
        #[arg(long)]
        json: bool,
    },

    /// Create a user account
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Update a user account
    Update {
        /// User id
        id: i64,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a user account
    Delete {
        /// User id
        id: i64,
    },

    /// Replace a user's role assignments
    #[command(after_help = "\
Examples:
  reconsole admin users assign-roles 12 --role 1 --role 4")]
    AssignRoles {
        /// User id
        id: i64,

        /// Role id (repeatable)
        #[arg(long = "role", required = true)]
        roles: Vec<i64>,
    },
}

#[derive(Subcommand)]
pub enum RoleCommands {
    /// List roles
    List {
        #[arg(long)]
        json: bool,
    },

    /// Create a role
    Create {
        #[arg(long)]
        name: String,
    },

    /// Delete a role
    Delete {
        /// Role id
        id: i64,
    },
}

pub fn cmd_admin(client: &ApiClient, cmd: AdminCommands) -> Result<(), CliError> {
    match cmd {
        AdminCommands::Users { command } => cmd_users(client, command),
        AdminCommands::Roles { command } => cmd_roles(client, command),
    }
}

fn cmd_users(client: &ApiClient, cmd: UserCommands) -> Result<(), CliError> {
    match cmd {
        UserCommands::List { json } => {
            let users = client.list_users().map_err(CliError::api)?;
            if json {
                println!("{}", pretty(&users)?);
                return Ok(());
            }
            for u in &users {
                println!(
                    "{} {} {}",
                    pad_right(&u["id"].as_i64().unwrap_or(0).to_string(), 6),
                    pad_right(u["email"].as_str().unwrap_or("-"), 30),
                    u["name"].as_str().unwrap_or(""),
                );
            }
            eprintln!("{} users", users.len());
            Ok(())
        }
        UserCommands::Create { email, name } => {
            let mut payload = serde_json::json!({ "email": email });
            if let Some(name) = name {
                payload["name"] = serde_json::Value::String(name);
            }
            let created = client.create_user(&payload).map_err(CliError::api)?;
            eprintln!("created user {}", created["id"]);
            Ok(())
        }
        UserCommands::Update { id, email, name } => {
            let mut payload = serde_json::Map::new();
            if let Some(email) = email {
                payload.insert("email".into(), serde_json::Value::String(email));
            }
            if let Some(name) = name {
                payload.insert("name".into(), serde_json::Value::String(name));
            }
            if payload.is_empty() {
                return Err(CliError::args("nothing to update (pass --email and/or --name)"));
            }
            client
                .update_user(id, &serde_json::Value::Object(payload))
                .map_err(CliError::api)?;
            eprintln!("updated user {id}");
            Ok(())
        }
        UserCommands::Delete { id } => {
            client.delete_user(id).map_err(CliError::api)?;
            eprintln!("deleted user {id}");
            Ok(())
        }
        UserCommands::AssignRoles { id, roles } => {
            client.assign_roles(id, &roles).map_err(CliError::api)?;
            eprintln!("assigned {} role(s) to user {id}", roles.len());
            Ok(())
        }
    }
}

fn cmd_roles(client: &ApiClient, cmd: RoleCommands) -> Result<(), CliError> {
    match cmd {
        RoleCommands::List { json } => {
            let roles = client.list_roles().map_err(CliError::api)?;
            if json {
                println!("{}", pretty(&roles)?);
                return Ok(());
            }
            for r in &roles {
                println!(
                    "{} {}",
                    pad_right(&r["id"].as_i64().unwrap_or(0).to_string(), 6),
                    r["name"].as_str().unwrap_or("-"),
                );
            }
            eprintln!("{} roles", roles.len());
            Ok(())
        }
        RoleCommands::Create { name } => {
            let created = client
                .create_role(&serde_json::json!({ "name": name }))
                .map_err(CliError::api)?;
            eprintln!("created role {}", created["id"]);
            Ok(())
        }
        RoleCommands::Delete { id } => {
            client.delete_role(id).map_err(CliError::api)?;
            eprintln!("deleted role {id}");
            Ok(())
        }
    }
}

fn pretty(value: &impl serde::Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON error: {e}")))
}
