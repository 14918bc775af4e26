// Reconsole CLI - back-office operations for the reconciliation service

mod account;
mod admin;
mod batches;
mod config;
mod dash;
mod exit_codes;
mod export;
mod upload;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use reconsole_api_client::{ApiClient, ApiError};

use exit_codes::{
    EXIT_API_HTTP, EXIT_API_NETWORK, EXIT_API_PARSE, EXIT_API_VALIDATION, EXIT_AUTH_REJECTED,
    EXIT_ERROR, EXIT_IO, EXIT_NOT_AUTH, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "reconsole")]
#[command(about = "Back-office console for the reconciliation service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate against the backend and store the token
    #[command(after_help = "\
Examples:
  reconsole login --email ops@example.com
  reconsole login --token $RECONSOLE_API_TOKEN
  reconsole login --api-base https://recon.internal.example")]
    Login {
        /// Account email (prompts for password)
        #[arg(long)]
        email: Option<String>,

        /// Account password (prefer the interactive prompt)
        #[arg(long)]
        password: Option<String>,

        /// Pre-issued API token (skips the password exchange)
        #[arg(long, env = "RECONSOLE_API_TOKEN")]
        token: Option<String>,

        /// API base URL (defaults to the configured one)
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the authenticated account
    Whoami {
        #[arg(long)]
        json: bool,
    },

    /// Change the account password
    ChangePassword,

    /// Confirm an email-verification code
    VerifyEmail {
        /// Code from the verification email
        code: String,
    },

    /// List reconciliation batches
    #[command(after_help = "\
Examples:
  reconsole batches
  reconsole batches --status FAILED
  reconsole batches --search payroll --json")]
    Batches {
        /// Filter by lifecycle status (PENDING, RUNNING, DONE, FAILED)
        #[arg(long)]
        status: Option<String>,

        /// Substring match over id and file names
        #[arg(long)]
        search: Option<String>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one batch with records and derived statistics
    Batch {
        /// Batch reference (RB-7 or 7)
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List a batch's reconciled records
    Records {
        /// Batch reference (RB-7 or 7)
        batch: String,

        /// Filter by match status (MATCHED, PARTIAL, UNMATCHED, DUPLICATE, MISSING)
        #[arg(long)]
        status: Option<String>,

        /// Only unresolved records
        #[arg(long)]
        unresolved: bool,

        #[arg(long)]
        json: bool,
    },

    /// Re-run a batch
    Retry {
        /// Batch reference (RB-7 or 7)
        batch: String,
    },

    /// Resolve a record (or just append a comment with --note-only)
    #[command(after_help = "\
Examples:
  reconsole resolve 42 --comment \"duplicate of TXN-17, voided\"
  reconsole resolve 42 --comment \"waiting on vendor\" --note-only")]
    Resolve {
        /// Record id
        record: i64,

        /// Resolution comment (required, must be non-empty)
        #[arg(long)]
        comment: String,

        /// Append the comment without marking the record resolved
        #[arg(long)]
        note_only: bool,
    },

    /// Export a batch's problematic records as CSV
    #[command(after_help = "\
Writes problematic_records_<batch>_<date>.csv in the current directory
unless --out is given. Exits 0 with a notice when there is nothing to
export.

Examples:
  reconsole export RB-7
  reconsole export 7 --out /tmp/issues.csv")]
    Export {
        /// Batch reference (RB-7 or 7)
        batch: String,

        /// Output file (default: problematic_records_<batch>_<date>.csv)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Upload a backoffice/vendor file pair as a new batch
    Upload {
        /// Backoffice (ledger) file
        #[arg(long)]
        backoffice: PathBuf,

        /// Vendor file
        #[arg(long)]
        vendor: PathBuf,

        /// Column-mapping template id for the backoffice file
        #[arg(long)]
        backoffice_template: i64,

        /// Column-mapping template id for the vendor file
        #[arg(long)]
        vendor_template: i64,
    },

    /// List column-mapping templates
    Templates {
        #[arg(long)]
        json: bool,
    },

    /// User and role administration
    Admin {
        #[command(subcommand)]
        command: admin::AdminCommands,
    },

    /// Interactive dashboard
    #[command(after_help = "\
Examples:
  reconsole dash
  reconsole dash RB-7     (deep link straight into a batch)")]
    Dash {
        /// Batch reference to open directly
        batch: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Map an API error to its exit code.
    pub fn api(err: ApiError) -> Self {
        match err {
            ApiError::NotAuthenticated => Self {
                code: EXIT_NOT_AUTH,
                message: "Not authenticated".into(),
                hint: Some("run `reconsole login` first".into()),
            },
            ApiError::Http(401, _) | ApiError::Http(403, _) => Self {
                code: EXIT_AUTH_REJECTED,
                message: "Credentials rejected by the backend".into(),
                hint: Some("token may have expired — run `reconsole login` again".into()),
            },
            ApiError::Network(msg) => Self {
                code: EXIT_API_NETWORK,
                message: format!("Cannot reach backend: {msg}"),
                hint: None,
            },
            ApiError::Validation(msg) => Self {
                code: EXIT_API_VALIDATION,
                message: msg,
                hint: None,
            },
            ApiError::Parse(msg) => Self {
                code: EXIT_API_PARSE,
                message: format!("Bad backend response: {msg}"),
                hint: None,
            },
            ApiError::Http(code, msg) => Self {
                code: EXIT_API_HTTP,
                message: format!("HTTP {code}: {msg}"),
                hint: None,
            },
            ApiError::Io(msg) => Self::io(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { email, password, token, api_base } => {
            account::cmd_login(email, password, token, api_base)
        }
        Commands::Logout => account::cmd_logout(),
        Commands::Whoami { json } => account::cmd_whoami(json),
        Commands::ChangePassword => account::cmd_change_password(&require_client()?),
        Commands::VerifyEmail { code } => account::cmd_verify_email(&require_client()?, &code),
        Commands::Batches { status, search, json } => {
            batches::cmd_batches(&require_client()?, status, search, json)
        }
        Commands::Batch { id, json } => batches::cmd_batch(&require_client()?, &id, json),
        Commands::Records { batch, status, unresolved, json } => {
            batches::cmd_records(&require_client()?, &batch, status, unresolved, json)
        }
        Commands::Retry { batch } => batches::cmd_retry(&require_client()?, &batch),
        Commands::Resolve { record, comment, note_only } => {
            batches::cmd_resolve(&require_client()?, record, &comment, !note_only)
        }
        Commands::Export { batch, out } => export::cmd_export(&require_client()?, &batch, out),
        Commands::Upload { backoffice, vendor, backoffice_template, vendor_template } => {
            upload::cmd_upload(
                &require_client()?,
                backoffice,
                vendor,
                backoffice_template,
                vendor_template,
            )
        }
        Commands::Templates { json } => batches::cmd_templates(&require_client()?, json),
        Commands::Admin { command } => admin::cmd_admin(&require_client()?, command),
        Commands::Dash { batch } => dash::cmd_dash(require_client()?, batch),
    }
}

fn require_client() -> Result<ApiClient, CliError> {
    ApiClient::from_saved_auth().map_err(CliError::api)
}
