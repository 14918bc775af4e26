//! `reconsole-api-client` — blocking client for the reconciliation backend.
//!
//! Credentials are injected at construction (or loaded from the saved auth
//! file); the client never reads ambient state on its own. All responses
//! come back as raw `serde_json::Value` payloads — normalization is the
//! model crate's job.

pub mod auth;
pub mod cache;
pub mod client;

pub use auth::{auth_file_path, delete_auth, load_auth, save_auth, AuthCredentials};
pub use cache::ResponseCache;
pub use client::{ApiClient, ApiError, UserInfo};
