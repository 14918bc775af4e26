//! Reconciliation API HTTP client.
//!
//! Blocking reqwest client (no async runtime required). Reads go through
//! the response cache and are retried on transient failures; mutations are
//! never retried (they are not idempotent) and invalidate the cache slices
//! they touch.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::auth::{load_auth, AuthCredentials};
use crate::cache::{cache_key, ResponseCache};

const MAX_RETRIES: u32 = 3;

/// Reconciliation API client (blocking).
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
    cache: Arc<Mutex<ResponseCache>>,
}

/// Error type for API operations.
#[derive(Debug)]
pub enum ApiError {
    /// No auth credentials configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// File I/O error
    Io(String),
    /// Server returned a validation error (400/422 with message)
    Validation(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotAuthenticated => {
                write!(f, "Not authenticated — run `reconsole login` first")
            }
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Io(msg) => write!(f, "I/O error: {}", msg),
            ApiError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Account info from /api/auth/me.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct UserInfo {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl ApiClient {
    /// Create a new client using saved auth credentials.
    pub fn from_saved_auth() -> Result<Self, ApiError> {
        let creds = load_auth().ok_or(ApiError::NotAuthenticated)?;
        Ok(Self::new(creds))
    }

    /// Create a new client with explicit credentials.
    pub fn new(creds: AuthCredentials) -> Self {
        Self::with_base_url(creds.token, creds.api_base)
    }

    /// Create a client against an explicit base URL (test seam).
    pub fn with_base_url(token: String, api_base: String) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("reconsole/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            cache: Arc::new(Mutex::new(ResponseCache::new())),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    // ── Reads (cached, retried) ─────────────────────────────────────

    /// List all reconciliation batches (raw payloads).
    pub fn list_batches(&self) -> Result<Vec<Value>, ApiError> {
        let json = self.get_cached("batches", "/api/batches", &[])?;
        Ok(as_list(&json, "batches"))
    }

    /// Fetch a single batch (raw payload).
    pub fn get_batch(&self, id: i64) -> Result<Value, ApiError> {
        self.get_cached(&format!("batch/{id}"), &format!("/api/batches/{id}"), &[])
    }

    /// List a batch's records, optionally filtered by match status and
    /// resolved flag (raw payloads).
    pub fn list_records(
        &self,
        batch_id: i64,
        status: Option<&str>,
        resolved: Option<bool>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(s) = status {
            params.push(("status", s.to_string()));
        }
        if let Some(r) = resolved {
            params.push(("resolved", r.to_string()));
        }
        let json = self.get_cached(
            &cache_key(&format!("records/{batch_id}"), &params),
            &format!("/api/batches/{batch_id}/records"),
            &params,
        )?;
        Ok(as_list(&json, "records"))
    }

    /// Per-status record counts for a batch.
    pub fn get_status_counts(&self, batch_id: i64) -> Result<Value, ApiError> {
        self.get_cached(
            &format!("status-counts/{batch_id}"),
            &format!("/api/batches/{batch_id}/status-counts"),
            &[],
        )
    }

    /// List column-mapping templates (raw payloads).
    pub fn list_templates(&self) -> Result<Vec<Value>, ApiError> {
        let json = self.get_cached("templates", "/api/templates", &[])?;
        Ok(as_list(&json, "templates"))
    }

    // ── Mutations (no retry, cache-invalidating) ────────────────────

    /// Re-run a failed batch. Invalidates the batch's cache slices.
    pub fn retry_batch(&self, id: i64) -> Result<(), ApiError> {
        self.post_json(&format!("/api/batches/{id}/retry"), &Value::Null)?;
        self.invalidate_batch(id);
        Ok(())
    }

    /// Append a resolution comment; `resolve` also marks the record
    /// resolved. Invalidates all cached record lists.
    pub fn resolve_record(&self, id: i64, comment: &str, resolve: bool) -> Result<(), ApiError> {
        self.post_json(
            &format!("/api/records/{id}/resolve"),
            &serde_json::json!({ "comment": comment, "resolve": resolve }),
        )?;
        self.invalidate("records/");
        Ok(())
    }

    /// Upload a backoffice/vendor file pair as a new reconciliation batch.
    /// Returns the new batch id.
    pub fn upload_batch(
        &self,
        backoffice_file: &Path,
        vendor_file: &Path,
        backoffice_template: i64,
        vendor_template: i64,
    ) -> Result<i64, ApiError> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("backofficeFile", backoffice_file)
            .map_err(|e| ApiError::Io(format!("{}: {e}", backoffice_file.display())))?
            .file("vendorFile", vendor_file)
            .map_err(|e| ApiError::Io(format!("{}: {e}", vendor_file.display())))?
            .text("backofficeTemplateId", backoffice_template.to_string())
            .text("vendorTemplateId", vendor_template.to_string());

        let url = format!("{}/api/batches", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let json: Value = check(response)?
            .json()
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        self.invalidate("batches");
        json_i64(&json, "batchId")
    }

    // ── Auth / account (opaque request-response pairs) ──────────────

    /// Exchange email + password for a token. Standalone: runs before any
    /// credentials exist.
    pub fn login(
        api_base: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthCredentials, ApiError> {
        let client = Self::with_base_url(String::new(), api_base.to_string());
        let url = format!("{}/api/auth/login", client.api_base);
        let response = client
            .http
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let json: Value = check(response)?
            .json()
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let token = json["token"]
            .as_str()
            .ok_or_else(|| ApiError::Parse("Missing token in response".into()))?;
        Ok(AuthCredentials {
            token: token.to_string(),
            api_base: client.api_base.clone(),
            email: Some(email.to_string()),
        })
    }

    /// Verify the current token and get account info.
    pub fn verify_token(&self) -> Result<UserInfo, ApiError> {
        let resp = self.get_once(&format!("{}/api/auth/me", self.api_base), &[])?;
        resp.json::<UserInfo>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        self.post_json(
            "/api/auth/change-password",
            &serde_json::json!({ "currentPassword": current, "newPassword": new }),
        )?;
        Ok(())
    }

    pub fn verify_email(&self, code: &str) -> Result<(), ApiError> {
        self.post_json("/api/auth/verify-email", &serde_json::json!({ "code": code }))?;
        Ok(())
    }

    // ── User / role administration (opaque) ─────────────────────────

    pub fn list_users(&self) -> Result<Vec<Value>, ApiError> {
        let json = self.get_retry("/api/users", &[])?;
        Ok(as_list(&json, "users"))
    }

    pub fn create_user(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post_json("/api/users", payload)
    }

    pub fn update_user(&self, id: i64, payload: &Value) -> Result<Value, ApiError> {
        let url = format!("{}/api/users/{id}", self.api_base);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check(response)?
            .json()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/users/{id}"))
    }

    pub fn list_roles(&self) -> Result<Vec<Value>, ApiError> {
        let json = self.get_retry("/api/roles", &[])?;
        Ok(as_list(&json, "roles"))
    }

    pub fn create_role(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post_json("/api/roles", payload)
    }

    pub fn delete_role(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/roles/{id}"))
    }

    pub fn assign_roles(&self, user_id: i64, role_ids: &[i64]) -> Result<(), ApiError> {
        self.post_json(
            &format!("/api/users/{user_id}/roles"),
            &serde_json::json!({ "roleIds": role_ids }),
        )?;
        Ok(())
    }

    // ── Cache control ───────────────────────────────────────────────

    /// Drop cached responses whose key starts with `prefix`.
    pub fn invalidate(&self, prefix: &str) {
        self.lock_cache().invalidate_prefix(prefix);
    }

    /// Drop everything cached for one batch, plus the batch list.
    pub fn invalidate_batch(&self, id: i64) {
        let mut cache = self.lock_cache();
        cache.invalidate_op(&format!("batch/{id}"));
        cache.invalidate_op(&format!("records/{id}"));
        cache.invalidate_op(&format!("status-counts/{id}"));
        cache.invalidate_op("batches");
    }

    pub fn invalidate_all(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn get_cached(
        &self,
        key: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        if let Some(hit) = self.lock_cache().get(key) {
            return Ok(hit);
        }
        let json = self.get_retry(path, params)?;
        self.lock_cache().put(key.to_string(), json.clone());
        Ok(json)
    }

    /// GET with retry + exponential backoff on 429/5xx/transport errors.
    fn get_retry(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.api_base, path);
        let mut backoff_secs = 1u64;

        for attempt in 0..=MAX_RETRIES {
            let result = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(params)
                .send();

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if (status == 429 || status >= 500) && attempt < MAX_RETRIES {
                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .unwrap_or(backoff_secs)
                        } else {
                            backoff_secs
                        };
                        thread::sleep(Duration::from_secs(wait));
                        backoff_secs *= 2;
                        continue;
                    }

                    return check(resp)?
                        .json()
                        .map_err(|e| ApiError::Parse(e.to_string()));
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(ApiError::Network(e.to_string()));
                    }
                    thread::sleep(Duration::from_secs(backoff_secs));
                    backoff_secs *= 2;
                }
            }
        }

        unreachable!()
    }

    fn get_once(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check(response)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self.http.post(&url).bearer_auth(&self.token);
        if !body.is_null() {
            req = req.json(body);
        }
        let response = req.send().map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check(response)?;
        // Some mutation endpoints return an empty body on success
        let text = response.text().unwrap_or_default();
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check(response)?;
        Ok(())
    }
}

// ── Free functions ──────────────────────────────────────────────────

fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ApiError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    if status == 422 || status == 400 {
        return Err(ApiError::Validation(body));
    }
    Err(ApiError::Http(status, body))
}

/// Accept both a bare array and `{"<field>": [...]}` envelopes.
fn as_list(json: &Value, field: &str) -> Vec<Value> {
    json.as_array()
        .or_else(|| json[field].as_array())
        .cloned()
        .unwrap_or_default()
}

fn json_i64(json: &Value, key: &str) -> Result<i64, ApiError> {
    json[key]
        .as_i64()
        .or_else(|| json[key].as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| ApiError::Parse(format!("Missing {} in response", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn as_list_accepts_both_shapes() {
        assert_eq!(as_list(&json!([1, 2]), "batches").len(), 2);
        assert_eq!(as_list(&json!({"batches": [1]}), "batches").len(), 1);
        assert!(as_list(&json!({"other": [1]}), "batches").is_empty());
        assert!(as_list(&json!("nope"), "batches").is_empty());
    }

    #[test]
    fn json_i64_accepts_number_or_string() {
        assert_eq!(json_i64(&json!({"batchId": 7}), "batchId").unwrap(), 7);
        assert_eq!(json_i64(&json!({"batchId": "7"}), "batchId").unwrap(), 7);
        assert!(json_i64(&json!({}), "batchId").is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = ApiClient::with_base_url("t".into(), "https://api.test/".into());
        assert_eq!(client.api_base(), "https://api.test");
    }
}
