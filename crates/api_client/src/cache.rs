//! Response cache keyed by operation + query parameters.
//!
//! The one shared mutable resource in the system. Owned exclusively by
//! [`crate::ApiClient`]; consumers may only request invalidation and can
//! never write entries directly.

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, Value>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    pub fn put(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) {
        self.entries.retain(|k, _| !k.starts_with(prefix));
    }

    /// Drop one operation's entries: the bare key plus every parameterized
    /// variant. Unlike a raw prefix this never catches `records/10` when
    /// asked for `records/1`.
    pub fn invalidate_op(&mut self, op: &str) {
        let with_params = format!("{op}?");
        self.entries
            .retain(|k, _| !(k == op || k.starts_with(&with_params)));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a cache key from an operation name and its query parameters.
/// Parameter order is caller-fixed, so identical queries share a key.
pub fn cache_key(op: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return op.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", op, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_shape() {
        assert_eq!(cache_key("batches", &[]), "batches");
        assert_eq!(
            cache_key("records/7", &[("status", "MATCHED".into()), ("resolved", "false".into())]),
            "records/7?status=MATCHED&resolved=false"
        );
    }

    #[test]
    fn prefix_invalidation() {
        let mut cache = ResponseCache::new();
        cache.put("batches".into(), json!([1]));
        cache.put("records/7?status=MATCHED".into(), json!([2]));
        cache.put("records/8".into(), json!([3]));

        cache.invalidate_prefix("records/");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("records/7?status=MATCHED").is_none());
        assert!(cache.get("records/8").is_none());
        assert!(cache.get("batches").is_some());
    }

    #[test]
    fn op_invalidation_does_not_catch_longer_ids() {
        let mut cache = ResponseCache::new();
        cache.put("batch/1".into(), json!({"id": 1}));
        cache.put("batch/10".into(), json!({"id": 10}));
        cache.put("records/1?resolved=false".into(), json!([]));
        cache.put("records/10".into(), json!([]));

        cache.invalidate_op("batch/1");
        cache.invalidate_op("records/1");
        assert!(cache.get("batch/1").is_none());
        assert!(cache.get("records/1?resolved=false").is_none());
        assert!(cache.get("batch/10").is_some());
        assert!(cache.get("records/10").is_some());
    }

    #[test]
    fn get_returns_clone() {
        let mut cache = ResponseCache::new();
        cache.put("k".into(), json!({"a": 1}));
        let v = cache.get("k").unwrap();
        assert_eq!(v["a"], 1);
        // Still present after a read
        assert!(cache.get("k").is_some());
    }
}
