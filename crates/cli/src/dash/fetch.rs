//! Background fetches for the dashboard.
//!
//! Every remote call runs on its own thread and reports back over an mpsc
//! channel. Events carry the batch id they were fetched for; the event loop
//! applies them through the controller's liveness guards, so results that
//! arrive after the selection moved on are dropped, and the detail/records
//! pair for one batch may resolve in either order.

use std::sync::mpsc::Sender;
use std::thread;

use reconsole_api_client::ApiClient;
use reconsole_model::{map_batch, map_records, Batch, TxnRecord};

pub(crate) enum FetchEvent {
    Batches(Result<Vec<Batch>, String>),
    Detail {
        batch_id: String,
        result: Result<Batch, String>,
    },
    Records {
        batch_id: String,
        result: Result<Vec<TxnRecord>, String>,
        warning_count: usize,
    },
    Counts {
        batch_id: String,
        result: Result<Vec<(String, u64)>, String>,
    },
    Retried {
        batch_id: String,
        result: Result<(), String>,
    },
    Resolved {
        record_id: i64,
        comment: String,
        resolve: bool,
        result: Result<(), String>,
    },
}

#[derive(Clone)]
pub(crate) struct Fetcher {
    client: ApiClient,
    tx: Sender<FetchEvent>,
}

impl Fetcher {
    pub(crate) fn new(client: ApiClient, tx: Sender<FetchEvent>) -> Self {
        Self { client, tx }
    }

    pub(crate) fn batches(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client
                .list_batches()
                .map(|raws| raws.iter().map(map_batch).collect())
                .map_err(|e| e.to_string());
            let _ = tx.send(FetchEvent::Batches(result));
        });
    }

    /// Invalidate the cached batch list and fetch it again.
    pub(crate) fn batches_fresh(&self) {
        self.client.invalidate("batches");
        self.batches();
    }

    /// Fetch everything the details view needs. Three independent threads;
    /// no ordering between them.
    pub(crate) fn batch_bundle(&self, batch_id: &str, raw_id: i64) {
        self.detail(batch_id, raw_id);
        self.records(batch_id, raw_id);
        self.counts(batch_id, raw_id);
    }

    /// Same, but drop the batch's cache slices first.
    pub(crate) fn batch_bundle_fresh(&self, batch_id: &str, raw_id: i64) {
        self.client.invalidate_batch(raw_id);
        self.batch_bundle(batch_id, raw_id);
    }

    pub(crate) fn detail(&self, batch_id: &str, raw_id: i64) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let batch_id = batch_id.to_string();
        thread::spawn(move || {
            let result = client
                .get_batch(raw_id)
                .map(|raw| map_batch(&raw))
                .map_err(|e| e.to_string());
            let _ = tx.send(FetchEvent::Detail { batch_id, result });
        });
    }

    pub(crate) fn records(&self, batch_id: &str, raw_id: i64) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let batch_id = batch_id.to_string();
        thread::spawn(move || {
            let (result, warning_count) = match client.list_records(raw_id, None, None) {
                Ok(raws) => {
                    let (records, warnings) = map_records(&raws);
                    (Ok(records), warnings.len())
                }
                Err(e) => (Err(e.to_string()), 0),
            };
            let _ = tx.send(FetchEvent::Records { batch_id, result, warning_count });
        });
    }

    pub(crate) fn counts(&self, batch_id: &str, raw_id: i64) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let batch_id = batch_id.to_string();
        thread::spawn(move || {
            let result = client
                .get_status_counts(raw_id)
                .map(|raw| parse_counts(&raw))
                .map_err(|e| e.to_string());
            let _ = tx.send(FetchEvent::Counts { batch_id, result });
        });
    }

    /// Retry a batch, then refetch its state. The mutation itself is never
    /// retried and nothing is applied optimistically.
    pub(crate) fn retry(&self, batch_id: &str, raw_id: i64) {
        let fetcher = self.clone();
        let batch_id = batch_id.to_string();
        thread::spawn(move || {
            let result = fetcher.client.retry_batch(raw_id).map_err(|e| e.to_string());
            let ok = result.is_ok();
            let _ = fetcher.tx.send(FetchEvent::Retried {
                batch_id: batch_id.clone(),
                result,
            });
            if ok {
                // retry_batch invalidated the cache; these re-read fresh
                fetcher.batch_bundle(&batch_id, raw_id);
                fetcher.batches();
            }
        });
    }

    /// Resolve/comment a record, then refetch the record list so the
    /// optimistic merge gets reconciled against authoritative state.
    pub(crate) fn resolve(
        &self,
        record_id: i64,
        comment: String,
        resolve: bool,
        batch_id: &str,
        raw_id: i64,
    ) {
        let fetcher = self.clone();
        let batch_id = batch_id.to_string();
        thread::spawn(move || {
            let result = fetcher
                .client
                .resolve_record(record_id, &comment, resolve)
                .map_err(|e| e.to_string());
            let ok = result.is_ok();
            let _ = fetcher.tx.send(FetchEvent::Resolved {
                record_id,
                comment,
                resolve,
                result,
            });
            if ok {
                fetcher.records(&batch_id, raw_id);
            }
        });
    }
}

/// `{"MATCHED": 12, "PARTIAL": 3, ...}` → ordered pairs. Unknown keys pass
/// through; the backend owns this shape.
fn parse_counts(raw: &serde_json::Value) -> Vec<(String, u64)> {
    raw.as_object()
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default()
}
