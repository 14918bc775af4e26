use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::status::{BatchStatus, MatchStatus};

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// One reconciliation run pairing a backoffice file against a vendor file.
///
/// Records are fetched independently and attached when available — a batch
/// straight out of `map_batch` always has `records` empty.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    /// Display identifier: `"RB-" + raw_id`.
    pub id: String,
    /// Backend numeric id (what the API speaks).
    pub raw_id: i64,
    pub status: BatchStatus,
    pub backoffice_file: String,
    pub vendor_file: String,
    pub record_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `"{m}m {s}s"`, present only when status is Done and both timestamps
    /// parsed.
    pub processing_time: Option<String>,
    /// Present only when status is Failed.
    pub failure_reason: Option<String>,
    /// Static percentage hint from the backend. Once `records` is non-empty
    /// the displayed rate must come from [`crate::recompute_match_rate`]
    /// instead.
    pub match_rate: Option<u8>,
    pub records: Vec<TxnRecord>,
}

impl Batch {
    /// Match rate to display: recomputed from attached records when present,
    /// the static backend hint otherwise.
    pub fn display_match_rate(&self) -> Option<u8> {
        crate::mapper::recompute_match_rate(&self.records).or(self.match_rate)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One transaction-level comparison result within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct TxnRecord {
    pub id: i64,
    /// Vendor-side transaction identifier, `"TXN-{id}"` when absent.
    pub transaction_id: String,
    pub description: String,
    pub amount_cents: i64,
    pub date: NaiveDate,
    pub status: MatchStatus,
    /// Backend-assigned match certainty in [0, 1]. None when the backend
    /// gave none (rendered `N/A` on export).
    pub confidence: Option<f64>,
    pub direction: String,
    /// Backoffice/ledger side. None means "no bank record", which is a
    /// distinct state from a bank record with a zero amount.
    pub bank_record: Option<SideRecord>,
    /// Vendor side is mandatory — synthesized from defaults if the payload
    /// was empty.
    pub vendor_record: SideRecord,
    /// Semicolon-delimited discrepancy phrases, empty when none.
    pub ai_reasoning: String,
    pub field_flags: Vec<String>,
    pub resolved: bool,
    /// Append-only; resolving never removes prior comments.
    pub resolution_comments: Vec<String>,
}

/// One side (bank or vendor) of a reconciled transaction.
#[derive(Debug, Clone, Serialize)]
pub struct SideRecord {
    pub id: String,
    pub reference: String,
    pub amount_cents: i64,
    pub date: NaiveDate,
    pub description: String,
    pub status: String,
    pub direction: String,
}
