//! Per-status breakdown with a synthetic TOTAL row.

use reconsole_model::{MatchStatus, TxnRecord};
use serde::Serialize;

use crate::format;

#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    /// `"MATCHED"`, …, or `"TOTAL"` for the synthetic summary row.
    pub label: String,
    pub count: usize,
    pub percent: String,
    pub total_cents: i64,
    pub total: String,
    pub average_cents: i64,
    pub average: String,
    /// Mean confidence over the rows in this bucket, `0.0000` when empty.
    pub avg_confidence: String,
}

/// One row per status (all five, always, in enum order) plus a TOTAL row.
/// TOTAL's percent is the literal `"100%"` whenever any records exist and
/// `"0%"` otherwise; with an empty record set every percent is `"0%"`.
pub fn status_breakdown(records: &[TxnRecord]) -> Vec<StatusRow> {
    let total_count = records.len();
    let mut rows: Vec<StatusRow> = MatchStatus::ALL
        .iter()
        .map(|status| {
            let bucket: Vec<&TxnRecord> =
                records.iter().filter(|r| r.status == *status).collect();
            let percent = if total_count == 0 {
                "0%".to_string()
            } else {
                format::percent(bucket.len() as f64 * 100.0 / total_count as f64)
            };
            row(status.to_string(), &bucket, percent)
        })
        .collect();

    let all: Vec<&TxnRecord> = records.iter().collect();
    let total_percent = if total_count == 0 { "0%" } else { "100%" };
    rows.push(row("TOTAL".to_string(), &all, total_percent.to_string()));
    rows
}

fn row(label: String, bucket: &[&TxnRecord], percent: String) -> StatusRow {
    let count = bucket.len();
    let total_cents: i64 = bucket.iter().map(|r| r.amount_cents).sum();
    let average_cents = if count == 0 {
        0
    } else {
        total_cents / count as i64
    };
    let avg_confidence = if count == 0 {
        0.0
    } else {
        bucket
            .iter()
            .map(|r| r.confidence.unwrap_or(0.0))
            .sum::<f64>()
            / count as f64
    };
    StatusRow {
        label,
        count,
        percent,
        total_cents,
        total: format::usd_cents(total_cents),
        average_cents,
        average: format::usd_cents(average_cents),
        avg_confidence: format::confidence(avg_confidence),
    }
}
