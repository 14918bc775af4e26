//! Discrepancy grouping — parses each record's AI-reasoning phrase list and
//! aggregates by issue type.

use std::collections::{BTreeSet, HashMap};

use reconsole_model::TxnRecord;
use serde::Serialize;

use crate::format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Medium,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscrepancyRow {
    pub issue_type: String,
    /// Number of records exhibiting this issue type.
    pub count: usize,
    pub affected_cents: i64,
    pub affected: String,
    /// `"{transaction_id} / {bank_id}, {full reasoning}"` — first occurrence
    /// only.
    pub example: String,
    pub severity: Severity,
}

/// Group records by discrepancy issue type. Reasoning text splits on `"; "`;
/// the issue type is the text before the first `:` of each phrase. Rows come
/// out in first-occurrence order.
pub fn discrepancy_analysis(records: &[TxnRecord]) -> Vec<DiscrepancyRow> {
    let mut rows: Vec<DiscrepancyRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for r in records {
        if r.ai_reasoning.is_empty() {
            continue;
        }
        // A record contributes at most once per issue type, even if the
        // reasoning repeats it.
        let mut seen_in_record = BTreeSet::new();
        for phrase in r.ai_reasoning.split("; ") {
            let issue_type = phrase.split(':').next().unwrap_or(phrase).trim();
            if issue_type.is_empty() || !seen_in_record.insert(issue_type.to_string()) {
                continue;
            }
            match index.get(issue_type) {
                Some(&i) => {
                    rows[i].count += 1;
                    rows[i].affected_cents += r.amount_cents;
                    rows[i].affected = format::usd_cents(rows[i].affected_cents);
                }
                None => {
                    index.insert(issue_type.to_string(), rows.len());
                    rows.push(DiscrepancyRow {
                        issue_type: issue_type.to_string(),
                        count: 1,
                        affected_cents: r.amount_cents,
                        affected: format::usd_cents(r.amount_cents),
                        example: example_citation(r),
                        severity: severity_for(issue_type),
                    });
                }
            }
        }
    }

    rows
}

fn example_citation(r: &TxnRecord) -> String {
    let bank_id = r
        .bank_record
        .as_ref()
        .map(|b| b.id.as_str())
        .unwrap_or("N/A");
    format!("{} / {}, {}", r.transaction_id, bank_id, r.ai_reasoning)
}

fn severity_for(issue_type: &str) -> Severity {
    if issue_type.to_lowercase().contains("description") {
        Severity::Low
    } else {
        Severity::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconsole_model::map_record;
    use serde_json::json;

    fn rec(id: i64, txn: &str, amount: f64, reasoning: &[&str]) -> TxnRecord {
        map_record(&json!({
            "id": id,
            "matchStatus": "MISMATCH",
            "vendorData": {"core": {"transaction_id": txn}},
            "displayData": {"core": {"amount": amount}},
            "discrepancies": reasoning,
        }))
        .record
    }

    #[test]
    fn groups_by_issue_type() {
        let records = vec![
            rec(1, "T-1", 100.0, &["Amount mismatch: off by 0.05", "Date offset: 1 day"]),
            rec(2, "T-2", 50.0, &["Amount mismatch: off by 1.00"]),
            rec(3, "T-3", 10.0, &["Description differs: casing"]),
        ];
        let rows = discrepancy_analysis(&records);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].issue_type, "Amount mismatch");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].affected_cents, 15000);
        assert_eq!(rows[0].severity, Severity::Medium);

        assert_eq!(rows[1].issue_type, "Date offset");
        assert_eq!(rows[1].count, 1);

        assert_eq!(rows[2].issue_type, "Description differs");
        assert_eq!(rows[2].severity, Severity::Low);
    }

    #[test]
    fn example_cites_first_occurrence_only() {
        let records = vec![
            rec(1, "T-1", 100.0, &["Amount mismatch: a"]),
            rec(2, "T-2", 50.0, &["Amount mismatch: b"]),
        ];
        let rows = discrepancy_analysis(&records);
        assert!(rows[0].example.starts_with("T-1 / N/A, Amount mismatch: a"));
    }

    #[test]
    fn duplicate_type_within_record_counted_once() {
        let records = vec![rec(1, "T-1", 100.0, &["Amount mismatch: a", "Amount mismatch: b"])];
        let rows = discrepancy_analysis(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].affected_cents, 10000);
    }

    #[test]
    fn clean_records_produce_no_rows() {
        let r = map_record(&json!({"id": 1, "matchStatus": "MATCH"})).record;
        assert!(discrepancy_analysis(&[r]).is_empty());
    }
}
