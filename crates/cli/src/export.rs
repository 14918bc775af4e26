//! `reconsole export` — problematic-record CSV export.
//!
//! The column set and order are frozen; downstream spreadsheets and ticket
//! tooling key off the exact header. Change it deliberately and update the
//! golden test.

use std::io::Write;
use std::path::PathBuf;

use reconsole_api_client::ApiClient;
use reconsole_model::{map_records, money, TxnRecord};

use crate::util::{parse_batch_ref, today_iso};
use crate::CliError;

pub const ISSUE_HEADER: [&str; 20] = [
    "Transaction ID",
    "Description",
    "Amount",
    "Date",
    "Status",
    "Confidence",
    "Direction",
    "AI Reasoning",
    "Flags",
    "Bank Record ID",
    "Bank Record Reference",
    "Bank Record Amount",
    "Bank Record Date",
    "Bank Record Description",
    "System Record ID",
    "System Record Reference",
    "System Record Amount",
    "System Record Date",
    "System Record Description",
    "Resolution Comments",
];

/// The four non-matched statuses, in record order.
pub fn problematic(records: &[TxnRecord]) -> Vec<&TxnRecord> {
    records.iter().filter(|r| r.status.is_problematic()).collect()
}

/// Default export filename for a batch.
pub fn issue_filename(batch_id: &str) -> String {
    format!("problematic_records_{}_{}.csv", batch_id, today_iso())
}

/// Serialize problematic records. The `csv` crate handles RFC 4180 quoting
/// (fields containing comma/quote/newline get double-quoted, inner quotes
/// doubled).
pub fn write_issue_csv<W: Write>(records: &[&TxnRecord], writer: W) -> Result<(), String> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer
        .write_record(ISSUE_HEADER)
        .map_err(|e| format!("CSV write error: {e}"))?;

    for r in records {
        csv_writer
            .write_record(issue_row(r))
            .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv_writer
        .flush()
        .map_err(|e| format!("CSV flush error: {e}"))
}

fn issue_row(r: &TxnRecord) -> Vec<String> {
    let confidence = match r.confidence {
        Some(c) => format!("{:.0}%", c * 100.0),
        None => "N/A".to_string(),
    };

    let (bank_id, bank_ref, bank_amount, bank_date, bank_desc) = match &r.bank_record {
        Some(b) => (
            b.id.clone(),
            b.reference.clone(),
            money::format_plain(b.amount_cents),
            b.date.to_string(),
            b.description.clone(),
        ),
        None => Default::default(),
    };

    vec![
        r.transaction_id.clone(),
        r.description.clone(),
        money::format_plain(r.amount_cents),
        r.date.to_string(),
        r.status.to_string(),
        confidence,
        r.direction.clone(),
        r.ai_reasoning.clone(),
        r.field_flags.join("; "),
        bank_id,
        bank_ref,
        bank_amount,
        bank_date,
        bank_desc,
        r.vendor_record.id.clone(),
        r.vendor_record.reference.clone(),
        money::format_plain(r.vendor_record.amount_cents),
        r.vendor_record.date.to_string(),
        r.vendor_record.description.clone(),
        r.resolution_comments.join(" | "),
    ]
}

pub fn cmd_export(client: &ApiClient, batch: &str, out: Option<PathBuf>) -> Result<(), CliError> {
    let raw_id = parse_batch_ref(batch)?;
    let display_id = format!("RB-{raw_id}");

    let raws = client.list_records(raw_id, None, None).map_err(CliError::api)?;
    let (records, warnings) = map_records(&raws);
    for w in &warnings {
        eprintln!("warning: {w}");
    }

    let issues = problematic(&records);
    if issues.is_empty() {
        eprintln!("{display_id}: no problematic records — nothing to export");
        return Ok(());
    }

    let path = out.unwrap_or_else(|| PathBuf::from(issue_filename(&display_id)));
    let file = std::fs::File::create(&path)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", path.display())))?;
    write_issue_csv(&issues, std::io::BufWriter::new(file)).map_err(CliError::io)?;

    eprintln!("wrote {} problematic records to {}", issues.len(), path.display());
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reconsole_model::map_record;
    use serde_json::json;

    fn issue_record() -> TxnRecord {
        map_record(&json!({
            "id": 42,
            "matchStatus": "PARTIAL_MATCH",
            "confidenceScore": 0.87,
            "displayData": {"core": {
                "description": "Card settlement, January",
                "amount": 1234.56,
                "date": "2024-01-15",
                "direction": "Credit"
            }},
            "vendorData": {"core": {
                "id": "v-42",
                "transaction_id": "STR-889",
                "reference": "po_7",
                "amount": 1234.56,
                "date": "2024-01-15",
                "description": "stripe payout"
            }},
            "backofficeData": {"raw": {
                "ID": "L-77",
                "Ref No": "INV-2210",
                "Value": "1234.50",
                "Txn Date": "2024-01-14",
                "Narration": "ledger entry"
            }},
            "discrepancies": ["Amount mismatch: 0.06 difference"],
            "fieldFlags": ["amount"],
            "resolutionComment": ["checked with ops"]
        }))
        .record
    }

    /// Golden output snapshot. If this breaks, downstream consumers of the
    /// export break — update deliberately or not at all.
    #[test]
    fn golden_header_and_row() {
        let record = issue_record();
        let mut buf = Vec::new();
        write_issue_csv(&[&record], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Transaction ID,Description,Amount,Date,Status,Confidence,Direction,\
             AI Reasoning,Flags,Bank Record ID,Bank Record Reference,Bank Record Amount,\
             Bank Record Date,Bank Record Description,System Record ID,\
             System Record Reference,System Record Amount,System Record Date,\
             System Record Description,Resolution Comments"
        );

        // Description contains a comma, so it must be quoted
        assert_eq!(
            lines.next().unwrap(),
            "STR-889,\"Card settlement, January\",1234.56,2024-01-15,PARTIAL,87%,Credit,\
             Amount mismatch: 0.06 difference,amount,L-77,INV-2210,1234.50,2024-01-14,\
             ledger entry,v-42,po_7,1234.56,2024-01-15,stripe payout,checked with ops"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn quotes_inside_fields_are_doubled() {
        let record = map_record(&json!({
            "id": 1,
            "matchStatus": "MISMATCH",
            "displayData": {"core": {"description": "said \"hold\" on this"}}
        }))
        .record;
        let mut buf = Vec::new();
        write_issue_csv(&[&record], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\"said \"\"hold\"\" on this\""));
    }

    #[test]
    fn missing_confidence_renders_na() {
        let record = map_record(&json!({"id": 1, "matchStatus": "MISSING"})).record;
        let row = issue_row(&record);
        assert_eq!(row[5], "N/A");
        // No bank record → five empty bank columns
        assert_eq!(&row[9..14], ["", "", "", "", ""]);
    }

    #[test]
    fn matched_records_are_not_problematic() {
        let matched = map_record(&json!({"id": 1, "matchStatus": "MATCH"})).record;
        let missing = map_record(&json!({"id": 2, "matchStatus": "MISSING"})).record;
        let records = vec![matched, missing];
        let issues = problematic(&records);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, 2);
    }

    #[test]
    fn filename_embeds_batch_and_date() {
        let name = issue_filename("RB-7");
        assert!(name.starts_with("problematic_records_RB-7_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn export_with_no_issues_writes_nothing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/batches/7/records");
            then.status(200)
                .json_body(json!([{"id": 1, "matchStatus": "MATCH"}]));
        });

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("issues.csv");
        let client = ApiClient::with_base_url("t".into(), server.base_url());

        cmd_export(&client, "RB-7", Some(out.clone())).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn export_writes_file_when_issues_exist() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/batches/7/records");
            then.status(200)
                .json_body(json!([{"id": 1, "matchStatus": "MISSING"}]));
        });

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("issues.csv");
        let client = ApiClient::with_base_url("t".into(), server.base_url());

        cmd_export(&client, "7", Some(out.clone())).unwrap();
        let contents = std::fs::read_to_string(&out).unwrap();
        assert!(contents.starts_with("Transaction ID,"));
        assert_eq!(contents.lines().count(), 2);
    }
}
