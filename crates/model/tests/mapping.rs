use reconsole_model::{map_batch, map_record, map_records, BatchStatus, MatchStatus};
use serde_json::json;

// -------------------------------------------------------------------------
// Batch mapping
// -------------------------------------------------------------------------

#[test]
fn batch_golden() {
    let raw = json!({
        "id": 7,
        "status": "COMPLETED",
        "backofficeFile": "/uploads/2024/ledger_jan.csv",
        "vendorFile": "/mnt/drops/stripe_jan.csv",
        "processedRecords": 120,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:04:23Z",
        "matchRate": 87
    });

    let batch = map_batch(&raw);
    assert_eq!(batch.id, "RB-7");
    assert_eq!(batch.raw_id, 7);
    assert_eq!(batch.status, BatchStatus::Done);
    assert_eq!(batch.backoffice_file, "ledger_jan.csv");
    assert_eq!(batch.vendor_file, "stripe_jan.csv");
    assert_eq!(batch.record_count, 120);
    assert_eq!(batch.processing_time.as_deref(), Some("4m 23s"));
    assert_eq!(batch.match_rate, Some(87));
    assert!(batch.failure_reason.is_none());
    assert!(batch.records.is_empty());
}

#[test]
fn batch_unrecognized_status_is_pending() {
    let batch = map_batch(&json!({"id": 1, "status": "SOMETHING_NEW"}));
    assert_eq!(batch.status, BatchStatus::Pending);
    // No processing time without Done + timestamps
    assert!(batch.processing_time.is_none());
}

#[test]
fn batch_missing_files_default() {
    let batch = map_batch(&json!({"id": 3, "status": "PROCESSING"}));
    assert_eq!(batch.backoffice_file, "Unknown File");
    assert_eq!(batch.vendor_file, "Unknown File");
    assert_eq!(batch.record_count, 0);
}

#[test]
fn batch_failure_reason_only_when_failed() {
    let failed = map_batch(&json!({
        "id": 4, "status": "FAILED", "failureReason": "vendor file truncated"
    }));
    assert_eq!(failed.failure_reason.as_deref(), Some("vendor file truncated"));

    // The same field on a non-failed batch is ignored
    let done = map_batch(&json!({
        "id": 5, "status": "COMPLETED", "failureReason": "stale"
    }));
    assert!(done.failure_reason.is_none());
}

#[test]
fn batch_no_processing_time_without_updated_at() {
    let batch = map_batch(&json!({
        "id": 6, "status": "COMPLETED", "createdAt": "2024-01-01T00:00:00Z"
    }));
    assert_eq!(batch.status, BatchStatus::Done);
    assert!(batch.processing_time.is_none());
}

#[test]
fn batch_mapping_is_idempotent() {
    let raw = json!({
        "id": 9,
        "status": "FAILED",
        "backofficeFile": "a/b.csv",
        "vendorFile": "c/d.csv",
        "createdAt": "2024-02-02T10:00:00Z",
        "failureReason": "boom"
    });
    let a = serde_json::to_value(map_batch(&raw)).unwrap();
    let b = serde_json::to_value(map_batch(&raw)).unwrap();
    assert_eq!(a, b);
}

// -------------------------------------------------------------------------
// Record mapping
// -------------------------------------------------------------------------

fn full_raw_record() -> serde_json::Value {
    json!({
        "id": 42,
        "matchStatus": "PARTIAL_MATCH",
        "confidenceScore": 0.87,
        "displayData": "{\"core\":{\"description\":\"Card settlement\",\"amount\":1234.56,\"date\":\"2024-01-15\",\"direction\":\"Credit\"}}",
        "vendorData": "{\"core\":{\"id\":\"v-42\",\"transaction_id\":\"STR-889\",\"amount\":1234.56,\"date\":\"2024-01-15\",\"description\":\"stripe payout\",\"status\":\"settled\",\"direction\":\"CR\"}}",
        "backofficeData": "{\"raw\":{\"ID\":\"L-77\",\"Ref No\":\"INV-2210\",\"Value\":\"1,234.50\",\"Txn Date\":\"2024-01-14\",\"Narration\":\"ledger entry\",\"Dr/Cr\":\"CR\"}}",
        "fieldFlags": "[\"amount\",\"date\"]",
        "discrepancies": "[\"Amount mismatch: 0.06 difference\",\"Date offset: 1 day\"]",
        "resolved": false,
        "resolutionComment": ["checked with ops"]
    })
}

#[test]
fn record_golden() {
    let mapped = map_record(&full_raw_record());
    assert!(mapped.warnings.is_empty());

    let r = mapped.record;
    assert_eq!(r.id, 42);
    assert_eq!(r.transaction_id, "STR-889");
    assert_eq!(r.description, "Card settlement");
    assert_eq!(r.amount_cents, 123456);
    assert_eq!(r.date.to_string(), "2024-01-15");
    assert_eq!(r.status, MatchStatus::Partial);
    assert_eq!(r.confidence, Some(0.87));
    assert_eq!(r.direction, "Credit");
    assert_eq!(
        r.ai_reasoning,
        "Amount mismatch: 0.06 difference; Date offset: 1 day"
    );
    assert_eq!(r.field_flags, vec!["amount", "date"]);
    assert!(!r.resolved);
    assert_eq!(r.resolution_comments, vec!["checked with ops"]);

    let bank = r.bank_record.expect("bank side present");
    assert_eq!(bank.id, "L-77");
    assert_eq!(bank.reference, "INV-2210");
    assert_eq!(bank.amount_cents, 123450);
    assert_eq!(bank.date.to_string(), "2024-01-14");
    assert_eq!(bank.direction, "Credit");

    assert_eq!(r.vendor_record.id, "v-42");
    assert_eq!(r.vendor_record.description, "stripe payout");
}

#[test]
fn record_all_embedded_fields_invalid() {
    let raw = json!({
        "id": 9,
        "matchStatus": "MISMATCH",
        "displayData": "{broken",
        "vendorData": "also broken",
        "backofficeData": "[not, closed",
        "fieldFlags": "nope",
        "discrepancies": null
    });

    let mapped = map_record(&raw);
    // One warning per failed field
    assert_eq!(mapped.warnings.len(), 4);

    let r = mapped.record;
    assert_eq!(r.transaction_id, "TXN-9");
    assert_eq!(r.description, "Unknown Transaction");
    assert_eq!(r.amount_cents, 0);
    assert_eq!(r.direction, "Unknown");
    assert!(r.bank_record.is_none());
    assert!(r.field_flags.is_empty());
    assert_eq!(r.ai_reasoning, "");
    // Vendor side is synthesized, never absent
    assert_eq!(r.vendor_record.id, "VND-9");
}

#[test]
fn record_status_is_always_one_of_five() {
    for raw_status in ["MATCH", "FULL_MATCH", "PARTIAL_MATCH", "MISMATCH", "DUPLICATE", "MISSING", "garbage", ""] {
        let mapped = map_record(&json!({"id": 1, "matchStatus": raw_status}));
        assert!(MatchStatus::ALL.contains(&mapped.record.status));
    }
}

#[test]
fn record_partial_match_maps_to_partial() {
    let mapped = map_record(&json!({"id": 1, "matchStatus": "PARTIAL_MATCH"}));
    assert_eq!(mapped.record.status, MatchStatus::Partial);
}

#[test]
fn record_mapping_is_idempotent() {
    let raw = full_raw_record();
    let a = serde_json::to_value(&map_record(&raw).record).unwrap();
    let b = serde_json::to_value(&map_record(&raw).record).unwrap();
    assert_eq!(a, b);
}

#[test]
fn record_bare_string_comment_is_wrapped() {
    let mapped = map_record(&json!({
        "id": 3, "matchStatus": "MATCH", "resolutionComment": "single note"
    }));
    assert_eq!(mapped.record.resolution_comments, vec!["single note"]);
}

#[test]
fn record_no_bank_side_for_empty_object() {
    let mapped = map_record(&json!({
        "id": 5, "matchStatus": "MISSING", "backofficeData": "{}"
    }));
    assert!(mapped.record.bank_record.is_none());
}

#[test]
fn record_confidence_clamped() {
    let over = map_record(&json!({"id": 1, "confidenceScore": 1.8}));
    assert_eq!(over.record.confidence, Some(1.0));
    let missing = map_record(&json!({"id": 1}));
    assert_eq!(missing.record.confidence, None);
}

#[test]
fn map_records_concatenates_warnings() {
    let raws = vec![
        json!({"id": 1, "displayData": "{bad"}),
        json!({"id": 2, "vendorData": "{worse"}),
        full_raw_record(),
    ];
    let (records, warnings) = map_records(&raws);
    assert_eq!(records.len(), 3);
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("record 1"));
    assert!(warnings[1].contains("record 2"));
}
