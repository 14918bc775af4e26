//! Raw backend payload → normalized model.
//!
//! The backend ships batches and records with several fields JSON-encoded as
//! strings (`displayData`, `vendorData`, `backofficeData`, `fieldFlags`,
//! `discrepancies`). Each of those decodes independently: a malformed field
//! degrades to an empty contribution and a warning, it never aborts the
//! record. Scalars resolve through a core sub-object, then a legacy-keyed
//! raw sub-object, then a synthesized default.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::model::{Batch, SideRecord, TxnRecord};
use crate::money;
use crate::status::{BatchStatus, MatchStatus};

static NULL: Value = Value::Null;

/// A mapped record plus any per-field decode warnings. Warnings are for the
/// caller's diagnostics stream; they are never user-blocking.
#[derive(Debug)]
pub struct MappedRecord {
    pub record: TxnRecord,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Batch mapping
// ---------------------------------------------------------------------------

/// Map one raw batch payload. Pure: same input, same output (except that a
/// payload missing `createdAt` stamps the mapping time, per contract).
pub fn map_batch(raw: &Value) -> Batch {
    let raw_id = raw.get("id").and_then(Value::as_i64).unwrap_or(0);
    let status = BatchStatus::from_raw(raw.get("status").and_then(Value::as_str).unwrap_or(""));

    let created_parsed = first_key(raw, &["createdAt", "created_at"]).and_then(parse_timestamp);
    let updated_at = first_key(raw, &["updatedAt", "updated_at"]).and_then(parse_timestamp);

    let processing_time = match (status, created_parsed, updated_at) {
        (BatchStatus::Done, Some(c), Some(u)) => Some(format_processing_time(c, u)),
        _ => None,
    };

    let failure_reason = if status == BatchStatus::Failed {
        first_key(raw, &["failureReason", "failure_reason"])
            .and_then(Value::as_str)
            .map(str::to_string)
    } else {
        None
    };

    Batch {
        id: format!("RB-{raw_id}"),
        raw_id,
        status,
        backoffice_file: file_name(raw, &["backofficeFile", "backoffice_file"]),
        vendor_file: file_name(raw, &["vendorFile", "vendor_file"]),
        record_count: first_key(raw, &["processedRecords", "processed_records", "recordCount"])
            .and_then(Value::as_u64)
            .unwrap_or(0),
        created_at: created_parsed.unwrap_or_else(Utc::now),
        updated_at,
        processing_time,
        failure_reason,
        match_rate: first_key(raw, &["matchRate", "match_rate"])
            .and_then(Value::as_f64)
            .map(|r| r.clamp(0.0, 100.0).round() as u8),
        records: Vec::new(),
    }
}

/// `matched / total`, rounded to the nearest integer percent. None for an
/// empty record set (caller falls back to the backend's static hint).
pub fn recompute_match_rate(records: &[TxnRecord]) -> Option<u8> {
    if records.is_empty() {
        return None;
    }
    let matched = records
        .iter()
        .filter(|r| r.status == MatchStatus::Matched)
        .count();
    Some(((matched as f64 / records.len() as f64) * 100.0).round() as u8)
}

// ---------------------------------------------------------------------------
// Record mapping
// ---------------------------------------------------------------------------

/// Map one raw record payload. Never fails: every malformed field degrades
/// to its documented default.
pub fn map_record(raw: &Value) -> MappedRecord {
    let mut warnings = Vec::new();
    let id = raw.get("id").and_then(Value::as_i64).unwrap_or(0);

    let display = parse_embedded(raw, "displayData", id, &mut warnings);
    let vendor = parse_embedded(raw, "vendorData", id, &mut warnings);
    let backoffice = parse_embedded(raw, "backofficeData", id, &mut warnings);

    let (d_core, d_raw) = sides(&display);
    let (v_core, v_raw) = sides(&vendor);
    let (b_core, b_raw) = sides(&backoffice);

    let transaction_id = scalar(v_core, v_raw, "transaction_id", "Ref No")
        .and_then(value_to_string)
        .unwrap_or_else(|| format!("TXN-{id}"));

    let description = scalar(d_core, d_raw, "description", "Narration")
        .and_then(value_to_string)
        .unwrap_or_else(|| "Unknown Transaction".to_string());

    let amount_cents = scalar(d_core, d_raw, "amount", "Value")
        .and_then(money::parse_cents)
        .unwrap_or(0);

    let date = scalar(d_core, d_raw, "date", "Txn Date")
        .and_then(parse_date)
        .unwrap_or_else(today);

    let direction = scalar(d_core, d_raw, "direction", "Dr/Cr")
        .and_then(value_to_string)
        .map(|d| normalize_direction(&d))
        .unwrap_or_else(|| "Unknown".to_string());

    let status = MatchStatus::from_raw(
        first_key(raw, &["matchStatus", "match_status"])
            .and_then(Value::as_str)
            .unwrap_or(""),
    );

    let confidence = first_key(raw, &["confidenceScore", "confidence_score", "confidence"])
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));

    // Bank side only exists when the backoffice payload actually carried
    // something — a zero-valued stub would be indistinguishable from a real
    // zero-amount entry downstream.
    let bank_record = if is_nonempty_object(b_core) || is_nonempty_object(b_raw) {
        Some(side_record(b_core, b_raw, format!("BNK-{id}")))
    } else {
        None
    };

    let vendor_record = side_record(v_core, v_raw, format!("VND-{id}"));

    let field_flags = match raw.get("fieldFlags").or_else(|| raw.get("field_flags")) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v) => string_list(&v),
            Err(e) => {
                warnings.push(format!("record {id}: fieldFlags: {e}"));
                Vec::new()
            }
        },
        Some(v) => string_list(v),
    };

    MappedRecord {
        record: TxnRecord {
            id,
            transaction_id,
            description,
            amount_cents,
            date,
            status,
            confidence,
            direction,
            bank_record,
            vendor_record,
            ai_reasoning: ai_reasoning(raw, id, &mut warnings),
            field_flags,
            resolved: raw.get("resolved").and_then(Value::as_bool).unwrap_or(false),
            resolution_comments: comment_list(raw.get("resolutionComment")),
        },
        warnings,
    }
}

/// Map a whole record collection, concatenating warnings.
pub fn map_records(raws: &[Value]) -> (Vec<TxnRecord>, Vec<String>) {
    let mut records = Vec::with_capacity(raws.len());
    let mut warnings = Vec::new();
    for raw in raws {
        let mapped = map_record(raw);
        records.push(mapped.record);
        warnings.extend(mapped.warnings);
    }
    (records, warnings)
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn first_key<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(k))
        .find(|v| !v.is_null())
}

/// Decode one JSON-encoded-as-string field. Absent/null is not a warning;
/// a failed parse is.
fn parse_embedded(raw: &Value, field: &str, id: i64, warnings: &mut Vec<String>) -> Value {
    match raw.get(field) {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) => match serde_json::from_str(s) {
            Ok(v) => v,
            Err(e) => {
                warnings.push(format!("record {id}: {field}: {e}"));
                Value::Null
            }
        },
        // Already structured — some backend versions skip the string layer.
        Some(v) => v.clone(),
    }
}

/// Split a side payload into its (core, raw) sub-objects. A flat object
/// with neither key is treated as core.
fn sides(obj: &Value) -> (&Value, &Value) {
    let core = &obj["core"];
    let raw = &obj["raw"];
    if core.is_null() && raw.is_null() {
        (obj, &NULL)
    } else {
        (core, raw)
    }
}

fn scalar<'a>(core: &'a Value, raw: &'a Value, key: &str, legacy: &str) -> Option<&'a Value> {
    core.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| raw.get(legacy).filter(|v| !v.is_null()))
}

fn is_nonempty_object(v: &Value) -> bool {
    v.as_object().map(|m| !m.is_empty()).unwrap_or(false)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn comment_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        _ => Vec::new(),
    }
}

/// Resolve the AI-reasoning text from `discrepancies`: parsed array joins
/// with `"; "`, parsed string passes through, a failed parse falls back to
/// the raw unparsed string.
fn ai_reasoning(raw: &Value, id: i64, warnings: &mut Vec<String>) -> String {
    match raw.get("discrepancies") {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => join_phrases(items),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => join_phrases(&items),
            Ok(Value::String(inner)) => inner,
            Ok(_) => s.clone(),
            Err(e) => {
                warnings.push(format!("record {id}: discrepancies: {e}"));
                s.clone()
            }
        },
        Some(other) => other.to_string(),
    }
}

fn join_phrases(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(value_to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn normalize_direction(d: &str) -> String {
    match d.trim().to_uppercase().as_str() {
        "D" | "DR" | "DEBIT" => "Debit".to_string(),
        "C" | "CR" | "CREDIT" => "Credit".to_string(),
        "" => "Unknown".to_string(),
        _ => d.trim().to_string(),
    }
}

fn side_record(core: &Value, raw: &Value, fallback_id: String) -> SideRecord {
    SideRecord {
        id: scalar(core, raw, "id", "ID")
            .and_then(value_to_string)
            .unwrap_or(fallback_id),
        reference: scalar(core, raw, "reference", "Ref No")
            .and_then(value_to_string)
            .unwrap_or_default(),
        amount_cents: scalar(core, raw, "amount", "Value")
            .and_then(money::parse_cents)
            .unwrap_or(0),
        date: scalar(core, raw, "date", "Txn Date")
            .and_then(parse_date)
            .unwrap_or_else(today),
        description: scalar(core, raw, "description", "Narration")
            .and_then(value_to_string)
            .unwrap_or_default(),
        status: scalar(core, raw, "status", "Status")
            .and_then(value_to_string)
            .unwrap_or_default(),
        direction: scalar(core, raw, "direction", "Dr/Cr")
            .and_then(value_to_string)
            .map(|d| normalize_direction(&d))
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Date/time helpers
// ---------------------------------------------------------------------------

fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let s = v.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_date(v: &Value) -> Option<NaiveDate> {
    let s = v.as_str()?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.date_naive())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn format_processing_time(created: DateTime<Utc>, updated: DateTime<Utc>) -> String {
    let secs = (updated - created).num_seconds().max(0);
    format!("{}m {}s", secs / 60, secs % 60)
}

fn file_name(raw: &Value, keys: &[&str]) -> String {
    first_key(raw, keys)
        .and_then(Value::as_str)
        .map(|p| basename(p).to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown File".to_string())
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
