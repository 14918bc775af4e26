//! Batch and record commands: list, show, records, retry, resolve,
//! templates. Human tables go to stdout, progress/warnings to stderr,
//! `--json` swaps the table for machine output.

use reconsole_api_client::ApiClient;
use reconsole_model::{map_batch, map_records, Batch, BatchStatus, MatchStatus};
use reconsole_stats::{direction_summary, discrepancy_analysis, status_breakdown};

use crate::dash::state::{filter_batches, sort_batches};
use crate::util::{pad_right, parse_batch_ref};
use crate::CliError;

pub fn cmd_batches(
    client: &ApiClient,
    status: Option<String>,
    search: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let status = parse_batch_status_filter(status.as_deref())?;
    let raws = client.list_batches().map_err(CliError::api)?;
    let batches: Vec<Batch> = raws.iter().map(map_batch).collect();

    let search = search.unwrap_or_default();
    let mut visible = filter_batches(&batches, &search, status);
    sort_batches(&mut visible, None);

    if json {
        let out = serde_json::to_string_pretty(&visible)
            .map_err(|e| CliError::general(format!("JSON error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "{} {} {} {} {} {}",
        pad_right("ID", 8),
        pad_right("STATUS", 8),
        pad_right("RECORDS", 8),
        pad_right("BACKOFFICE", 24),
        pad_right("VENDOR", 24),
        "CREATED",
    );
    for b in &visible {
        println!(
            "{} {} {} {} {} {}",
            pad_right(&b.id, 8),
            pad_right(&b.status.to_string(), 8),
            pad_right(&b.record_count.to_string(), 8),
            pad_right(&b.backoffice_file, 24),
            pad_right(&b.vendor_file, 24),
            b.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    eprintln!("{} of {} batches", visible.len(), batches.len());
    Ok(())
}

pub fn cmd_batch(client: &ApiClient, id: &str, json: bool) -> Result<(), CliError> {
    let raw_id = parse_batch_ref(id)?;
    let raw_batch = client.get_batch(raw_id).map_err(CliError::api)?;
    let raw_records = client.list_records(raw_id, None, None).map_err(CliError::api)?;

    let mut batch = map_batch(&raw_batch);
    let (records, warnings) = map_records(&raw_records);
    report_warnings(&warnings);
    batch.records = records;

    let breakdown = status_breakdown(&batch.records);
    let directions = direction_summary(&batch.records);
    let discrepancies = discrepancy_analysis(&batch.records);

    if json {
        let match_rate = batch.display_match_rate();
        let out = serde_json::to_string_pretty(&serde_json::json!({
            "batch": batch,
            "matchRate": match_rate,
            "statusBreakdown": breakdown,
            "directionSummary": directions,
            "discrepancies": discrepancies,
        }))
        .map_err(|e| CliError::general(format!("JSON error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!("{}  [{}]", batch.id, batch.status);
    println!("  backoffice: {}", batch.backoffice_file);
    println!("  vendor:     {}", batch.vendor_file);
    println!("  records:    {}", batch.records.len());
    if let Some(rate) = batch.display_match_rate() {
        println!("  match rate: {rate}%");
    }
    if let Some(ref t) = batch.processing_time {
        println!("  took:       {t}");
    }
    if let Some(ref reason) = batch.failure_reason {
        println!("  failure:    {reason}");
    }

    println!();
    println!(
        "{} {} {} {} {}",
        pad_right("STATUS", 10),
        pad_right("COUNT", 6),
        pad_right("PCT", 8),
        pad_right("TOTAL", 14),
        "AVG CONF",
    );
    for row in &breakdown {
        println!(
            "{} {} {} {} {}",
            pad_right(&row.label, 10),
            pad_right(&row.count.to_string(), 6),
            pad_right(&row.percent, 8),
            pad_right(&row.total, 14),
            row.avg_confidence,
        );
    }

    println!();
    println!(
        "debits: {} ({})   credits: {} ({})   net: {}",
        directions.debit.total,
        directions.debit.count,
        directions.credit.total,
        directions.credit.count,
        directions.net_position,
    );

    if !discrepancies.is_empty() {
        println!();
        println!(
            "{} {} {} {}",
            pad_right("ISSUE", 24),
            pad_right("COUNT", 6),
            pad_right("AFFECTED", 14),
            "SEVERITY",
        );
        for row in &discrepancies {
            println!(
                "{} {} {} {}",
                pad_right(&row.issue_type, 24),
                pad_right(&row.count.to_string(), 6),
                pad_right(&row.affected, 14),
                row.severity,
            );
        }
    }

    Ok(())
}

pub fn cmd_records(
    client: &ApiClient,
    batch: &str,
    status: Option<String>,
    unresolved: bool,
    json: bool,
) -> Result<(), CliError> {
    let raw_id = parse_batch_ref(batch)?;
    let status = parse_match_status_filter(status.as_deref())?;
    let resolved = if unresolved { Some(false) } else { None };

    let raws = client
        .list_records(raw_id, status.map(|s| s.to_string()).as_deref(), resolved)
        .map_err(CliError::api)?;
    let (records, warnings) = map_records(&raws);
    report_warnings(&warnings);

    if json {
        let out = serde_json::to_string_pretty(&records)
            .map_err(|e| CliError::general(format!("JSON error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "{} {} {} {} {} {} {}",
        pad_right("ID", 6),
        pad_right("TXN", 14),
        pad_right("STATUS", 10),
        pad_right("AMOUNT", 12),
        pad_right("DATE", 10),
        pad_right("DIR", 7),
        "DESCRIPTION",
    );
    for r in &records {
        println!(
            "{} {} {} {} {} {} {}{}",
            pad_right(&r.id.to_string(), 6),
            pad_right(&r.transaction_id, 14),
            pad_right(&r.status.to_string(), 10),
            pad_right(&reconsole_model::money::format_plain(r.amount_cents), 12),
            pad_right(&r.date.to_string(), 10),
            pad_right(&r.direction, 7),
            r.description,
            if r.resolved { "  [resolved]" } else { "" },
        );
    }
    eprintln!("{} records", records.len());
    Ok(())
}

pub fn cmd_retry(client: &ApiClient, batch: &str) -> Result<(), CliError> {
    let raw_id = parse_batch_ref(batch)?;
    client.retry_batch(raw_id).map_err(CliError::api)?;

    // The mutation invalidated the cache; pull fresh state so the user sees
    // the batch moving.
    let batch = map_batch(&client.get_batch(raw_id).map_err(CliError::api)?);
    eprintln!("retry requested: {} is now {}", batch.id, batch.status);
    Ok(())
}

pub fn cmd_resolve(
    client: &ApiClient,
    record: i64,
    comment: &str,
    resolve: bool,
) -> Result<(), CliError> {
    // Reject locally before any network traffic.
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Err(CliError::args("a non-empty --comment is required"));
    }

    client
        .resolve_record(record, trimmed, resolve)
        .map_err(CliError::api)?;
    if resolve {
        eprintln!("record {record} resolved");
    } else {
        eprintln!("comment added to record {record}");
    }
    Ok(())
}

pub fn cmd_templates(client: &ApiClient, json: bool) -> Result<(), CliError> {
    let templates = client.list_templates().map_err(CliError::api)?;

    if json {
        let out = serde_json::to_string_pretty(&templates)
            .map_err(|e| CliError::general(format!("JSON error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    for t in &templates {
        let id = t["id"].as_i64().unwrap_or(0);
        let name = t["name"].as_str().unwrap_or("(unnamed)");
        let side = t["side"].as_str().unwrap_or("-");
        println!("{} {} {}", pad_right(&id.to_string(), 6), pad_right(side, 12), name);
    }
    eprintln!("{} templates", templates.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Filter parsing
// ---------------------------------------------------------------------------

fn parse_batch_status_filter(s: Option<&str>) -> Result<Option<BatchStatus>, CliError> {
    let Some(s) = s else { return Ok(None) };
    match s.to_uppercase().as_str() {
        "ALL" => Ok(None),
        "PENDING" => Ok(Some(BatchStatus::Pending)),
        "RUNNING" => Ok(Some(BatchStatus::Running)),
        "DONE" => Ok(Some(BatchStatus::Done)),
        "FAILED" => Ok(Some(BatchStatus::Failed)),
        other => Err(CliError::args(format!(
            "unknown batch status {other:?} (expected PENDING, RUNNING, DONE, FAILED or ALL)"
        ))),
    }
}

fn parse_match_status_filter(s: Option<&str>) -> Result<Option<MatchStatus>, CliError> {
    let Some(s) = s else { return Ok(None) };
    match s.to_uppercase().as_str() {
        "ALL" => Ok(None),
        "MATCHED" => Ok(Some(MatchStatus::Matched)),
        "PARTIAL" => Ok(Some(MatchStatus::Partial)),
        "UNMATCHED" => Ok(Some(MatchStatus::Unmatched)),
        "DUPLICATE" => Ok(Some(MatchStatus::Duplicate)),
        "MISSING" => Ok(Some(MatchStatus::Missing)),
        other => Err(CliError::args(format!(
            "unknown match status {other:?} (expected MATCHED, PARTIAL, UNMATCHED, DUPLICATE, MISSING or ALL)"
        ))),
    }
}

fn report_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}
