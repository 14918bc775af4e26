//! Debit/credit partition summary.

use reconsole_model::TxnRecord;
use serde::Serialize;

use crate::format;

#[derive(Debug, Clone, Serialize)]
pub struct DirectionSide {
    pub count: usize,
    pub total_cents: i64,
    /// Share of the combined debit+credit total, `"0%"` when there is none.
    pub percent: String,
    pub average_cents: i64,
    pub total: String,
    pub average: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionSummary {
    pub debit: DirectionSide,
    pub credit: DirectionSide,
    /// credit total − debit total.
    pub net_position_cents: i64,
    pub net_position: String,
}

/// Partition records into debit/credit by direction (case-insensitive;
/// anything that isn't "credit" falls into the debit side so the two totals
/// stay exhaustive over the record set). Amounts are the bank-side amount,
/// 0 where there is no bank record.
pub fn direction_summary(records: &[TxnRecord]) -> DirectionSummary {
    let mut debit = (0usize, 0i64);
    let mut credit = (0usize, 0i64);

    for r in records {
        let amount = r.bank_record.as_ref().map(|b| b.amount_cents).unwrap_or(0);
        if r.direction.eq_ignore_ascii_case("credit") {
            credit.0 += 1;
            credit.1 += amount;
        } else {
            debit.0 += 1;
            debit.1 += amount;
        }
    }

    let combined = debit.1 + credit.1;
    let net = credit.1 - debit.1;

    DirectionSummary {
        debit: side(debit.0, debit.1, combined),
        credit: side(credit.0, credit.1, combined),
        net_position_cents: net,
        net_position: format::usd_cents(net),
    }
}

fn side(count: usize, total_cents: i64, combined_cents: i64) -> DirectionSide {
    let percent = if combined_cents == 0 {
        "0%".to_string()
    } else {
        format::percent(total_cents as f64 * 100.0 / combined_cents as f64)
    };
    let average_cents = if count == 0 {
        0
    } else {
        total_cents / count as i64
    };
    DirectionSide {
        count,
        total_cents,
        percent,
        average_cents,
        total: format::usd_cents(total_cents),
        average: format::usd_cents(average_cents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconsole_model::map_record;
    use serde_json::json;

    fn rec(direction: &str, bank_amount: Option<f64>) -> TxnRecord {
        let mut raw = json!({
            "id": 1,
            "matchStatus": "MATCH",
            "displayData": {"core": {"direction": direction}}
        });
        if let Some(a) = bank_amount {
            raw["backofficeData"] = json!({"core": {"amount": a}});
        }
        map_record(&raw).record
    }

    #[test]
    fn totals_cover_all_bank_amounts() {
        let records = vec![
            rec("Debit", Some(100.00)),
            rec("Credit", Some(250.50)),
            rec("Credit", None),
            rec("Unknown", Some(10.00)),
        ];
        let s = direction_summary(&records);

        let bank_sum: i64 = records
            .iter()
            .map(|r| r.bank_record.as_ref().map(|b| b.amount_cents).unwrap_or(0))
            .sum();
        assert_eq!(s.debit.total_cents + s.credit.total_cents, bank_sum);
        assert_eq!(s.net_position_cents, s.credit.total_cents - s.debit.total_cents);

        assert_eq!(s.credit.count, 2);
        assert_eq!(s.credit.total_cents, 25050);
        // Unknown direction lands on the debit side
        assert_eq!(s.debit.count, 2);
        assert_eq!(s.debit.total_cents, 11000);
    }

    #[test]
    fn percentages_and_averages() {
        let records = vec![rec("debit", Some(75.00)), rec("CREDIT", Some(25.00))];
        let s = direction_summary(&records);
        assert_eq!(s.debit.percent, "75.00%");
        assert_eq!(s.credit.percent, "25.00%");
        assert_eq!(s.debit.average, "$75.00");
        assert_eq!(s.net_position, "-$50.00");
    }

    #[test]
    fn empty_set() {
        let s = direction_summary(&[]);
        assert_eq!(s.debit.count, 0);
        assert_eq!(s.debit.percent, "0%");
        assert_eq!(s.credit.percent, "0%");
        assert_eq!(s.debit.average, "$0.00");
        assert_eq!(s.net_position_cents, 0);
    }
}
