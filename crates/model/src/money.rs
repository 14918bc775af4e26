//! Amount handling. All amounts are `i64` minor units (cents) — never float
//! past the mapping boundary.

use serde_json::Value;

/// Parse a decimal amount string to i64 minor units.
/// Handles "1234.56", "-1234.5", "1,234.56", "$1,234.56", "1234".
pub fn parse_money_string(s: &str) -> Result<i64, String> {
    let s = s.trim().trim_start_matches('$');
    let s: String = s.chars().filter(|c| *c != ',').collect();
    let s = s.as_str();
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-').trim_start_matches('$');
    if s.is_empty() {
        return Err("empty amount".into());
    }
    let (units, cents) = if let Some(dot) = s.find('.') {
        let u: i64 = if dot == 0 {
            0
        } else {
            s[..dot].parse().map_err(|e| format!("bad amount: {e}"))?
        };
        let frac = &s[dot + 1..];
        let c: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|e| format!("bad cents: {e}"))? * 10,
            2 => frac.parse().map_err(|e| format!("bad cents: {e}"))?,
            _ => return Err(format!("too many decimal places: {s}")),
        };
        (u, c)
    } else {
        (s.parse().map_err(|e| format!("bad amount: {e}"))?, 0)
    };
    let minor = units * 100 + cents;
    Ok(if negative { -minor } else { minor })
}

/// Parse an amount out of a raw JSON value: numbers are decimal major
/// units, strings go through [`parse_money_string`].
pub fn parse_cents(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.checked_mul(100)
            } else {
                n.as_f64().map(|f| (f * 100.0).round() as i64)
            }
        }
        Value::String(s) => parse_money_string(s).ok(),
        _ => None,
    }
}

/// Plain decimal rendering for machine output: `-1234.56`. No symbol, no
/// thousands separators.
pub fn format_plain(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_money_strings() {
        assert_eq!(parse_money_string("1080.47").unwrap(), 108047);
        assert_eq!(parse_money_string("0.01").unwrap(), 1);
        assert_eq!(parse_money_string("100").unwrap(), 10000);
        assert_eq!(parse_money_string("-500.25").unwrap(), -50025);
        assert_eq!(parse_money_string("10.5").unwrap(), 1050);
        assert_eq!(parse_money_string("$1,234.56").unwrap(), 123456);
        assert_eq!(parse_money_string("  42  ").unwrap(), 4200);
        assert_eq!(parse_money_string(".50").unwrap(), 50);
        assert!(parse_money_string("10.123").is_err());
        assert!(parse_money_string("abc").is_err());
        assert!(parse_money_string("").is_err());
    }

    #[test]
    fn parse_cents_from_json() {
        assert_eq!(parse_cents(&json!(1234.56)), Some(123456));
        assert_eq!(parse_cents(&json!(100)), Some(10000));
        assert_eq!(parse_cents(&json!(-0.01)), Some(-1));
        assert_eq!(parse_cents(&json!("1,234.56")), Some(123456));
        assert_eq!(parse_cents(&json!(null)), None);
        assert_eq!(parse_cents(&json!(["x"])), None);
    }

    #[test]
    fn plain_formatting() {
        assert_eq!(format_plain(123456), "1234.56");
        assert_eq!(format_plain(-50025), "-500.25");
        assert_eq!(format_plain(0), "0.00");
        assert_eq!(format_plain(5), "0.05");
    }
}
