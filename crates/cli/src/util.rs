use unicode_width::UnicodeWidthStr;

use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

/// Resolve a batch reference ("RB-7" or bare "7") to the backend numeric id.
pub(crate) fn parse_batch_ref(s: &str) -> Result<i64, CliError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("RB-")
        .or_else(|| trimmed.strip_prefix("rb-"))
        .unwrap_or(trimmed);
    digits.parse().map_err(|_| CliError {
        code: EXIT_USAGE,
        message: format!("invalid batch reference: {:?}", s),
        hint: Some("expected a numeric id or RB-<id>".into()),
    })
}

/// Today's date in ISO form (for export filenames).
pub(crate) fn today_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Truncate a string to fit within `width` display columns, adding ".." if
/// truncated. Uses Unicode display width so CJK/emoji alignment stays correct.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if width < 3 {
        for ch in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if cw <= width {
                return ch.to_string();
            }
        }
        return String::new();
    }

    let str_width = UnicodeWidthStr::width(s);
    if str_width <= width {
        return s.to_string();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_refs() {
        assert_eq!(parse_batch_ref("RB-7").unwrap(), 7);
        assert_eq!(parse_batch_ref("rb-12").unwrap(), 12);
        assert_eq!(parse_batch_ref("7").unwrap(), 7);
        assert_eq!(parse_batch_ref(" RB-3 ").unwrap(), 3);
        assert!(parse_batch_ref("RB-").is_err());
        assert!(parse_batch_ref("batch-7").is_err());
    }

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_display("abc", 5), "abc");
        assert_eq!(truncate_display("abcdef", 5), "abc..");
    }

    #[test]
    fn truncate_narrow() {
        assert_eq!(truncate_display("abc", 2), "a");
        assert_eq!(truncate_display("", 5), "");
    }

    #[test]
    fn pad() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }
}
