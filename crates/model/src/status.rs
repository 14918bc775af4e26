//! Lifecycle and match-status enums with their fixed wire-mapping tables.
//!
//! The backend sends free-form status strings; everything downstream only
//! ever sees these enums. Unrecognized values map to the documented
//! defaults, never to an "unknown" variant.

use serde::Serialize;

/// Batch lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl BatchStatus {
    /// Map a raw backend status string. Case-insensitive; anything outside
    /// the table is `Pending`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "COMPLETED" => Self::Done,
            "PROCESSING" => Self::Running,
            "FAILED" => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub const ALL: [BatchStatus; 4] = [Self::Pending, Self::Running, Self::Done, Self::Failed];
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Done => write!(f, "DONE"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Per-record reconciliation outcome. Exactly five values; the mapper never
/// lets a backend string through unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    Partial,
    Unmatched,
    Duplicate,
    Missing,
}

impl MatchStatus {
    /// Map a raw backend match-status enum string. `UNMATCHED` is the
    /// default for anything unrecognized.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "MATCH" | "FULL_MATCH" => Self::Matched,
            "PARTIAL_MATCH" => Self::Partial,
            "MISMATCH" => Self::Unmatched,
            "DUPLICATE" => Self::Duplicate,
            "MISSING" => Self::Missing,
            _ => Self::Unmatched,
        }
    }

    /// The four statuses that count as problematic for issue export.
    pub fn is_problematic(&self) -> bool {
        !matches!(self, Self::Matched)
    }

    pub const ALL: [MatchStatus; 5] = [
        Self::Matched,
        Self::Partial,
        Self::Unmatched,
        Self::Duplicate,
        Self::Missing,
    ];
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "MATCHED"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Unmatched => write!(f, "UNMATCHED"),
            Self::Duplicate => write!(f, "DUPLICATE"),
            Self::Missing => write!(f, "MISSING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_status_table() {
        assert_eq!(BatchStatus::from_raw("COMPLETED"), BatchStatus::Done);
        assert_eq!(BatchStatus::from_raw("completed"), BatchStatus::Done);
        assert_eq!(BatchStatus::from_raw("PROCESSING"), BatchStatus::Running);
        assert_eq!(BatchStatus::from_raw("FAILED"), BatchStatus::Failed);
    }

    #[test]
    fn unrecognized_batch_status_is_pending() {
        assert_eq!(BatchStatus::from_raw("QUEUED"), BatchStatus::Pending);
        assert_eq!(BatchStatus::from_raw(""), BatchStatus::Pending);
        assert_eq!(BatchStatus::from_raw("DONE-ISH"), BatchStatus::Pending);
    }

    #[test]
    fn match_status_table() {
        assert_eq!(MatchStatus::from_raw("MATCH"), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_raw("FULL_MATCH"), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_raw("PARTIAL_MATCH"), MatchStatus::Partial);
        assert_eq!(MatchStatus::from_raw("MISMATCH"), MatchStatus::Unmatched);
        assert_eq!(MatchStatus::from_raw("DUPLICATE"), MatchStatus::Duplicate);
        assert_eq!(MatchStatus::from_raw("MISSING"), MatchStatus::Missing);
    }

    #[test]
    fn unrecognized_match_status_is_unmatched() {
        assert_eq!(MatchStatus::from_raw("WEIRD"), MatchStatus::Unmatched);
        assert_eq!(MatchStatus::from_raw(""), MatchStatus::Unmatched);
    }

    #[test]
    fn problematic_statuses() {
        assert!(!MatchStatus::Matched.is_problematic());
        assert!(MatchStatus::Partial.is_problematic());
        assert!(MatchStatus::Unmatched.is_problematic());
        assert!(MatchStatus::Duplicate.is_problematic());
        assert!(MatchStatus::Missing.is_problematic());
    }

    #[test]
    fn display_is_screaming() {
        assert_eq!(MatchStatus::Matched.to_string(), "MATCHED");
        assert_eq!(BatchStatus::Running.to_string(), "RUNNING");
    }
}
