//! `reconsole-stats` — read-only aggregate views over a batch's records.
//!
//! Pure functions, recomputed on every call. An empty record set is never an
//! error: percentages render as `"0%"`, averages as formatted zero.

pub mod breakdown;
pub mod direction;
pub mod discrepancy;
pub mod format;

pub use breakdown::{status_breakdown, StatusRow};
pub use direction::{direction_summary, DirectionSide, DirectionSummary};
pub use discrepancy::{discrepancy_analysis, DiscrepancyRow, Severity};
