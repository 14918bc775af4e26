//! `reconsole-model` — normalized reconciliation view model.
//!
//! Pure crate: converts raw backend payloads (heterogeneous, with several
//! JSON-encoded-as-string fields) into a stable shape the rest of the tool
//! can rely on. No IO, no HTTP.

pub mod mapper;
pub mod model;
pub mod money;
pub mod status;

pub use mapper::{map_batch, map_record, map_records, recompute_match_rate, MappedRecord};
pub use model::{Batch, SideRecord, TxnRecord};
pub use status::{BatchStatus, MatchStatus};
