//! Brick extraction pipeline for BrickMapper.
//!
//! This crate turns a free-text operation description into the Bricks needed
//! to perform it: it routes the query to a retrieval index, formats the
//! retrieved context, builds the extraction prompt, parses the model's JSON
//! and sanitizes prerequisite IDs before shaping the flat per-row record.

pub mod batch;
pub mod context;
pub mod grammar;
pub mod processor;
pub mod prompt;
pub mod response;
pub mod router;
pub mod sanitize;

#[cfg(test)]
mod testing;

pub use batch::{BatchProgress, BatchSummary, MappedRow, OperationRow, SilentBatchProgress, run_batch};
pub use processor::RowProcessor;
pub use response::ParseOutcome;
pub use router::{IndexKind, IndexSet, select_index};
