//! FTMS: File/Text Management System
//!
//! Catalogs a directory tree into SQLite, extracts text from each file,
//! and ranks files by how often a search term occurs in them.

pub mod catalog;
pub mod encoding;
pub mod extract;
pub mod index;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod search;

pub use index::FileIndex;
pub use pipeline::{run, PipelineConfig, RunSummary};
pub use schema::{FileRecord, IngestSummary, SearchOutcome, SearchReport, SearchResult};
