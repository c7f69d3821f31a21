use serde::{Deserialize, Serialize};

/// A catalog row from `all_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub file_name: String,
    pub full_path: String,
    pub file_type: String,
    pub file_size: u64,
    pub content: Option<String>,
}

/// A catalog row before insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub file_name: String,
    pub full_path: String,
    pub file_type: String,
    pub file_size: u64,
    pub content: Option<String>,
}

/// A catalog row annotated with the occurrence count of one search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub file: FileRecord,
    pub occurrence_num: u64,
}

/// Everything a search run produced when the query selected at least one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub term: String,
    /// Rows selected by the `LIKE` query, zero counts included.
    pub matched: usize,
    /// Sum of every computed count, zero counts included.
    pub total_occurrences: u64,
    /// Positive-count results in query order.
    pub results: Vec<SearchResult>,
    /// File name to count, positive only, ascending by count.
    pub ranking: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query selected nothing; no report is emitted.
    NoMatches,
    Matched(SearchReport),
}

/// Per-pass ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub inserted: usize,
    pub filtered: usize,
    pub unreadable: usize,
    pub insert_failures: usize,
}
