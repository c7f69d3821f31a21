use super::index::FileIndex;
use super::schema::{FileRecord, SearchOutcome, SearchReport, SearchResult};
use crate::diagnostics::Diagnostics;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Counts case-insensitive, non-overlapping literal occurrences of one term.
pub struct OccurrenceCounter {
    term_lower: String,
    pattern: Regex,
}

impl OccurrenceCounter {
    pub fn new(term: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid search term '{term}'"))?;
        Ok(Self {
            term_lower: term.to_lowercase(),
            pattern,
        })
    }

    /// Matches in the content plus 1 if the file name contains the term.
    pub fn count(&self, record: &FileRecord) -> u64 {
        let in_content = record
            .content
            .as_deref()
            .map(|text| self.pattern.find_iter(text).count() as u64)
            .unwrap_or(0);
        let in_name = record.file_name.to_lowercase().contains(&self.term_lower);
        in_content + u64::from(in_name)
    }
}

/// File name to count, later rows overwriting earlier ones with the same
/// name, zero counts dropped, stable-sorted ascending.
pub fn rank<'a>(counts: impl IntoIterator<Item = (&'a str, u64)>) -> Vec<(String, u64)> {
    let mut by_name: Vec<(String, u64)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for (name, count) in counts {
        match slots.get(name) {
            Some(&slot) => by_name[slot].1 = count,
            None => {
                slots.insert(name, by_name.len());
                by_name.push((name.to_string(), count));
            }
        }
    }
    by_name.retain(|(_, count)| *count > 0);
    by_name.sort_by_key(|(_, count)| *count);
    by_name
}

/// Rebuild `search_results` for `term`.
///
/// The previous results are always cleared. Rows selected by the query but
/// counting zero add nothing to the total and are not persisted.
pub fn search(index: &FileIndex, term: &str, diagnostics: &dyn Diagnostics) -> Result<SearchOutcome> {
    let counter = OccurrenceCounter::new(term)?;
    let tx = index.begin()?;
    tx.clear_search_results()?;

    let matches = tx.select_matching(term)?;
    if matches.is_empty() {
        tx.commit()?;
        diagnostics.info("No files found with the specified search string.");
        return Ok(SearchOutcome::NoMatches);
    }

    let matched = matches.len();
    let counted: Vec<(FileRecord, u64)> = matches
        .into_iter()
        .map(|record| {
            let count = counter.count(&record);
            (record, count)
        })
        .collect();

    let total_occurrences: u64 = counted.iter().map(|(_, count)| count).sum();
    let ranking = rank(counted.iter().map(|(r, count)| (r.file_name.as_str(), *count)));

    let results: Vec<SearchResult> = counted
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(file, occurrence_num)| SearchResult { file, occurrence_num })
        .collect();

    for result in &results {
        tx.insert_search_result(result)?;
    }
    tx.commit()?;
    diagnostics.info("Search results saved in 'search_results' table");
    diagnostics.info(&format!("Total occurrences of '{term}': {total_occurrences}"));

    Ok(SearchOutcome::Matched(SearchReport {
        term: term.to_string(),
        matched,
        total_occurrences,
        results,
        ranking,
    }))
}
