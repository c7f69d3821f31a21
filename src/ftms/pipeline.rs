use super::catalog::ingest;
use super::index::FileIndex;
use super::report::{summary, write_csv, BarChart, ChartRenderer};
use super::schema::{IngestSummary, SearchOutcome, SearchReport};
use super::search::search;
use crate::diagnostics::Diagnostics;
use anyhow::Result;
use console::Term;
use std::path::PathBuf;

/// Everything one run needs; nothing is read interactively past this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub database: PathBuf,
    /// Directory to catalog; `None` skips ingestion.
    pub root: Option<PathBuf>,
    pub excluded: Vec<String>,
    /// Term to search for; `None` skips the search.
    pub term: Option<String>,
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ingest: Option<IngestSummary>,
    pub search: Option<SearchOutcome>,
}

/// Open the catalog, create its tables, then ingest and search as configured.
///
/// Only a failure to open the database is returned as an error. Ingest and
/// search failures are logged and leave the matching summary field empty.
pub fn run(
    config: &PipelineConfig,
    diagnostics: &dyn Diagnostics,
    chart: Option<&dyn ChartRenderer>,
) -> Result<RunSummary> {
    let index = match FileIndex::open(&config.database) {
        Ok(index) => index,
        Err(e) => {
            diagnostics.error(&format!("Error connecting to catalog database: {e:#}"));
            return Err(e);
        }
    };
    diagnostics.info(&format!("Connected to catalog database {}", config.database.display()));

    index.create_tables(diagnostics);

    let mut outcome = RunSummary::default();

    if let Some(root) = &config.root {
        match ingest(&index, root, &config.excluded, diagnostics) {
            Ok(summary) => outcome.ingest = Some(summary),
            Err(e) => diagnostics.error(&format!("Error inserting files: {e:#}")),
        }
    }

    if let Some(term) = &config.term {
        match search(&index, term, diagnostics) {
            Ok(result) => {
                if let SearchOutcome::Matched(report) = &result {
                    emit(report, config, diagnostics, chart);
                }
                outcome.search = Some(result);
            }
            Err(e) => diagnostics.error(&format!("Error searching files: {e:#}")),
        }
    }

    drop(index);
    diagnostics.info("Catalog connection is closed");
    Ok(outcome)
}

fn emit(
    report: &SearchReport,
    config: &PipelineConfig,
    diagnostics: &dyn Diagnostics,
    chart: Option<&dyn ChartRenderer>,
) {
    match write_csv(&config.csv_path, &report.results) {
        Ok(()) => diagnostics.info(&format!(
            "Search results exported to {}",
            config.csv_path.display()
        )),
        Err(e) => diagnostics.error(&format!("Error writing CSV: {e:#}")),
    }

    if let Err(e) = Term::stdout().write_line(&summary(report)) {
        diagnostics.warn(&format!("Could not print summary: {e}"));
    }

    if let Some(renderer) = chart {
        if let Err(e) = renderer.render(&BarChart::from_ranking(&report.ranking)) {
            diagnostics.error(&format!("Error rendering chart: {e:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Level, RecordingDiagnostics};
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CapturedChart {
        charts: Mutex<Vec<BarChart>>,
    }

    impl ChartRenderer for CapturedChart {
        fn render(&self, chart: &BarChart) -> Result<()> {
            self.charts.lock().push(chart.clone());
            Ok(())
        }
    }

    struct Fixture {
        _dir: TempDir,
        config: PipelineConfig,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("docs");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("notes.txt"), "cat cat dog").unwrap();
        fs::write(
            root.join("readme.html"),
            "<html><head></head><body><p>the cat sat</p></body></html>",
        )
        .unwrap();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let config = PipelineConfig {
            database: dir.path().join("catalog.db"),
            root: Some(root),
            excluded: vec![".png".to_string()],
            term: Some("cat".to_string()),
            csv_path: dir.path().join("search_results.csv"),
        };
        Fixture { _dir: dir, config }
    }

    #[test]
    fn end_to_end_ranks_files() {
        let fx = fixture();
        let diag = RecordingDiagnostics::new();
        let chart = CapturedChart::default();

        let summary = run(&fx.config, &diag, Some(&chart)).unwrap();
        assert_eq!(summary.ingest.unwrap().inserted, 2);
        assert_eq!(summary.ingest.unwrap().filtered, 1);

        let report = match summary.search.unwrap() {
            SearchOutcome::Matched(report) => report,
            SearchOutcome::NoMatches => panic!("expected matches"),
        };
        assert_eq!(report.total_occurrences, 3);
        let counts: Vec<_> = report
            .results
            .iter()
            .map(|r| (r.file.file_name.as_str(), r.occurrence_num))
            .collect();
        assert_eq!(counts, vec![("notes", 2), ("readme", 1)]);

        let csv = fs::read_to_string(&fx.config.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let charts = chart.charts.lock();
        let bars: Vec<_> = charts[0].bars.iter().map(|b| (b.label.as_str(), b.value)).collect();
        assert_eq!(bars, vec![("readme", 1), ("notes", 2)]);
    }

    #[test]
    fn no_matches_writes_nothing() {
        let mut fx = fixture();
        fx.config.term = Some("walrus".to_string());
        let chart = CapturedChart::default();

        let summary = run(&fx.config, &RecordingDiagnostics::new(), Some(&chart)).unwrap();
        assert_eq!(summary.search, Some(SearchOutcome::NoMatches));
        assert!(!fx.config.csv_path.exists());
        assert!(chart.charts.lock().is_empty());
    }

    #[test]
    fn second_run_reuses_tables_and_duplicates_rows() {
        let fx = fixture();
        let diag = RecordingDiagnostics::new();
        run(&fx.config, &diag, None).unwrap();

        let diag = RecordingDiagnostics::new();
        let summary = run(&fx.config, &diag, None).unwrap();
        let existing = diag
            .messages(Level::Warn)
            .iter()
            .filter(|m| m.contains("already exists"))
            .count();
        assert_eq!(existing, 2);

        let report = match summary.search.unwrap() {
            SearchOutcome::Matched(report) => report,
            SearchOutcome::NoMatches => panic!("expected matches"),
        };
        assert_eq!(report.matched, 4);
        assert_eq!(report.total_occurrences, 6);
        assert_eq!(report.results.len(), 4);
        assert_eq!(report.ranking.len(), 2);
    }

    #[test]
    fn unusable_database_is_fatal() {
        let mut fx = fixture();
        fx.config.database = fx.config.csv_path.with_file_name("missing").join("catalog.db");
        let diag = RecordingDiagnostics::new();

        assert!(run(&fx.config, &diag, None).is_err());
        assert!(diag.messages(Level::Error)[0].starts_with("Error connecting"));
    }

    #[test]
    fn csv_failure_is_logged_not_fatal() {
        let mut fx = fixture();
        fx.config.csv_path = fx.config.csv_path.with_file_name("no_such_dir").join("out.csv");
        let diag = RecordingDiagnostics::new();

        let summary = run(&fx.config, &diag, None).unwrap();
        assert!(matches!(summary.search, Some(SearchOutcome::Matched(_))));
        assert!(diag
            .messages(Level::Error)
            .iter()
            .any(|m| m.starts_with("Error writing CSV")));
    }
}
