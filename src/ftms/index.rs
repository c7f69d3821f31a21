use super::schema::{FileRecord, NewFileRecord, SearchResult};
use crate::diagnostics::Diagnostics;
use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const ALL_FILES_DDL: &str = "CREATE TABLE IF NOT EXISTS all_files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name   TEXT,
    full_path   TEXT,
    file_type   TEXT,
    file_size   INTEGER,
    content     TEXT
)";

const SEARCH_RESULTS_DDL: &str = "CREATE TABLE IF NOT EXISTS search_results (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name       TEXT,
    full_path       TEXT,
    file_type       TEXT,
    file_size       INTEGER,
    content         TEXT,
    occurrence_num  INTEGER
)";

const FILE_COLUMNS: &str = "id, file_name, full_path, file_type, file_size, content";

/// What happened when a table was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Created,
    AlreadyExists,
    Failed,
}

/// SQLite-backed file catalog holding `all_files` and `search_results`.
pub struct FileIndex {
    conn: Mutex<Connection>,
}

impl FileIndex {
    /// Open (or create) the catalog database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).with_context(|| {
            format!("Failed to open catalog database {}", db_path.display())
        })?;
        // Force the file open now so an unusable path fails here, not mid-run.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .with_context(|| format!("Failed to open catalog database {}", db_path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory catalog")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // SQLite's built-in LIKE folds ASCII only; `X LIKE Y` calls `like(Y, X)`.
        conn.create_scalar_function(
            "like",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let pattern = ctx.get::<Option<String>>(0)?;
                let text = ctx.get::<Option<String>>(1)?;
                Ok(pattern
                    .zip(text)
                    .map(|(pattern, text)| like_matches(&pattern, &text)))
            },
        )
        .context("Failed to register case-insensitive LIKE")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Create both tables. An existing table is a warning; any other failure
    /// is logged and leaves that table missing.
    pub fn create_tables(&self, diagnostics: &dyn Diagnostics) -> Vec<(&'static str, TableStatus)> {
        let conn = self.conn.lock();
        [("all_files", ALL_FILES_DDL), ("search_results", SEARCH_RESULTS_DDL)]
            .into_iter()
            .map(|(name, ddl)| (name, Self::create_table(&conn, name, ddl, diagnostics)))
            .collect()
    }

    fn create_table(
        conn: &Connection,
        name: &str,
        ddl: &str,
        diagnostics: &dyn Diagnostics,
    ) -> TableStatus {
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional();

        match exists {
            Ok(Some(())) => {
                diagnostics.warn(&format!("Table '{name}' already exists."));
                return TableStatus::AlreadyExists;
            }
            Ok(None) => {}
            Err(e) => {
                diagnostics.error(&format!("Error creating table '{name}': {e}"));
                return TableStatus::Failed;
            }
        }

        match conn.execute_batch(ddl) {
            Ok(()) => {
                diagnostics.info(&format!("Table '{name}' created successfully"));
                TableStatus::Created
            }
            Err(e) => {
                diagnostics.error(&format!("Error creating table '{name}': {e}"));
                TableStatus::Failed
            }
        }
    }

    /// Begin a transaction. It rolls back on drop unless committed.
    pub fn begin(&self) -> Result<CatalogTx<'_>> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN").context("Failed to begin transaction")?;
        Ok(CatalogTx { conn, finished: false })
    }

    /// Number of rows in `all_files`.
    pub fn count_files(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM all_files", [], |row| row.get(0))
            .context("Failed to count catalog rows")?;
        Ok(count as usize)
    }

    /// Every catalog row in insertion order.
    pub fn files(&self) -> Result<Vec<FileRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {FILE_COLUMNS} FROM all_files ORDER BY id"))?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read catalog rows")
    }

    /// Every persisted search result in insertion order.
    pub fn search_results(&self) -> Result<Vec<SearchResult>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS}, occurrence_num FROM search_results ORDER BY id"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(SearchResult {
                file: row_to_record(row)?,
                occurrence_num: row.get::<_, i64>(6)? as u64,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read search results")
    }
}

/// An open transaction on the catalog connection.
pub struct CatalogTx<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl CatalogTx<'_> {
    /// Insert a catalog row and return its id.
    pub fn insert_file(&self, record: &NewFileRecord) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO all_files (file_name, full_path, file_type, file_size, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.file_name,
                    record.full_path,
                    record.file_type,
                    record.file_size as i64,
                    record.content,
                ],
            )
            .with_context(|| format!("Failed to insert file {}", record.full_path))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn clear_search_results(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM search_results", [])
            .context("Failed to clear search results")?;
        Ok(())
    }

    /// Rows whose name, path, type or content is `LIKE '%term%'`, folding
    /// case across all of Unicode.
    pub fn select_matching(&self, term: &str) -> Result<Vec<FileRecord>> {
        let pattern = format!("%{term}%");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM all_files
             WHERE file_name LIKE ?1
                OR full_path LIKE ?1
                OR file_type LIKE ?1
                OR content LIKE ?1
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![pattern], row_to_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to search catalog")
    }

    pub fn insert_search_result(&self, result: &SearchResult) -> Result<()> {
        let file = &result.file;
        self.conn
            .execute(
                "INSERT INTO search_results
                 (file_name, full_path, file_type, file_size, content, occurrence_num)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    file.file_name,
                    file.full_path,
                    file.file_type,
                    file.file_size as i64,
                    file.content,
                    result.occurrence_num as i64,
                ],
            )
            .with_context(|| format!("Failed to save search result {}", file.full_path))?;
        Ok(())
    }

    pub fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT").context("Failed to commit transaction")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for CatalogTx<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

/// SQL `LIKE` over lower-cased text: `%` matches any run of characters and
/// `_` exactly one.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    let (mut p, mut t) = (0, 0);
    // Last `%` seen and the text position it is currently standing in for.
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                resume = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((star, from)) => {
                    p = star + 1;
                    t = from + 1;
                    resume = Some((star, from + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        file_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        full_path: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        file_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        file_size: row.get::<_, Option<i64>>(4)?.unwrap_or_default() as u64,
        content: row.get(5)?,
    })
}
