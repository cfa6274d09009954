use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::ddl;
use crate::error::{LogFacetsError, Result};

/// Referrers containing this prefix come from the storage provider's own
/// network rather than from real visitors.
pub const INTERNAL_NETWORK_PREFIX: &str = "52.219.";

/// Source of the per-domain log facts the report is built from.
pub trait LogQueryService {
    /// Distinct domains (bucket names) present in the log store.
    fn list_domains(&self) -> Result<Vec<String>>;

    /// Successfully served `.html`/`.htm` page keys for `domain` and how many
    /// times each was requested.
    fn path_counts(&self, domain: &str) -> Result<Vec<(String, u64)>>;

    /// Normalized referrers to `domain` with their hit counts. Self
    /// references and internal-network referrers are excluded.
    fn referrer_counts(&self, domain: &str) -> Result<Vec<(String, u64)>>;
}

/// Access-log store kept in a SQLite file, attached under its own schema name.
pub struct SqliteLogStore {
    conn: Connection,
    database: String,
    table: String,
}

impl SqliteLogStore {
    /// Attaches the log file at `location` as `database` and makes sure
    /// `database.table` exists.
    pub fn open(location: &Path, database: &str, table: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!(action = "start", component = "log_store", location = ?location, database, table, "Opening log store");

        ddl::validate_database_name(database)?;
        ddl::validate_identifier("table", table)?;

        if !location.is_file() {
            return Err(LogFacetsError::Configuration(format!(
                "log store not found at {:?}",
                location
            )));
        }

        let conn = Connection::open_in_memory().map_err(LogFacetsError::query("open"))?;
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", ddl::quote_ident(database)),
            params![location.to_string_lossy().into_owned()],
        )
        .map_err(LogFacetsError::query("attach"))?;

        let store = Self {
            conn,
            database: database.to_string(),
            table: table.to_string(),
        };
        store.ensure_table()?;

        info!(
            action = "complete",
            component = "log_store",
            duration_ms = start_time.elapsed().as_millis(),
            "Log store ready"
        );
        Ok(store)
    }

    pub fn has_table(&self) -> Result<bool> {
        let query = format!(
            "SELECT COUNT(*) FROM {}.sqlite_master WHERE type = 'table' AND name = ?1",
            ddl::quote_ident(&self.database)
        );
        let found: i64 = self
            .conn
            .query_row(&query, params![self.table], |row| row.get(0))
            .map_err(LogFacetsError::query("has_table"))?;
        Ok(found > 0)
    }

    fn ensure_table(&self) -> Result<()> {
        if self.has_table()? {
            return Ok(());
        }

        info!(action = "create", component = "log_store", database = %self.database, table = %self.table, "Creating log table");
        self.conn
            .execute_batch(&ddl::log_table_ddl(&self.database, &self.table))
            .map_err(LogFacetsError::query("create_table"))
    }

    fn table_ref(&self) -> String {
        ddl::qualified_table(&self.database, &self.table)
    }

    fn counted_rows(
        &self,
        operation: &'static str,
        query: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(LogFacetsError::query(operation))?;
        let rows = stmt
            .query_map(args, |row| {
                let key: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((key, u64::try_from(count).unwrap_or_default()))
            })
            .map_err(LogFacetsError::query(operation))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(LogFacetsError::query(operation))?;
        Ok(rows)
    }
}

impl LogQueryService for SqliteLogStore {
    fn list_domains(&self) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT bucket_name AS domain FROM {} \
             WHERE bucket_name IS NOT NULL ORDER BY domain",
            self.table_ref()
        );
        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(LogFacetsError::query("list_domains"))?;
        let domains = stmt
            .query_map([], |row| row.get(0))
            .map_err(LogFacetsError::query("list_domains"))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(LogFacetsError::query("list_domains"))?;
        Ok(domains)
    }

    fn path_counts(&self, domain: &str) -> Result<Vec<(String, u64)>> {
        // Only 200s: probes for missing pages would otherwise show up as paths.
        let query = format!(
            "SELECT key AS path, COUNT(key) AS count FROM {}
             WHERE bucket_name = ?1 AND http_status = 200
               AND (key LIKE '%.html' OR key LIKE '%.htm')
             GROUP BY key
             ORDER BY count DESC",
            self.table_ref()
        );
        self.counted_rows("path_counts", &query, params![domain])
    }

    fn referrer_counts(&self, domain: &str) -> Result<Vec<(String, u64)>> {
        let query = format!(
            "SELECT replace(replace(replace(replace(referrer, 'http://', ''), 'https://', ''), 'www.', ''), '\"', '') AS normalized,
                    COUNT(referrer) AS count
             FROM {}
             WHERE bucket_name = ?1 AND http_status = 200
               AND referrer NOT LIKE ?2
               AND referrer NOT LIKE '%search%'
               AND referrer NOT LIKE ?3
               AND (key LIKE '%.html' OR key LIKE '%.htm')
             GROUP BY normalized
             ORDER BY count DESC",
            self.table_ref()
        );
        let internal = format!("%{}%", INTERNAL_NETWORK_PREFIX);
        let self_reference = format!("%{}%", domain);
        self.counted_rows(
            "referrer_counts",
            &query,
            params![domain, internal, self_reference],
        )
    }
}
