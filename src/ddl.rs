use regex::Regex;

use crate::error::{LogFacetsError, Result};

/// Columns of the access-log table, in storage order.
pub const LOG_COLUMNS: &[(&str, &str)] = &[
    ("bucket_name", "TEXT"),
    ("request_date", "TEXT"),
    ("remote_ip", "TEXT"),
    ("operation", "TEXT"),
    ("key", "TEXT"),
    ("request_uri", "TEXT"),
    ("http_status", "INTEGER"),
    ("total_time", "INTEGER"),
    ("referrer", "TEXT"),
    ("user_agent", "TEXT"),
    ("version_id", "TEXT"),
    ("end_point", "TEXT"),
];

// Schema names SQLite reserves for the connection itself.
const RESERVED_SCHEMAS: &[&str] = &["main", "temp"];

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Checks that `value` can be spliced into SQL text as a quoted identifier.
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    let pattern = Regex::new(IDENTIFIER_PATTERN)
        .map_err(|e| LogFacetsError::Configuration(format!("identifier pattern: {}", e)))?;
    if !pattern.is_match(value) {
        return Err(LogFacetsError::Configuration(format!(
            "{} name {:?} must be letters, digits or underscores and not start with a digit",
            kind, value
        )));
    }
    Ok(())
}

pub fn validate_database_name(database: &str) -> Result<()> {
    validate_identifier("database", database)?;
    if RESERVED_SCHEMAS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(database))
    {
        return Err(LogFacetsError::Configuration(format!(
            "database name {:?} is reserved",
            database
        )));
    }
    Ok(())
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// `"database"."table"` for use in query text.
pub fn qualified_table(database: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(database), quote_ident(table))
}

pub fn log_table_ddl(database: &str, table: &str) -> String {
    let spacing = " ".repeat(4);
    let columns = LOG_COLUMNS
        .iter()
        .map(|(name, ty)| format!("{}{} {}", spacing, quote_ident(name), ty))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        qualified_table(database, table),
        columns
    )
}
