use anyhow::Result;
use logfacets::{
    run_report, LogFacetsError, LogQueryService, ReportSink, SqliteLogStore, TextSink,
};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// --- Helpers ---

struct Hit<'a> {
    bucket: &'a str,
    key: &'a str,
    status: i64,
    referrer: &'a str,
}

fn hit<'a>(bucket: &'a str, key: &'a str, status: i64, referrer: &'a str) -> Hit<'a> {
    Hit {
        bucket,
        key,
        status,
        referrer,
    }
}

fn write_store(dir: &Path, hits: &[Hit<'_>]) -> Result<PathBuf> {
    let path = dir.join("logs.db");
    let conn = Connection::open(&path)?;
    conn.execute_batch(
        "CREATE TABLE httplogs (
            bucket_name TEXT, request_date TEXT, remote_ip TEXT, operation TEXT,
            key TEXT, request_uri TEXT, http_status INTEGER, total_time INTEGER,
            referrer TEXT, user_agent TEXT, version_id TEXT, end_point TEXT
        )",
    )?;
    for h in hits {
        conn.execute(
            "INSERT INTO httplogs (bucket_name, key, http_status, referrer) VALUES (?1, ?2, ?3, ?4)",
            params![h.bucket, h.key, h.status, h.referrer],
        )?;
    }
    Ok(path)
}

fn sample_hits() -> Vec<Hit<'static>> {
    let mut hits = vec![
        hit("bearcave.com", "software/divide.htm", 200, "\"https://www.google.com/\""),
        hit("bearcave.com", "software/divide.htm", 200, "\"http://google.com/\""),
        hit("bearcave.com", "software/java/index.html", 200, "\"https://duckduckgo.com/\""),
        hit("bearcave.com", "links.htm", 200, "\"-\""),
        hit("bearcave.com", "links.htm", 200, "\"https://bing.com/\""),
        // Filtered: failed request, non-page key, internal and self referrers.
        hit("bearcave.com", "backup/bitcoin.html", 404, "\"https://evil.example/\""),
        hit("bearcave.com", "images/logo.png", 200, "\"https://google.com/\""),
        hit("bearcave.com", "links.htm", 200, "\"http://52.219.1.2/bucket\""),
        hit("bearcave.com", "links.htm", 200, "\"https://bearcave.com/index.html\""),
        hit("bearcave.com", "links.htm", 200, "\"https://google.com/search?q=x\""),
        hit("topstone.com", "index.html", 200, "\"https://google.com/\""),
    ];
    hits.push(hit("bearcave.com", "software/divide.htm", 200, "\"https://google.com/\""));
    hits
}

fn open_sample(dir: &TempDir) -> Result<SqliteLogStore> {
    let path = write_store(dir.path(), &sample_hits())?;
    Ok(SqliteLogStore::open(&path, "orclogdb", "httplogs")?)
}

// --- Store queries ---

#[test]
fn lists_distinct_domains() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_sample(&dir)?;

    assert_eq!(store.list_domains()?, vec!["bearcave.com", "topstone.com"]);
    Ok(())
}

#[test]
fn path_counts_keep_successful_pages_only() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_sample(&dir)?;

    let mut paths = store.path_counts("bearcave.com")?;
    paths.sort();

    assert_eq!(
        paths,
        vec![
            ("links.htm".to_string(), 5),
            ("software/divide.htm".to_string(), 3),
            ("software/java/index.html".to_string(), 1),
        ]
    );
    Ok(())
}

#[test]
fn referrer_counts_are_normalized_and_filtered() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_sample(&dir)?;

    let mut referrers = store.referrer_counts("bearcave.com")?;
    referrers.sort();

    assert_eq!(
        referrers,
        vec![
            ("-".to_string(), 1),
            ("bing.com/".to_string(), 1),
            ("duckduckgo.com/".to_string(), 1),
            ("google.com/".to_string(), 3),
        ]
    );
    Ok(())
}

#[test]
fn missing_table_is_created_empty() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_store(dir.path(), &[])?;

    let store = SqliteLogStore::open(&path, "orclogdb", "fresh_logs")?;

    assert!(store.has_table()?);
    assert!(store.list_domains()?.is_empty());
    assert!(store.path_counts("bearcave.com")?.is_empty());
    Ok(())
}

#[test]
fn missing_store_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let err = SqliteLogStore::open(&dir.path().join("absent.db"), "orclogdb", "httplogs")
        .err()
        .unwrap();

    assert!(matches!(err, LogFacetsError::Configuration(_)), "{err:?}");
}

#[test]
fn unsafe_identifiers_are_a_configuration_error() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_store(dir.path(), &[])?;

    for (db, table) in [("main", "httplogs"), ("orclogdb", "logs; DROP TABLE x")] {
        let err = SqliteLogStore::open(&path, db, table).err().unwrap();
        assert!(matches!(err, LogFacetsError::Configuration(_)), "{err:?}");
    }
    Ok(())
}

// --- Full report ---

#[test]
fn report_renders_every_section() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_sample(&dir)?;
    let mut sink = TextSink::new(Vec::new());

    let summary = run_report(&store, &mut sink, "bearcave.com", 10)?;
    let text = String::from_utf8(sink.into_inner())?;

    assert_eq!(summary.domains, 2);
    assert_eq!(summary.paths, 3);
    assert_eq!(summary.page_hits, 9);
    assert_eq!(summary.referrers, 3);

    let expected_tree = "Path tree for bearcave.com\n\
                         / 9\n    links.htm 5\n    software 4\n        divide.htm 3\n        java 1\n            index.html 1\n";
    assert!(text.starts_with("Domains:\nbearcave.com\ntopstone.com\n"), "{text}");
    assert!(text.contains(expected_tree), "{text}");

    let referrers: Vec<&str> = text
        .lines()
        .skip_while(|line| *line != "Referrer sites:")
        .skip(1)
        .collect();
    assert_eq!(referrers.len(), 3);
    assert_eq!(referrers[0], "google.com/, 3");
    assert!(!text.contains("-, "));
    Ok(())
}

#[test]
fn unknown_domain_still_reports_empty_sections() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_sample(&dir)?;
    let mut sink = TextSink::new(Vec::new());

    let summary = run_report(&store, &mut sink, "nowhere.org", 10)?;
    let text = String::from_utf8(sink.into_inner())?;

    assert_eq!(summary.paths, 0);
    assert_eq!(summary.page_hits, 0);
    assert!(text.contains("Path tree for nowhere.org\n/ 0\n"), "{text}");
    assert!(text.ends_with("Referrer sites:\n"), "{text}");
    Ok(())
}

// --- Failure handling ---

struct PathsUnavailable;

impl LogQueryService for PathsUnavailable {
    fn list_domains(&self) -> logfacets::Result<Vec<String>> {
        Ok(vec!["bearcave.com".to_string()])
    }

    fn path_counts(&self, _domain: &str) -> logfacets::Result<Vec<(String, u64)>> {
        Err(LogFacetsError::Query {
            operation: "path_counts",
            source: rusqlite::Error::QueryReturnedNoRows,
        })
    }

    fn referrer_counts(&self, _domain: &str) -> logfacets::Result<Vec<(String, u64)>> {
        panic!("referrers must not be queried after a failed stage");
    }
}

#[derive(Default)]
struct Recorder {
    sections: Vec<&'static str>,
}

impl ReportSink for Recorder {
    fn domains(&mut self, _domains: &[String]) -> std::io::Result<()> {
        self.sections.push("domains");
        Ok(())
    }

    fn path_tree(&mut self, _domain: &str, _root: &logfacets::PathTreeNode) -> std::io::Result<()> {
        self.sections.push("path_tree");
        Ok(())
    }

    fn referrers(
        &mut self,
        _domain: &str,
        _entries: &[logfacets::ReferrerEntry],
    ) -> std::io::Result<()> {
        self.sections.push("referrers");
        Ok(())
    }
}

#[test]
fn query_failure_aborts_after_rendered_sections() {
    let mut sink = Recorder::default();

    let err = run_report(&PathsUnavailable, &mut sink, "bearcave.com", 10).unwrap_err();

    assert!(
        matches!(err, LogFacetsError::Query { operation: "path_counts", .. }),
        "{err:?}"
    );
    assert_eq!(sink.sections, vec!["domains"]);
}
