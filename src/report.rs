use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::referrers::{self, ReferrerEntry};
use crate::render::ReportSink;
use crate::store::{LogQueryService, SqliteLogStore};
use crate::tree::{self, PathTreeNode};
use crate::Args;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub domains: usize,
    pub paths: usize,
    pub page_hits: u64,
    pub referrers: usize,
}

/// Runs the three report stages against `service`, handing each section to
/// `sink` as soon as it is ready. A failed stage aborts the run; sections
/// already handed over stay rendered.
pub fn run_report(
    service: &dyn LogQueryService,
    sink: &mut dyn ReportSink,
    domain: &str,
    top: usize,
) -> Result<ReportSummary> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "report", domain, "Starting log report");

    let domains = stage("domains", || service.list_domains())?;
    info!(action = "query", component = "domains", domain_count = domains.len(), "Fetched domains");
    if !domains.iter().any(|d| d == domain) {
        warn!(action = "check", component = "domains", domain, "Requested domain is not in the log store");
    }
    sink.domains(&domains)?;

    let root = stage("path_tree", || path_tree(service, domain))?;
    let paths = count_leaves(&root);
    sink.path_tree(domain, &root)?;

    let entries = stage("referrers", || referrer_entries(service, domain))?;
    let shown = &entries[..entries.len().min(top)];
    sink.referrers(domain, shown)?;

    info!(
        action = "complete",
        component = "report",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Report completed"
    );

    Ok(ReportSummary {
        domains: domains.len(),
        paths,
        page_hits: root.count(),
        referrers: entries.len(),
    })
}

/// Opens the store named by `args` and runs the report into `sink`.
pub fn run_from_args(args: &Args, sink: &mut dyn ReportSink) -> Result<ReportSummary> {
    let store = SqliteLogStore::open(&args.store, &args.db_name, &args.table_name)?;
    run_report(&store, sink, &args.domain, args.top)
}

fn stage<T>(component: &'static str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    let start_time = Instant::now();
    info!(action = "start", component, "Starting stage");

    match run() {
        Ok(value) => {
            info!(
                action = "complete",
                component,
                duration_ms = start_time.elapsed().as_millis(),
                "Stage completed"
            );
            Ok(value)
        }
        Err(e) => {
            error!(action = "abort", component, error = %e, "Stage failed");
            Err(e)
        }
    }
}

fn path_tree(service: &dyn LogQueryService, domain: &str) -> Result<PathTreeNode> {
    let pairs = service.path_counts(domain)?;
    info!(action = "query", component = "path_tree", path_count = pairs.len(), "Fetched page paths");

    let root = tree::build_tree(pairs)?;
    for path in root.unset_leaves() {
        warn!(action = "propagate", component = "path_tree", path = %path, "Leaf has no count, treated as zero");
    }
    Ok(root)
}

fn count_leaves(root: &PathTreeNode) -> usize {
    fn leaves(node: &PathTreeNode) -> usize {
        if node.is_leaf() {
            return 1;
        }
        node.children().into_iter().map(leaves).sum()
    }

    if root.is_leaf() {
        0
    } else {
        leaves(root)
    }
}

fn referrer_entries(service: &dyn LogQueryService, domain: &str) -> Result<Vec<ReferrerEntry>> {
    let rows = service.referrer_counts(domain)?;
    info!(action = "query", component = "referrers", row_count = rows.len(), "Fetched referrer rows");

    let entries = referrers::aggregate(rows);
    info!(action = "aggregate", component = "referrers", referrer_count = entries.len(), "Aggregated referrers");
    Ok(entries)
}
