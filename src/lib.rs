pub mod args;
pub mod ddl;
pub mod error;
pub mod referrers;
pub mod render;
pub mod report;
pub mod store;
pub mod tree;
pub mod utils;

pub use args::{Args, OutputFormat};
pub use error::{LogFacetsError, Result};
pub use referrers::{aggregate, ReferrerEntry};
pub use render::{JsonSink, ReportSink, TextSink};
pub use report::{run_from_args, run_report, ReportSummary};
pub use store::{LogQueryService, SqliteLogStore};
pub use tree::{build_tree, PathTreeNode, RefCount};
