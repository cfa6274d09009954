use anyhow::Result;
use clap::Parser;
use std::io;
use tracing::{error, info};

use logfacets::utils::{setup_logging, validate_args};
use logfacets::{run_from_args, Args, JsonSink, OutputFormat, ReportSink, TextSink};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let stdout = io::stdout().lock();
    let mut sink: Box<dyn ReportSink> = match args.format {
        OutputFormat::Text => Box::new(TextSink::new(stdout)),
        OutputFormat::Json => Box::new(JsonSink::new(stdout)),
    };

    match run_from_args(&args, sink.as_mut()) {
        Ok(summary) => {
            info!(
                action = "complete",
                component = "main",
                domains = summary.domains,
                paths = summary.paths,
                page_hits = summary.page_hits,
                referrers = summary.referrers,
                "Report written"
            );
            Ok(())
        }
        Err(e) => {
            error!(action = "abort", component = "main", error = %e, "Report failed");
            drop(sink);
            std::process::exit(1);
        }
    }
}
