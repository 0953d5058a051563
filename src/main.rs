use anyhow::Context;
use clap::Parser;
use img_shrink::cli::Args;
use img_shrink::{
    info, logger, scan, warn, BatchRunner, RowStatus, RunnerOptions, ScanPolicy, ShrinkClient,
};
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::set_quiet_mode(args.quiet);
    logger::set_verbose_mode(args.verbose);

    let mut policy = ScanPolicy {
        recursive: args.recursive,
        max_size: args.max_size,
        ..ScanPolicy::default()
    };
    if !args.extensions.is_empty() {
        policy.extensions = args
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
    }

    let started = Instant::now();

    // The scan completes before any network call; the candidate set is fixed
    // for the whole run.
    let candidates = scan(&args.root, &policy)
        .with_context(|| format!("failed to scan {}", args.root.display()))?;
    if candidates.is_empty() {
        info!("No matching image files found under {}", args.root.display());
        return Ok(());
    }
    info!("Found {} file(s) to compress", candidates.len());

    let client = ShrinkClient::new(Duration::from_secs(args.timeout))?;
    let runner = BatchRunner::new(
        client,
        RunnerOptions {
            keep_going: args.keep_going,
            report_failures: !args.no_failed_rows,
        },
    );
    let report = runner.run(candidates).await?;

    info!("{}", report.render());
    info!("{}", report.render_summary(started.elapsed()));
    let failed = report.count(RowStatus::Failed);
    if failed > 0 {
        warn!("{} file(s) could not be optimized", failed);
    }

    Ok(())
}
