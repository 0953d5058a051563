use crate::error::{Result, ShrinkError};
use crate::report::{Report, ReportRow};
use crate::scanner::FileCandidate;
use crate::shrink::{CompressionOutcome, Compressor};
use crate::utils::create_progress_spinner;
use crate::{error, verbose};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Continue with the next candidate after a failed overwrite. Off by
    /// default: a partially written file is a safety concern.
    pub keep_going: bool,
    /// Record rejected and errored candidates as `failed` rows in the table.
    /// Failures are always logged at the point of failure either way.
    pub report_failures: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            keep_going: false,
            report_failures: true,
        }
    }
}

/// Drives candidates through the remote protocol one at a time and decides
/// replace-vs-skip per file. Owns the cursor into the candidate list and the
/// accumulated report; no other run state exists.
pub struct BatchRunner<C: Compressor> {
    client: C,
    options: RunnerOptions,
}

impl<C: Compressor> BatchRunner<C> {
    pub fn new(client: C, options: RunnerOptions) -> Self {
        Self { client, options }
    }

    /// Process every candidate in order. At most one candidate is in flight
    /// at any time; the next submit does not start until the current
    /// candidate reaches a terminal state. The remote service throttles
    /// aggressively, so this is an admission-control policy, not an
    /// optimization target.
    pub async fn run(&self, candidates: Vec<FileCandidate>) -> Result<Report> {
        let mut report = Report::new();
        for candidate in &candidates {
            self.process_one(candidate, &mut report).await?;
        }
        Ok(report)
    }

    async fn process_one(&self, candidate: &FileCandidate, report: &mut Report) -> Result<()> {
        let display = candidate.path.display().to_string();
        let started = Instant::now();
        let spinner = create_progress_spinner(&format!("compressing {}", display));

        let bytes = match read_candidate(&candidate.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                spinner.finish_and_clear();
                error!("{}: {}", display, e);
                self.record_failure(report, candidate, &display);
                return Ok(());
            }
        };

        let outcome = match self.client.submit(bytes).await {
            Ok(outcome) => outcome,
            Err(e) => {
                spinner.finish_and_clear();
                error!("{}: {}", display, e);
                self.record_failure(report, candidate, &display);
                return Ok(());
            }
        };

        match outcome {
            CompressionOutcome::Rejected { message } => {
                spinner.finish_and_clear();
                error!("{}: rejected by service: {}", display, message);
                self.record_failure(report, candidate, &display);
            }
            CompressionOutcome::AlreadyOptimal { ratio } => {
                spinner.finish_and_clear();
                verbose!(
                    "{}: ratio {:.3}, already optimized, not replaced",
                    display,
                    ratio
                );
                report.push(ReportRow::skipped(display, candidate.size));
            }
            CompressionOutcome::Optimized {
                input_size,
                output_size,
                ratio,
                url,
            } => {
                let fetched = match self.client.fetch(&url).await {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        spinner.finish_and_clear();
                        error!("{}: {}", display, e);
                        self.record_failure(report, candidate, &display);
                        return Ok(());
                    }
                };
                spinner.finish_and_clear();
                if let Err(e) = tokio::fs::write(&candidate.path, &fetched).await {
                    let write_err = ShrinkError::Write {
                        path: candidate.path.clone(),
                        source: e,
                    };
                    error!("{}", write_err);
                    if !self.options.keep_going {
                        return Err(write_err);
                    }
                    self.record_failure(report, candidate, &display);
                } else {
                    report.push(ReportRow::replaced(
                        display,
                        input_size,
                        output_size,
                        ratio,
                        started.elapsed(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn record_failure(&self, report: &mut Report, candidate: &FileCandidate, display: &str) {
        if self.options.report_failures {
            report.push(ReportRow::failed(display.to_string(), candidate.size));
        }
    }
}

/// Current on-disk bytes of the candidate, read in full for upload.
async fn read_candidate(path: &std::path::Path) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}
