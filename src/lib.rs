pub mod batch;
pub mod cli;
pub mod constants;
pub mod error;
pub mod logger;
pub mod report;
pub mod scanner;
pub mod shrink;
pub mod utils;

pub use batch::{BatchRunner, RunnerOptions};
pub use error::{Result, ShrinkError};
pub use report::{Report, ReportRow, RowStatus};
pub use scanner::{scan, FileCandidate, ScanPolicy};
pub use shrink::{CompressionOutcome, Compressor, ShrinkClient};
