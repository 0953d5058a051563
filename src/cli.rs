use crate::constants::{DEFAULT_MAX_FILE_SIZE, DEFAULT_TIMEOUT_SECS};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-shrink",
    about = "Compress every image under a directory in place via the TinyPNG web endpoint",
    long_about = "img-shrink scans a directory for image files and relays each one through the \
                  TinyPNG web optimizer, overwriting the original with the optimized bytes when \
                  the savings are significant. Files are processed strictly one at a time to \
                  stay under the service's rate limits.",
    version,
    after_help = "EXAMPLES:\n  \
    img-shrink ./images\n  \
    img-shrink ./assets -r --ext jpg --ext png\n  \
    img-shrink ./photos --max-size 2000000 --keep-going"
)]
pub struct Args {
    #[arg(help = "Root directory to scan for image files")]
    pub root: PathBuf,

    #[arg(
        short = 'r',
        long,
        help = "Recurse into subdirectories",
        long_help = "Recursively scan all subdirectories. Without this flag only files \
                     directly under the root directory are considered."
    )]
    pub recursive: bool,

    #[arg(
        short = 'e',
        long = "ext",
        help = "File extension to include (repeatable, default: jpg jpeg png)",
        long_help = "Extension allow-list entry, without the leading dot. Pass the flag \
                     multiple times to allow several extensions. Matching is case-insensitive."
    )]
    pub extensions: Vec<String>,

    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_MAX_FILE_SIZE,
        help = "Maximum file size in bytes",
        long_help = "Files larger than this are excluded from the scan. The default matches \
                     the service's upload limit."
    )]
    pub max_size: u64,

    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Per-request timeout in seconds",
        long_help = "Deadline applied to each remote call. An expired request is treated as a \
                     transport error for that file and the batch moves on."
    )]
    pub timeout: u64,

    #[arg(
        short = 'k',
        long,
        help = "Continue with the next file after a failed overwrite",
        long_help = "By default a failed overwrite aborts the whole batch, since a partially \
                     written image is unsafe to leave behind silently. With this flag the \
                     failure is recorded and the batch continues."
    )]
    pub keep_going: bool,

    #[arg(
        long,
        help = "Omit rejected and errored files from the final table",
        long_help = "Failures are always logged as they happen; by default they also show up \
                     as 'failed' rows in the summary table. This flag restricts the table to \
                     files that were actually processed."
    )]
    pub no_failed_rows: bool,

    #[arg(short = 'q', long, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(short = 'v', long, help = "Verbose per-file output")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_require_root() {
        let result = Args::try_parse_from(["img-shrink"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["img-shrink", "./images"]).unwrap();
        assert_eq!(args.root, PathBuf::from("./images"));
        assert!(!args.recursive);
        assert!(args.extensions.is_empty());
        assert_eq!(args.max_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(args.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(!args.keep_going);
        assert!(!args.no_failed_rows);
    }

    #[test]
    fn test_args_repeatable_extensions() {
        let args =
            Args::try_parse_from(["img-shrink", ".", "--ext", "jpg", "--ext", "webp"]).unwrap();
        assert_eq!(args.extensions, vec!["jpg", "webp"]);
    }
}
