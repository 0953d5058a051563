pub const SHRINK_ENDPOINT: &str = "https://tinypng.com/backend/opt/shrink";

/// Service-reported `output.size / input.size` at or above which the file is
/// considered already optimized and left untouched.
pub const SKIP_RATIO_THRESHOLD: f64 = 0.9;

pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Default per-file size ceiling, matching the service's upload limit.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5_200_000;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
