// ==========================================
// Logging Initialization
// ==========================================
// tracing + tracing-subscriber, level driven by RUST_LOG.
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global subscriber.
///
/// # Environment
/// - `RUST_LOG`: level filter (default: info)
///   e.g. RUST_LOG=debug or RUST_LOG=exam_planner=trace
///
/// # Example
/// ```no_run
/// use exam_planner::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Subscriber for tests, verbose and capture-friendly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
