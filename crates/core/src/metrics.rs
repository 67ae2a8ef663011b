//! Metric names and descriptions.
//!
//! Every Prometheus metric emitted by cctest is named here. Call sites use
//! these constants with the `metrics::counter!()`, `metrics::gauge!()` and
//! `metrics::histogram!()` macros.
//!
//! # Naming
//!
//! - prefix: `cctest_`
//! - suffix: `_total` (counter), `_seconds` (histogram), none (gauge)
//!
//! ```ignore
//! metrics::counter!(cctest_core::metrics::RUN_ITERATIONS_TOTAL).increment(1);
//! ```

// ─── Label keys ────────────────────────────────────────────────────

/// Result label key (success, not_found, failure, panic)
pub const LABEL_RESULT: &str = "result";

/// Case name label key
pub const LABEL_CASE: &str = "case";

/// Chain label key (relay, btc, eth, ont, cosmos)
pub const LABEL_CHAIN: &str = "chain";

// ─── Run loop ──────────────────────────────────────────────────────

/// Case executions by result (counter, label: result)
pub const CASES_EXECUTED_TOTAL: &str = "cctest_cases_executed_total";

/// Case execution latency (histogram, seconds, label: case)
pub const CASE_DURATION_SECONDS: &str = "cctest_case_duration_seconds";

/// Completed iterations of the run loop (counter)
pub const RUN_ITERATIONS_TOTAL: &str = "cctest_run_iterations_total";

// ─── Construction ──────────────────────────────────────────────────

/// Chain invokers constructed and installed (gauge)
pub const INVOKERS_CONSTRUCTED: &str = "cctest_invokers_constructed";

/// Chain RPC requests by chain (counter, label: chain)
pub const RPC_REQUESTS_TOTAL: &str = "cctest_rpc_requests_total";

/// Failed chain RPC requests by chain (counter, label: chain)
pub const RPC_ERRORS_TOTAL: &str = "cctest_rpc_errors_total";

/// Register descriptions for every metric.
///
/// Call once after the recorder is installed. Safe to call without one.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        CASES_EXECUTED_TOTAL,
        "Total number of test case executions by result"
    );
    describe_histogram!(
        CASE_DURATION_SECONDS,
        "Time to execute a single test case in seconds"
    );
    describe_counter!(
        RUN_ITERATIONS_TOTAL,
        "Total number of completed run loop iterations"
    );
    describe_gauge!(
        INVOKERS_CONSTRUCTED,
        "Number of chain invokers installed in the execution context"
    );
    describe_counter!(RPC_REQUESTS_TOTAL, "Total number of chain RPC requests");
    describe_counter!(
        RPC_ERRORS_TOTAL,
        "Total number of chain RPC requests that failed"
    );
}
