//! Run loop.
//!
//! Cases run strictly one at a time. Each invocation runs on its own tokio
//! task, so a panicking case is recorded as a failure. The task is awaited
//! before the next case starts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::case::{CaseFailure, CaseOutcome};
use crate::context::Framework;
use crate::metrics as m;

/// Which cases to run and how many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Case names in execution order; empty means every registered case.
    pub cases: Vec<String>,
    /// Number of iterations over the whole selection.
    pub loops: u32,
}

impl RunRequest {
    /// Build a request.
    pub fn new(cases: Vec<String>, loops: u32) -> Self {
        Self { cases, loops }
    }

    /// Every registered case, once.
    pub fn all() -> Self {
        Self::new(Vec::new(), 1)
    }

    /// Split a comma-separated case list, dropping blanks.
    pub fn parse_case_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl Default for RunRequest {
    fn default() -> Self {
        Self::all()
    }
}

/// One execution of one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    /// 1-based iteration number
    pub iteration: u32,
    /// Requested case name
    pub case: String,
    /// What happened
    pub outcome: CaseOutcome,
    /// Wall-clock duration of the execution
    pub elapsed: Duration,
}

/// Everything a run produced, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique id of this run, attached to every case span
    pub run_id: Uuid,
    /// Iterations requested
    pub iterations: u32,
    /// Records in execution order
    pub records: Vec<CaseRecord>,
    /// Set when shutdown stopped the loop before it finished
    pub interrupted: bool,
}

impl RunReport {
    /// Number of successful executions.
    pub fn passed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    /// Number of failed executions.
    pub fn failed(&self) -> usize {
        self.records.len() - self.passed()
    }

    /// Whether the loop ran to completion with no failures.
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.failed() == 0
    }

    /// Failed records.
    pub fn failures(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter().filter(|r| !r.outcome.is_success())
    }

    /// Case names in execution order.
    pub fn executed(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.case.as_str()).collect()
    }
}

/// Upper bound on the records preallocated for one run.
const MAX_RECORDS_HINT: usize = 4096;

impl Framework {
    /// Run the request against this context.
    ///
    /// An empty case list selects every registered case in registration
    /// order. Unknown names, errors and panics are recorded as failures
    /// and never stop the loop. If shutdown is requested, the loop stops
    /// before the next case and the report is marked interrupted.
    pub async fn run(self: &Arc<Self>, request: &RunRequest) -> RunReport {
        let run_id = Uuid::new_v4();
        let names = if request.cases.is_empty() {
            self.registry().names()
        } else {
            request.cases.clone()
        };

        tracing::info!(
            run_id = %run_id,
            cases = names.len(),
            loops = request.loops,
            "starting run loop"
        );

        let mut report = RunReport {
            run_id,
            iterations: request.loops,
            records: Vec::with_capacity(
                names
                    .len()
                    .saturating_mul(request.loops as usize)
                    .min(MAX_RECORDS_HINT),
            ),
            interrupted: false,
        };

        'iterations: for iteration in 1..=request.loops {
            tracing::info!(run_id = %run_id, iteration, "starting iteration");
            for name in &names {
                if self.is_shutting_down() {
                    tracing::warn!(
                        run_id = %run_id,
                        iteration,
                        next_case = %name,
                        "shutdown requested, stopping run loop"
                    );
                    report.interrupted = true;
                    break 'iterations;
                }

                let span = tracing::info_span!(
                    "case",
                    run_id = %run_id,
                    case = %name,
                    iteration
                );
                let started = Instant::now();
                let outcome = self.execute_case(name).instrument(span).await;
                let elapsed = started.elapsed();

                record_case_metrics(name, &outcome, elapsed);
                match &outcome {
                    CaseOutcome::Success => tracing::info!(
                        run_id = %run_id,
                        case = %name,
                        iteration,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "case passed"
                    ),
                    CaseOutcome::Failure(failure) => tracing::error!(
                        run_id = %run_id,
                        case = %name,
                        iteration,
                        elapsed_ms = elapsed.as_millis() as u64,
                        reason = %failure,
                        "case failed"
                    ),
                }

                report.records.push(CaseRecord {
                    iteration,
                    case: name.clone(),
                    outcome,
                    elapsed,
                });
            }
            metrics::counter!(m::RUN_ITERATIONS_TOTAL).increment(1);
        }

        tracing::info!(
            run_id = %run_id,
            executed = report.records.len(),
            passed = report.passed(),
            failed = report.failed(),
            interrupted = report.interrupted,
            "run loop finished"
        );

        report
    }

    async fn execute_case(self: &Arc<Self>, name: &str) -> CaseOutcome {
        let Some(index) = self.registry().position(name) else {
            return CaseOutcome::Failure(CaseFailure::NotFound);
        };

        let framework = Arc::clone(self);
        let task = tokio::spawn(
            async move {
                match framework.registry().at(index) {
                    Some(case) => case.execute(&framework).await.map_err(|e| e.to_string()),
                    None => Err("registry index out of range".to_owned()),
                }
            }
            .in_current_span(),
        );

        match task.await {
            Ok(Ok(())) => CaseOutcome::Success,
            Ok(Err(reason)) => CaseOutcome::Failure(CaseFailure::Error(reason)),
            Err(join_err) if join_err.is_panic() => {
                let payload = join_err.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_owned());
                CaseOutcome::Failure(CaseFailure::Panicked(message))
            }
            Err(join_err) => CaseOutcome::Failure(CaseFailure::Error(join_err.to_string())),
        }
    }
}

fn record_case_metrics(name: &str, outcome: &CaseOutcome, elapsed: Duration) {
    metrics::counter!(m::CASES_EXECUTED_TOTAL, m::LABEL_RESULT => outcome.label()).increment(1);
    metrics::histogram!(m::CASE_DURATION_SECONDS, m::LABEL_CASE => name.to_owned())
        .record(elapsed.as_secs_f64());
}
