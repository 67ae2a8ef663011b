//! Run loop integration tests
//!
//! Exercises the frozen context and run loop through the public API only:
//! selection, ordering, iteration, failure isolation and shutdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cctest_core::{
    BoxFuture, CaseDescriptor, CaseError, CaseFailure, CaseOutcome, CctestConfig, ChainError,
    ChainInvoker, ChainKind, Framework, FrameworkBuilder, RunRequest, TestCase,
};

// =============================================================================
// Helpers
// =============================================================================

/// Invoker that answers every query with a fixed height.
struct StaticInvoker {
    chain: ChainKind,
}

impl ChainInvoker for StaticInvoker {
    fn chain(&self) -> ChainKind {
        self.chain
    }

    fn endpoint(&self) -> &str {
        "mock://static"
    }

    fn account(&self) -> Option<&str> {
        None
    }

    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async { Ok(100) })
    }

    fn call<'a>(
        &'a self,
        _method: &'a str,
        params: serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, ChainError>> {
        Box::pin(async move { Ok(params) })
    }
}

type Journal = Arc<Mutex<Vec<String>>>;

/// How a recording case behaves after writing to the journal.
#[derive(Clone, Copy)]
enum Behavior {
    Pass,
    Fail,
    Panic,
    Shutdown,
}

/// Case that appends `start:<name>` and `end:<name>` to a shared journal.
struct Recording {
    name: &'static str,
    journal: Journal,
    behavior: Behavior,
}

impl TestCase for Recording {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        self.journal
            .lock()
            .expect("journal lock")
            .push(format!("start:{}", self.name));
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.journal
            .lock()
            .expect("journal lock")
            .push(format!("end:{}", self.name));

        match self.behavior {
            Behavior::Pass => Ok(()),
            Behavior::Fail => Err(CaseError::Assertion(format!("{} failed", self.name))),
            Behavior::Panic => panic!("{} exploded", self.name),
            Behavior::Shutdown => {
                ctx.shutdown_token().cancel();
                Ok(())
            }
        }
    }
}

fn framework(journal: &Journal, cases: &[(&'static str, Behavior)]) -> Arc<Framework> {
    let mut builder = FrameworkBuilder::new(Arc::new(CctestConfig::default()));
    for chain in ChainKind::ALL {
        builder
            .set_handle(chain, Arc::new(StaticInvoker { chain }))
            .expect("set handle");
    }
    for &(name, behavior) in cases {
        builder
            .register(CaseDescriptor::new(
                name,
                "recording case",
                Recording {
                    name,
                    journal: Arc::clone(journal),
                    behavior,
                },
            ))
            .expect("register case");
    }
    Arc::new(builder.build().expect("build framework"))
}

fn started(journal: &Journal) -> Vec<String> {
    journal
        .lock()
        .expect("journal lock")
        .iter()
        .filter_map(|entry| entry.strip_prefix("start:").map(str::to_owned))
        .collect()
}

fn transfer_cases() -> Vec<(&'static str, Behavior)> {
    vec![
        ("transfer_ab", Behavior::Pass),
        ("transfer_bc", Behavior::Pass),
        ("roundtrip", Behavior::Pass),
    ]
}

// =============================================================================
// Selection and ordering
// =============================================================================

#[tokio::test]
async fn named_case_runs_once_per_iteration() {
    // Given: three registered cases
    let journal = Journal::default();
    let fw = framework(&journal, &transfer_cases());

    // When: only roundtrip is requested, twice
    let report = fw
        .run(&RunRequest::new(vec!["roundtrip".to_owned()], 2))
        .await;

    // Then: exactly two roundtrip invocations, nothing else
    assert_eq!(started(&journal), vec!["roundtrip", "roundtrip"]);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].iteration, 1);
    assert_eq!(report.records[1].iteration, 2);
    assert!(report.is_success());
}

#[tokio::test]
async fn empty_request_runs_all_in_registration_order() {
    let journal = Journal::default();
    let fw = framework(&journal, &transfer_cases());

    let report = fw.run(&RunRequest::all()).await;

    assert_eq!(
        started(&journal),
        vec!["transfer_ab", "transfer_bc", "roundtrip"]
    );
    assert_eq!(report.executed(), vec!["transfer_ab", "transfer_bc", "roundtrip"]);
    assert_eq!(report.passed(), 3);
}

#[tokio::test]
async fn request_order_is_preserved() {
    let journal = Journal::default();
    let fw = framework(&journal, &transfer_cases());

    fw.run(&RunRequest::new(
        vec!["roundtrip".to_owned(), "transfer_ab".to_owned()],
        1,
    ))
    .await;

    assert_eq!(started(&journal), vec!["roundtrip", "transfer_ab"]);
}

#[tokio::test]
async fn iterations_do_not_interleave() {
    let journal = Journal::default();
    let fw = framework(&journal, &transfer_cases());

    fw.run(&RunRequest::new(Vec::new(), 3)).await;

    let entries = journal.lock().expect("journal lock").clone();
    assert_eq!(entries.len(), 18);
    // every start is immediately followed by its own end
    for pair in entries.chunks(2) {
        let name = pair[0].strip_prefix("start:").expect("start entry");
        assert_eq!(pair[1], format!("end:{name}"));
    }
    let expected: Vec<&str> = ["transfer_ab", "transfer_bc", "roundtrip"]
        .iter()
        .copied()
        .cycle()
        .take(9)
        .collect();
    assert_eq!(started(&journal), expected);
}

#[tokio::test]
async fn rerun_on_fresh_context_is_deterministic() {
    let first = Journal::default();
    let second = Journal::default();
    let request = RunRequest::new(
        vec![
            "transfer_bc".to_owned(),
            "missing".to_owned(),
            "roundtrip".to_owned(),
        ],
        2,
    );

    let a = framework(&first, &transfer_cases()).run(&request).await;
    let b = framework(&second, &transfer_cases()).run(&request).await;

    assert_eq!(started(&first), started(&second));
    assert_eq!(a.executed(), b.executed());
    assert_ne!(a.run_id, b.run_id);
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn unknown_name_is_not_found_and_loop_continues() {
    let journal = Journal::default();
    let fw = framework(&journal, &transfer_cases());

    let report = fw
        .run(&RunRequest::new(
            vec!["nope".to_owned(), "roundtrip".to_owned()],
            2,
        ))
        .await;

    assert_eq!(started(&journal), vec!["roundtrip", "roundtrip"]);
    assert_eq!(report.records.len(), 4);
    assert_eq!(
        report.records[0].outcome,
        CaseOutcome::Failure(CaseFailure::NotFound)
    );
    assert!(report.records[1].outcome.is_success());
    assert_eq!(report.failed(), 2);
    assert!(!report.is_success());
}

#[tokio::test]
async fn failing_case_does_not_stop_next_case() {
    let journal = Journal::default();
    let fw = framework(
        &journal,
        &[("broken", Behavior::Fail), ("after", Behavior::Pass)],
    );

    let report = fw.run(&RunRequest::all()).await;

    assert_eq!(started(&journal), vec!["broken", "after"]);
    match &report.records[0].outcome {
        CaseOutcome::Failure(CaseFailure::Error(reason)) => {
            assert!(reason.contains("broken failed"), "reason: {reason}");
        }
        other => panic!("expected error outcome, got {other:?}"),
    }
    assert!(report.records[1].outcome.is_success());
}

#[tokio::test]
async fn panicking_case_is_isolated() {
    let journal = Journal::default();
    let fw = framework(
        &journal,
        &[("exploder", Behavior::Panic), ("survivor", Behavior::Pass)],
    );

    let report = fw.run(&RunRequest::new(Vec::new(), 2)).await;

    assert_eq!(
        started(&journal),
        vec!["exploder", "survivor", "exploder", "survivor"]
    );
    for record in report.records.iter().filter(|r| r.case == "exploder") {
        match &record.outcome {
            CaseOutcome::Failure(CaseFailure::Panicked(msg)) => {
                assert!(msg.contains("exploder exploded"), "msg: {msg}");
            }
            other => panic!("expected panic outcome, got {other:?}"),
        }
    }
    assert_eq!(report.passed(), 2);
    // context is still usable after the panic
    assert_eq!(fw.relay().current_height().await.expect("height"), 100);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn shutdown_stops_at_next_case_boundary() {
    let journal = Journal::default();
    let fw = framework(
        &journal,
        &[
            ("first", Behavior::Pass),
            ("stopper", Behavior::Shutdown),
            ("never", Behavior::Pass),
        ],
    );

    let report = fw.run(&RunRequest::new(Vec::new(), 3)).await;

    // the current case finishes, nothing after it starts
    assert_eq!(started(&journal), vec!["first", "stopper"]);
    assert!(report.interrupted);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.failed(), 0);
    assert!(!report.is_success());
}

#[tokio::test]
async fn cancelled_before_run_executes_nothing() {
    let journal = Journal::default();
    let fw = framework(&journal, &transfer_cases());
    fw.shutdown_token().cancel();

    let report = fw.run(&RunRequest::all()).await;

    assert!(started(&journal).is_empty());
    assert!(report.records.is_empty());
    assert!(report.interrupted);
}

#[tokio::test]
async fn max_loop_count_runs_without_preallocating_every_record() {
    // Given: eight cases and the largest loop count the CLI accepts
    let journal = Journal::default();
    let mut cases = vec![("stopper", Behavior::Shutdown)];
    cases.extend(
        ["c1", "c2", "c3", "c4", "c5", "c6", "c7"]
            .into_iter()
            .map(|name| (name, Behavior::Pass)),
    );
    let fw = framework(&journal, &cases);

    // When: the first case requests shutdown
    let report = fw.run(&RunRequest::new(Vec::new(), u32::MAX)).await;

    // Then: the loop starts, runs one case and stops cleanly
    assert_eq!(report.iterations, u32::MAX);
    assert_eq!(started(&journal), vec!["stopper"]);
    assert_eq!(report.records.len(), 1);
    assert!(report.interrupted);
}
