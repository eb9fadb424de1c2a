//! Tests for the dump orchestration state machine.

#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use procdump_cli::application::services::dump_orchestrator::{
    DumpOrchestrator, LINUX_UNSUPPORTED, NO_PROCESS_SELECTOR,
};
use procdump_cli::application::services::leases::{LeaseKey, TargetLeases};
use procdump_cli::domain::{DumpOutcome, DumpSettings, FailureKind};
use tokio_util::sync::CancellationToken;

use crate::helpers::{linux_pod, pod, request, windows_pod};
use crate::mocks::{Call, FakeCluster, NoopReporter, RecordingReporter};

async fn run(cluster: &FakeCluster, req: &procdump_cli::domain::DumpRequest) -> DumpOutcome {
    let settings = DumpSettings::default();
    DumpOrchestrator::new(cluster, &NoopReporter, &settings)
        .run(req)
        .await
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_windows_dump_stages_triggers_and_returns_first_log() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads(["", "", "uploaded to share\r\n"]);

    let outcome = run(&cluster, &request("42", "")).await;

    assert_eq!(
        outcome,
        DumpOutcome::Success {
            log_contents: "uploaded to share\r\n".to_string()
        }
    );
    assert_eq!(
        cluster.transfers(),
        vec![(PathBuf::from("/run-dump.ps1"), "run-dump.ps1".to_string())]
    );
    assert_eq!(
        cluster.triggers(),
        vec![vec![
            "powershell.exe".to_string(),
            r"C:\run-dump.ps1 -ProcID 42".to_string()
        ]]
    );
    assert_eq!(cluster.read_count(), 3, "polling stops at first non-empty read");
}

#[tokio::test(start_paused = true)]
async fn test_calls_happen_in_workflow_order() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads(["done"]);

    run(&cluster, &request("", "w3wp")).await;

    let calls = cluster.calls();
    assert!(matches!(calls[0], Call::GetUnit { .. }));
    assert!(matches!(&calls[1], Call::Exec { argv, .. } if argv[1] == "Get-Process"));
    assert!(matches!(calls[2], Call::Copy { .. }));
    assert!(matches!(&calls[3], Call::Exec { argv, .. } if argv[1].ends_with("-ProcName w3wp")));
    assert!(matches!(&calls[4], Call::Exec { argv, .. } if argv[1] == "cat log.txt"));
    assert_eq!(calls.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_process_id_wins_over_name() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads(["ok"]);

    run(&cluster, &request("42", "foo")).await;

    let triggers = cluster.triggers();
    assert_eq!(triggers.len(), 1);
    assert!(triggers[0][1].ends_with("-ProcID 42"), "got {:?}", triggers[0]);
    assert!(!triggers[0][1].contains("foo"));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_container_is_used_for_every_call() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads(["ok"]);
    let mut req = request("7", "");
    req.container = "sidecar".to_string();

    run(&cluster, &req).await;

    for call in cluster.calls() {
        if let Call::Exec { container, .. } = call {
            assert_eq!(container, "sidecar");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_log_contents_are_returned_unmodified() {
    let raw = "  line one\r\n\r\nline two  \r\n";
    let cluster = FakeCluster::with_pod(windows_pod()).reads([raw]);

    let outcome = run(&cluster, &request("1", "")).await;

    assert_eq!(
        outcome,
        DumpOutcome::Success {
            log_contents: raw.to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_only_read_counts_as_empty() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads([" \r\n", "done"]);

    let outcome = run(&cluster, &request("1", "")).await;

    assert_eq!(cluster.read_count(), 2);
    assert!(matches!(outcome, DumpOutcome::Success { log_contents } if log_contents == "done"));
}

// ── Unsupported ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_linux_target_is_unsupported_without_remote_effects() {
    let cluster = FakeCluster::with_pod(linux_pod());

    let outcome = run(&cluster, &request("42", "")).await;

    assert_eq!(
        outcome,
        DumpOutcome::Unsupported {
            reason: LINUX_UNSUPPORTED.to_string()
        }
    );
    assert!(cluster.transfers().is_empty());
    assert!(cluster.triggers().is_empty());
    assert_eq!(cluster.read_count(), 0);
    assert_eq!(cluster.listings(), vec![vec!["sh", "-c", "ps"]]);
}

#[tokio::test]
async fn test_pod_without_os_label_is_treated_as_linux() {
    let cluster = FakeCluster::with_pod(pod(&["app"], None));

    let outcome = run(&cluster, &request("42", "")).await;

    assert!(matches!(outcome, DumpOutcome::Unsupported { .. }));
    assert!(cluster.triggers().is_empty());
}

#[tokio::test]
async fn test_windows_without_selector_is_unsupported_before_staging() {
    let cluster = FakeCluster::with_pod(windows_pod());

    let outcome = run(&cluster, &request("", "")).await;

    assert_eq!(
        outcome,
        DumpOutcome::Unsupported {
            reason: NO_PROCESS_SELECTOR.to_string()
        }
    );
    assert!(cluster.transfers().is_empty());
    assert!(cluster.triggers().is_empty());
}

// ── Timeout ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_never_written_artifact_times_out_after_twenty_spaced_reads() {
    let cluster = FakeCluster::with_pod(windows_pod());

    let outcome = run(&cluster, &request("42", "")).await;

    assert_eq!(outcome, DumpOutcome::Timeout { attempts_made: 20 });
    assert_eq!(cluster.read_count(), 20);
    let gaps = cluster.read_gaps();
    assert_eq!(gaps.len(), 19);
    assert!(gaps.iter().all(|g| *g == Duration::from_secs(2)), "gaps: {gaps:?}");
}

#[tokio::test(start_paused = true)]
async fn test_poll_bound_and_interval_come_from_settings() {
    let cluster = FakeCluster::with_pod(windows_pod());
    let settings = DumpSettings {
        poll_attempts: 3,
        poll_interval: Duration::from_millis(500),
        ..DumpSettings::default()
    };

    let outcome = DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .run(&request("42", ""))
        .await;

    assert_eq!(outcome, DumpOutcome::Timeout { attempts_made: 3 });
    assert_eq!(
        cluster.read_gaps(),
        vec![Duration::from_millis(500), Duration::from_millis(500)]
    );
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_pod_name_fails_before_any_remote_call() {
    let cluster = FakeCluster::with_pod(windows_pod());

    let mut req = request("42", "");
    req.pod = "  ".to_string();

    let outcome = run(&cluster, &req).await;

    assert!(matches!(
        outcome,
        DumpOutcome::Failed {
            cause: FailureKind::InvalidInput(_)
        }
    ));
    assert!(cluster.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_process_id_fails_before_any_remote_call() {
    let cluster = FakeCluster::with_pod(windows_pod());

    let outcome = run(&cluster, &request("42; Remove-Item C:\\", "")).await;

    assert_eq!(outcome.exit_code(), 3);
    assert!(cluster.calls().is_empty());
}

#[tokio::test]
async fn test_missing_pod_is_not_found() {
    let cluster = FakeCluster::missing();

    let outcome = run(&cluster, &request("42", "")).await;

    assert!(matches!(
        outcome,
        DumpOutcome::Failed {
            cause: FailureKind::NotFound(_)
        }
    ));
    assert_eq!(cluster.lookups(), 1);
    assert_eq!(cluster.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_failure_does_not_stop_the_dump() {
    let mut cluster = FakeCluster::with_pod(windows_pod()).reads(["ok"]);
    cluster.fail_listing = true;
    let reporter = RecordingReporter::default();
    let settings = DumpSettings::default();

    let outcome = DumpOrchestrator::new(&cluster, &reporter, &settings)
        .run(&request("42", ""))
        .await;

    assert!(matches!(outcome, DumpOutcome::Success { .. }));
    assert!(
        reporter
            .events()
            .iter()
            .any(|e| e.starts_with("warn: could not list processes"))
    );
}

#[tokio::test]
async fn test_staging_failure_is_transport_and_skips_trigger() {
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.fail_copy = true;

    let outcome = run(&cluster, &request("42", "")).await;

    assert!(matches!(
        &outcome,
        DumpOutcome::Failed { cause: FailureKind::Transport { step, .. } } if step == "staging"
    ));
    assert!(cluster.triggers().is_empty());
    assert_eq!(cluster.read_count(), 0);
}

#[tokio::test]
async fn test_trigger_failure_is_transport_and_skips_polling() {
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.fail_trigger = true;

    let outcome = run(&cluster, &request("42", "")).await;

    assert!(matches!(
        &outcome,
        DumpOutcome::Failed { cause: FailureKind::Transport { step, .. } } if step == "triggering"
    ));
    assert_eq!(cluster.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_lookup_is_classified_as_transport_timeout() {
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.hang_lookup = true;

    let outcome = run(&cluster, &request("42", "")).await;

    match outcome {
        DumpOutcome::Failed {
            cause: FailureKind::Transport { step, message },
        } => {
            assert_eq!(step, "validating");
            assert!(message.contains("timed out after 30s"), "got: {message}");
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hanging_trigger_is_classified_as_transport_timeout() {
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.hang_trigger = true;

    let outcome = run(&cluster, &request("42", "")).await;

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(cluster.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_and_hanging_reads_are_retried_as_empty() {
    let mut cluster = FakeCluster::with_pod(windows_pod()).reads(["done"]);
    cluster.fail_reads = vec![1];
    cluster.hang_reads = vec![2];

    let outcome = run(&cluster, &request("42", "")).await;

    assert_eq!(
        outcome,
        DumpOutcome::Success {
            log_contents: "done".to_string()
        }
    );
    assert_eq!(cluster.read_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reads_that_never_succeed_end_in_timeout_not_transport() {
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.fail_reads = (1..=20).collect();

    let outcome = run(&cluster, &request("42", "")).await;

    assert_eq!(outcome, DumpOutcome::Timeout { attempts_made: 20 });
    assert_eq!(outcome.exit_code(), 6);
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancel_before_staging_has_no_remote_effects() {
    let token = CancellationToken::new();
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.cancel_during_listing = Some(token.clone());
    let settings = DumpSettings::default();

    let outcome = DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .with_cancellation(token)
        .run(&request("42", ""))
        .await;

    assert_eq!(outcome, DumpOutcome::cancelled());
    assert!(cluster.transfers().is_empty());
    assert!(cluster.triggers().is_empty());
}

#[tokio::test]
async fn test_already_cancelled_token_stops_before_lookup() {
    let token = CancellationToken::new();
    token.cancel();
    let cluster = FakeCluster::with_pod(windows_pod());
    let settings = DumpSettings::default();

    let outcome = DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .with_cancellation(token)
        .run(&request("42", ""))
        .await;

    assert_eq!(outcome.exit_code(), 130);
    assert!(cluster.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_polling_stops_reading() {
    let token = CancellationToken::new();
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.cancel_on_read = Some((3, token.clone()));
    let settings = DumpSettings::default();

    let outcome = DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .with_cancellation(token)
        .run(&request("42", ""))
        .await;

    assert_eq!(outcome, DumpOutcome::cancelled());
    assert_eq!(cluster.read_count(), 3);
    assert_eq!(cluster.triggers().len(), 1, "triggered dump is not rolled back");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_hanging_staging_copy() {
    let token = CancellationToken::new();
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.hang_copy = true;
    let settings = DumpSettings::default();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });
    let started = tokio::time::Instant::now();

    let outcome = DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .with_cancellation(token)
        .run(&request("42", ""))
        .await;

    assert_eq!(outcome, DumpOutcome::cancelled());
    assert!(started.elapsed() < settings.transfer_timeout);
    assert_eq!(cluster.transfers().len(), 1);
    assert!(cluster.triggers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_hanging_trigger() {
    let token = CancellationToken::new();
    let mut cluster = FakeCluster::with_pod(windows_pod());
    cluster.hang_trigger = true;
    let settings = DumpSettings::default();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });
    let started = tokio::time::Instant::now();

    let outcome = DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .with_cancellation(token)
        .run(&request("42", ""))
        .await;

    assert_eq!(outcome, DumpOutcome::cancelled());
    assert!(started.elapsed() < settings.exec_timeout);
    assert_eq!(cluster.read_count(), 0);
}

// ── Leases ───────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_lease_is_released_after_run() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads(["ok"]);
    let leases = TargetLeases::new();
    let settings = DumpSettings::default();

    DumpOrchestrator::new(&cluster, &NoopReporter, &settings)
        .with_leases(&leases)
        .run(&request("42", ""))
        .await;

    let key = LeaseKey {
        namespace: "prod".to_string(),
        pod: "web-0".to_string(),
        container: "app".to_string(),
    };
    assert!(!leases.is_held(&key));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_on_same_target_do_not_interleave() {
    let cluster = Arc::new(FakeCluster::with_pod(windows_pod()).reads(["", "first", "second"]));
    let leases = Arc::new(TargetLeases::new());
    let settings = Arc::new(DumpSettings::default());

    let spawn_run = |id: &'static str| {
        let cluster = Arc::clone(&cluster);
        let leases = Arc::clone(&leases);
        let settings = Arc::clone(&settings);
        tokio::spawn(async move {
            DumpOrchestrator::new(cluster.as_ref(), &NoopReporter, settings.as_ref())
                .with_leases(leases.as_ref())
                .run(&request(id, ""))
                .await
        })
    };
    let a = spawn_run("1");
    let b = spawn_run("2");
    let (a, b) = (a.await.expect("join"), b.await.expect("join"));

    assert!(matches!(a, DumpOutcome::Success { .. }));
    assert!(matches!(b, DumpOutcome::Success { .. }));

    // Between a Copy and the next Copy the first run must finish its reads.
    let calls = cluster.calls();
    let copies: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter_map(|(i, c)| matches!(c, Call::Copy { .. }).then_some(i))
        .collect();
    assert_eq!(copies.len(), 2);
    let between = &calls[copies[0]..copies[1]];
    let successful_reads = between
        .iter()
        .filter(|c| matches!(c, Call::Exec { argv, .. } if argv[1] == "cat log.txt"))
        .count();
    assert_eq!(successful_reads, 2, "first run polled to completion before second staged");
}

// ── Reporting ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_reporter_sees_process_listing_and_success() {
    let cluster = FakeCluster::with_pod(windows_pod()).reads(["ok"]);
    let reporter = RecordingReporter::default();
    let settings = DumpSettings::default();

    DumpOrchestrator::new(&cluster, &reporter, &settings)
        .run(&request("42", ""))
        .await;

    let events = reporter.events();
    assert!(events.contains(&"diagnostic: process list".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("success: dump uploaded"));
}
