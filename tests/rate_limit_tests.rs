use std::fs;
use std::time::{Duration, Instant};

use gistify::RateLimiter;
use gistify::error::Error;
use gistify::rate_limit::{RateDecision, prune};
use spectral::assert_that;
use spectral::vec::VecAssertions;

const NOW: f64 = 1_700_000_000.0;
const WINDOW: f64 = 3600.0;

fn limiter_in(dir: &tempfile::TempDir) -> RateLimiter {
    RateLimiter::new(dir.path().join("history.json"))
}

macro_rules! assert_decisions {
    (
        $(
            $test_name:ident : ages => $ages:expr, decision => $decision:expr
        ),+ $(,)?
    ) => {
        $(
            #[test]
            fn $test_name() {
                let dir = tempfile::tempdir().expect("Expected a temp dir.");
                let history: Vec<f64> = $ages.iter().map(|age: &f64| NOW - age).collect();

                let decision = limiter_in(&dir).decide(&history, NOW);

                assert_that(&decision).is_equal_to($decision);
            }
        )+
    }
}

assert_decisions![
    empty_history_proceeds:
        ages => [0.0_f64; 0],
        decision => RateDecision::Proceed,
    recent_request_waits_for_remaining_spacing:
        ages => [2.0],
        decision => RateDecision::Wait(Duration::from_secs(3)),
    request_at_spacing_threshold_proceeds:
        ages => [5.0],
        decision => RateDecision::Proceed,
    old_request_proceeds:
        ages => [60.0],
        decision => RateDecision::Proceed,
    only_latest_request_counts_for_spacing:
        ages => [1000.0, 4.0, 300.0],
        decision => RateDecision::Wait(Duration::from_secs(1)),
    below_quota_never_exceeds:
        ages => [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        decision => RateDecision::Wait(Duration::from_secs(5)),
    full_quota_exceeds_before_spacing:
        ages => [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 600.0],
        decision => RateDecision::Exceeded { retry_after: Duration::from_secs(3000) },
    expired_requests_do_not_count:
        ages => [4000.0, 4001.0, 4002.0, 4003.0, 4004.0, 4005.0, 4006.0, 4007.0, 4008.0, 4009.0],
        decision => RateDecision::Proceed,
];

#[test]
fn prune_removes_only_entries_older_than_window() {
    let history = vec![
        NOW - 4000.0,
        NOW - WINDOW - 1.0,
        NOW - WINDOW,
        NOW - 3599.0,
        NOW - 10.0,
        NOW,
    ];

    let pruned = prune(&history, NOW, WINDOW);

    assert_that(&pruned).is_equal_to(vec![NOW - WINDOW, NOW - 3599.0, NOW - 10.0, NOW]);
}

#[test]
fn prune_keeps_insertion_order() {
    let history = vec![NOW - 5.0, NOW - 50.0, NOW - 1.0];

    assert_that(&prune(&history, NOW, WINDOW)).is_equal_to(history.clone());
}

#[test]
fn missing_history_reads_as_empty() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");

    assert_that(&limiter_in(&dir).load_history()).is_empty();
}

#[test]
fn corrupt_history_reads_as_empty() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let limiter = limiter_in(&dir);
    fs::write(limiter.history_path(), "{not json").expect("Expected the history to be written.");

    assert_that(&limiter.load_history()).is_empty();
}

#[test]
fn record_appends_and_prunes() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let limiter = limiter_in(&dir);
    fs::write(
        limiter.history_path(),
        serde_json::to_string(&vec![NOW - 5000.0, NOW - 100.0]).expect("Expected JSON."),
    )
    .expect("Expected the history to be written.");

    limiter
        .record_at(NOW)
        .expect("Expected the request to be recorded.");

    let stored: Vec<f64> = serde_json::from_str(
        &fs::read_to_string(limiter.history_path()).expect("Expected the history to be readable."),
    )
    .expect("Expected the history to be a JSON array.");
    assert_that(&stored).is_equal_to(vec![NOW - 100.0, NOW]);
}

#[test]
fn record_creates_missing_directories() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let limiter = RateLimiter::new(dir.path().join("nested").join("history.json"));

    limiter.record().expect("Expected the request to be recorded.");

    assert_that(&limiter.load_history()).has_length(1);
}

#[test]
fn zero_quota_is_raised_to_one() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");

    assert_that(&limiter_in(&dir).with_max_requests(0).max_requests()).is_equal_to(1);
}

#[tokio::test]
async fn check_and_wait_blocks_for_remaining_spacing() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let limiter = limiter_in(&dir).with_min_interval(Duration::from_millis(400));
    limiter.record().expect("Expected the request to be recorded.");

    let started = Instant::now();
    limiter
        .check_and_wait()
        .await
        .expect("Expected the spacing wait to succeed.");

    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn check_and_wait_does_not_block_after_spacing() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let limiter = limiter_in(&dir);
    limiter
        .record_at(gistify::rate_limit::unix_now() - 30.0)
        .expect("Expected the request to be recorded.");

    let started = Instant::now();
    limiter
        .check_and_wait()
        .await
        .expect("Expected the check to pass.");

    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn check_and_wait_reports_retry_estimate() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let limiter = limiter_in(&dir).with_max_requests(1);
    limiter.record().expect("Expected the request to be recorded.");

    let error = limiter
        .check_and_wait()
        .await
        .expect_err("Expected the quota to be exhausted.");

    assert!(matches!(error, Error::RateLimitExceeded { quota: 1, .. }));
    assert_that(&error.to_string()).is_equal_to(
        "Rate limit reached (1 requests/hour). Try again in 60 minute(s).".to_owned(),
    );
}
