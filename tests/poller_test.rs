//! Bounded poller behaviour
//!
//! The poller is the one primitive every eventual-consistency assertion
//! goes through, so its three exits get covered directly: first positive
//! read wins, deadline expiry surfaces as a timeout, probe errors
//! propagate immediately.

use claimant_harness::harness::error::HarnessError;
use claimant_harness::harness::poll::{self, PollSettings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fast_settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(5),
        deadline: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn test_returns_first_positive_read() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let probe_attempts = attempts.clone();

    let value = poll::await_value("delayed state", fast_settings(), move || {
        let attempts = probe_attempts.clone();
        async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n >= 3).then_some(n))
        }
    })
    .await
    .unwrap();

    assert_eq!(value, 3, "first positive read is returned as-is");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_deadline_expiry_is_a_timeout_error() {
    let settings = PollSettings {
        interval: Duration::from_millis(5),
        deadline: Duration::from_millis(30),
    };

    let result: Result<i64, _> =
        poll::await_value("state that never appears", settings, || async { Ok(None) }).await;

    match result {
        Err(HarnessError::TimeoutError {
            operation,
            timeout_ms,
            ..
        }) => {
            assert_eq!(operation, "state that never appears");
            assert_eq!(timeout_ms, 30);
        }
        other => panic!("expected TimeoutError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_probe_errors_propagate_immediately() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let probe_attempts = attempts.clone();

    let result: Result<i64, _> =
        poll::await_value("broken probe", fast_settings(), move || {
            let attempts = probe_attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(HarnessError::DatabaseError {
                    message: "connection refused".to_string(),
                    source: None,
                })
            }
        })
        .await;

    assert!(matches!(result, Err(HarnessError::DatabaseError { .. })));
    assert_eq!(
        attempts.load(Ordering::SeqCst),
        1,
        "probe errors must not be retried"
    );
}

#[test]
fn test_expect_eq_passes_on_match_and_fails_on_mismatch() {
    assert!(poll::expect_eq("committed offset", &200i64, &200i64).is_ok());

    match poll::expect_eq("committed offset", &200i64, &150i64) {
        Err(HarnessError::AssertionFailed {
            assertion_type,
            expected,
            actual,
            ..
        }) => {
            assert_eq!(assertion_type, "committed offset");
            assert_eq!(expected, "200");
            assert_eq!(actual, "150");
        }
        other => panic!("expected AssertionFailed, got {:?}", other),
    }
}
