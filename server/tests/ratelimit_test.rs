//! Integration tests for the abuse throttle.
//!
//! These tests require a running Redis instance at `redis://localhost:6379`.
//! Run with: `cargo test ratelimit --ignored -- --nocapture`

use warden_server::cache;
use warden_server::ratelimit::{Outcome, RateLimitConfig, RateLimiter};

/// Helper to create a test Redis client connected to localhost.
async fn create_test_redis() -> fred::clients::Client {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    cache::create_redis_client(&redis_url)
        .await
        .expect("Failed to connect to Redis")
}

/// Helper to create a limiter with test-specific thresholds.
///
/// Uses a unique key prefix to avoid conflicts between test runs.
fn create_test_limiter(
    redis: fred::clients::Client,
    max_attempts: u32,
    window_secs: u64,
    block_secs: u64,
) -> RateLimiter {
    let config = RateLimitConfig {
        key_prefix: format!("test:rl:{}", uuid::Uuid::new_v4()),
        max_attempts,
        window_secs,
        block_secs,
        ..RateLimitConfig::default()
    };
    RateLimiter::new(redis, config)
}

fn retry_after(outcome: &Outcome) -> u64 {
    match outcome {
        Outcome::Throttled { retry_after, .. } => *retry_after,
        Outcome::Proceed => panic!("expected a throttled outcome"),
    }
}

/// Test the documented scenario: threshold 10, window 300s, block 600s.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_tenth_attempt_proceeds_eleventh_blocks() {
    let redis = create_test_redis().await;
    let limiter = create_test_limiter(redis, 10, 300, 600);

    // Requests 1-10 proceed.
    for i in 0..10 {
        let outcome = limiter.check("203.0.113.5", "/auth/login").await;
        assert_eq!(outcome, Outcome::Proceed, "request {} should proceed", i + 1);
    }

    // Request 11 crosses the threshold and starts the block.
    match limiter.check("203.0.113.5", "/auth/login").await {
        Outcome::Throttled {
            retry_after,
            message,
        } => {
            assert_eq!(retry_after, 600, "block duration should be returned whole");
            assert!(
                message.contains("10 minute"),
                "message should name the block in minutes, was: {message}"
            );
        }
        Outcome::Proceed => panic!("request 11 should be throttled"),
    }

    // Request 12 is governed by the stored unblock timestamp.
    let followup = limiter.check("203.0.113.5", "/auth/login").await;
    let remaining = retry_after(&followup);
    assert!(
        (598..=600).contains(&remaining),
        "remaining should track the unblock timestamp, was {remaining}"
    );

    println!("Threshold scenario passed: block entered with retry_after = 600s");
}

/// Test that an active block covers every path for the client.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_block_applies_across_paths() {
    let redis = create_test_redis().await;
    let limiter = create_test_limiter(redis, 2, 300, 600);

    assert_eq!(limiter.check("198.51.100.9", "/a").await, Outcome::Proceed);
    assert_eq!(limiter.check("198.51.100.9", "/a").await, Outcome::Proceed);
    assert!(matches!(
        limiter.check("198.51.100.9", "/a").await,
        Outcome::Throttled { .. }
    ));

    // A different path from the same client is also throttled.
    let other_path = limiter.check("198.51.100.9", "/b").await;
    let first_remaining = retry_after(&other_path);
    assert!(first_remaining <= 600);

    // Remaining time decreases monotonically toward the unblock timestamp.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    let later = limiter.check("198.51.100.9", "/b").await;
    assert!(retry_after(&later) < first_remaining);

    println!("Cross-path block test passed");
}

/// Test that attempt counters are independent per path.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_attempt_counters_are_per_path() {
    let redis = create_test_redis().await;
    let limiter = create_test_limiter(redis, 2, 300, 600);

    assert_eq!(limiter.check("192.0.2.1", "/a").await, Outcome::Proceed);
    assert_eq!(limiter.check("192.0.2.1", "/a").await, Outcome::Proceed);

    // Hammering /a does not consume /b's budget.
    assert_eq!(limiter.check("192.0.2.1", "/b").await, Outcome::Proceed);
    assert_eq!(limiter.check("192.0.2.1", "/b").await, Outcome::Proceed);

    assert!(matches!(
        limiter.check("192.0.2.1", "/a").await,
        Outcome::Throttled { .. }
    ));
}

/// Test that the attempt counter expires with its window.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_counter_expires_with_window() {
    let redis = create_test_redis().await;
    let limiter = create_test_limiter(redis, 2, 2, 600);

    assert_eq!(limiter.check("192.0.2.7", "/a").await, Outcome::Proceed);
    assert_eq!(limiter.check("192.0.2.7", "/a").await, Outcome::Proceed);

    // Once the window lapses the budget is whole again.
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert_eq!(limiter.check("192.0.2.7", "/a").await, Outcome::Proceed);
}

/// Test that block expiry is implicit and restarts the window from scratch.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_block_expiry_restarts_the_window() {
    let redis = create_test_redis().await;
    let limiter = create_test_limiter(redis, 2, 300, 2);

    assert_eq!(limiter.check("192.0.2.33", "/a").await, Outcome::Proceed);
    assert_eq!(limiter.check("192.0.2.33", "/a").await, Outcome::Proceed);
    assert!(matches!(
        limiter.check("192.0.2.33", "/a").await,
        Outcome::Throttled { .. }
    ));

    // No explicit unblock path exists: expiry of the block record is the
    // transition. The counter was cleared on block entry, so the client
    // starts a full window at one.
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert_eq!(limiter.check("192.0.2.33", "/a").await, Outcome::Proceed);
    assert_eq!(limiter.check("192.0.2.33", "/a").await, Outcome::Proceed);
    assert!(matches!(
        limiter.check("192.0.2.33", "/a").await,
        Outcome::Throttled { .. }
    ));

    println!("Block expiry test passed: window restarted after TTL");
}

/// Test the operator escape hatch.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_clear_unblocks_immediately() {
    let redis = create_test_redis().await;
    let limiter = create_test_limiter(redis, 1, 300, 600);

    assert_eq!(
        limiter.check("203.0.113.77", "/auth/login").await,
        Outcome::Proceed
    );
    assert!(matches!(
        limiter.check("203.0.113.77", "/auth/login").await,
        Outcome::Throttled { .. }
    ));

    limiter
        .clear("203.0.113.77", Some("/auth/login"))
        .await
        .expect("clear failed");

    // Block and counter are gone; the next request counts from one.
    assert_eq!(
        limiter.check("203.0.113.77", "/auth/login").await,
        Outcome::Proceed
    );

    // Clearing again is a no-op.
    limiter
        .clear("203.0.113.77", Some("/auth/login"))
        .await
        .expect("repeat clear failed");
}

/// Test that allowlisted clients bypass the throttle entirely.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_allowlisted_client_bypasses_throttle() {
    let redis = create_test_redis().await;
    let mut config = RateLimitConfig {
        key_prefix: format!("test:rl:{}", uuid::Uuid::new_v4()),
        max_attempts: 1,
        ..RateLimitConfig::default()
    };
    config.allowlist.insert("127.0.0.1".to_string());
    let limiter = RateLimiter::new(redis, config);

    for _ in 0..5 {
        assert_eq!(limiter.check("127.0.0.1", "/a").await, Outcome::Proceed);
    }
}

/// Test that a disabled limiter passes everything through.
#[tokio::test]
#[ignore] // Requires Redis
async fn test_disabled_limiter_passes_through() {
    let redis = create_test_redis().await;
    let config = RateLimitConfig {
        key_prefix: format!("test:rl:{}", uuid::Uuid::new_v4()),
        enabled: false,
        max_attempts: 1,
        ..RateLimitConfig::default()
    };
    let limiter = RateLimiter::new(redis, config);

    for _ in 0..5 {
        assert_eq!(limiter.check("192.0.2.50", "/a").await, Outcome::Proceed);
    }
}
