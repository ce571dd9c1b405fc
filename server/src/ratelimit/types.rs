//! Rate limiting types and user-facing messages.

/// Result of a throttle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Request may proceed; the attempt was counted.
    Proceed,
    /// Request is rejected with retry guidance.
    Throttled {
        /// Whole seconds until the client may retry.
        retry_after: u64,
        /// User-facing message naming the wait in minutes.
        message: String,
    },
}

/// Normalized client identifier stored in request extensions.
#[derive(Debug, Clone)]
pub struct ClientId(pub String);

/// Whole minutes left, rounded up (601s reads as 11 minutes, never 10.02).
pub fn minutes_remaining(secs: u64) -> u64 {
    secs.div_ceil(60)
}

fn minutes_word(minutes: u64) -> &'static str {
    if minutes == 1 {
        "minute"
    } else {
        "minutes"
    }
}

/// Message for the request that triggered the block.
pub fn block_started_message(block_secs: u64) -> String {
    let minutes = minutes_remaining(block_secs);
    format!(
        "Too many requests. Access blocked for {minutes} {}.",
        minutes_word(minutes)
    )
}

/// Message for requests arriving while a block is active.
pub fn still_blocked_message(remaining_secs: u64) -> String {
    let minutes = minutes_remaining(remaining_secs);
    format!(
        "Too many requests. Try again in {minutes} {}.",
        minutes_word(minutes)
    )
}
