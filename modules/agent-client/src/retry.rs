use std::time::Duration;

use rand::Rng;

pub const MAX_ATTEMPTS: u32 = 6;
const BASE_DELAY_MS: u64 = 500;

/// Computes the delay before the next attempt, given the zero-based
/// attempt index that just failed. Doubles per attempt with uniform
/// jitter in `[delay, 1.2*delay]`, per spec §4.1.
pub fn backoff_delay(attempt: u32) -> Duration {
    let computed = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(20));
    jittered(computed)
}

fn jittered(base_ms: u64) -> Duration {
    let upper = (base_ms as f64 * 1.2) as u64;
    let upper = upper.max(base_ms);
    let ms = if upper == base_ms {
        base_ms
    } else {
        rand::rng().random_range(base_ms..=upper)
    };
    Duration::from_millis(ms)
}

/// Returns `true` for transport-layer failures and HTTP 429/5xx, the
/// statuses spec §4.1 says are retried locally.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Parses a `Retry-After` header value as a whole-second delta, per
/// spec §4.1 ("if the response carries a Retry-After delta, that value
/// replaces the computed delay for the next wait").
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
