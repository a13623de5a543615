use std::time::Duration;

use rand::Rng;

const BASE: Duration = Duration::from_secs(5);
const FACTOR: u32 = 2;
const CAP: Duration = Duration::from_secs(5 * 60);
pub const MAX_ATTEMPTS: u32 = 10;

/// Exponential backoff with full jitter: `min(cap, base * factor^attempt)`,
/// then a uniform random draw in `[0, computed)`.
pub fn next_delay(attempt: u32) -> Duration {
    let exp = FACTOR.saturating_pow(attempt.min(20));
    let raw = BASE.saturating_mul(exp).min(CAP);
    let jittered_ms = rand::thread_rng().gen_range(0..=raw.as_millis().max(1) as u64);
    Duration::from_millis(jittered_ms)
}

pub fn exhausted(attempt: u32) -> bool {
    attempt >= MAX_ATTEMPTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_exceeds_cap() {
        for attempt in 0..15 {
            assert!(next_delay(attempt) <= CAP);
        }
    }

    #[test]
    fn exhausted_after_ten_attempts() {
        assert!(!exhausted(9));
        assert!(exhausted(10));
    }
}
