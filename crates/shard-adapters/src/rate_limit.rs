use std::time::{Duration, Instant};

/// Token bucket rate limiter. One instance per (tenant, provider) pair, held
/// in a `DashMap` by the runtime so tenants never steal each other's budget
/// on a shared provider.
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_second: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(refill_per_second: u32) -> Self {
        let capacity = refill_per_second.max(1) as f64;
        Self {
            capacity,
            tokens: capacity,
            refill_per_second: refill_per_second.max(1) as f64,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }

    /// Attempts to take one token. On failure, returns how long until one is
    /// available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(deficit / self.refill_per_second))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depletes_then_blocks() {
        let mut bucket = TokenBucket::new(2);
        assert!(bucket.try_acquire().is_ok());
        assert!(bucket.try_acquire().is_ok());
        assert!(bucket.try_acquire().is_err());
    }
}
