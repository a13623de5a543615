use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: usize = 20;
const OPEN_DURATION: Duration = Duration::from_secs(60);
const FAILURE_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Per (tenant, provider) circuit breaker over a rolling sample window. Opens
/// once at least `WINDOW` samples are in and >=50% failed; after `OPEN_DURATION`
/// it half-opens to let exactly one probe through.
pub struct CircuitBreaker {
    samples: VecDeque<bool>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW),
            opened_at: None,
            probe_in_flight: false,
        }
    }

    pub fn state(&self) -> CircuitState {
        match self.opened_at {
            None => CircuitState::Closed,
            Some(opened) => {
                if opened.elapsed() >= OPEN_DURATION {
                    CircuitState::HalfOpen
                } else {
                    CircuitState::Open
                }
            }
        }
    }

    /// Call before issuing a request. Returns `false` if the call must be
    /// rejected (circuit open, or half-open with a probe already in flight).
    pub fn allow_request(&mut self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if self.probe_in_flight {
                    false
                } else {
                    self.probe_in_flight = true;
                    true
                }
            }
        }
    }

    pub fn record(&mut self, success: bool) {
        if self.state() == CircuitState::HalfOpen {
            self.probe_in_flight = false;
            if success {
                self.opened_at = None;
                self.samples.clear();
            } else {
                self.opened_at = Some(Instant::now());
            }
            return;
        }

        self.samples.push_back(success);
        if self.samples.len() > WINDOW {
            self.samples.pop_front();
        }
        if self.samples.len() == WINDOW {
            let failures = self.samples.iter().filter(|s| !**s).count();
            if failures as f64 / WINDOW as f64 >= FAILURE_RATIO {
                self.opened_at = Some(Instant::now());
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_half_failures_in_window() {
        let mut cb = CircuitBreaker::new();
        for _ in 0..10 {
            cb.record(true);
        }
        for _ in 0..10 {
            cb.record(false);
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }
}
