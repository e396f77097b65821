//! Token bucket with continuous (greedy) refill.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::admission::class::BucketSpec;
use crate::admission::clock::Clock;

/// Outcome of a consumption attempt, observed under the same lock as the attempt itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumptionProbe {
    /// Whether the tokens were taken.
    pub consumed: bool,
    /// Tokens left in the bucket after the attempt.
    pub remaining: u64,
    /// Nanoseconds until the requested amount could be taken. Zero when `consumed`,
    /// `u64::MAX` when the request can never fit in the bucket.
    pub nanos_to_wait: u64,
}

#[derive(Debug)]
struct BucketState {
    available: u64,
    last_refill: u64,
    /// Accrued fraction of a token, in units of `token * nanosecond`. Always `< period_nanos`.
    carry: u128,
}

/// A single token bucket.
///
/// Tokens accrue at `refill_tokens / refill_period` continuously, up to `capacity`. Refill and
/// consumption happen under one mutex so concurrent callers never double-spend.
#[derive(Debug)]
pub struct Bucket {
    spec: BucketSpec,
    period_nanos: u128,
    clock: Arc<dyn Clock>,
    state: Mutex<BucketState>,
}

impl Bucket {
    /// Create a full bucket.
    pub fn new(spec: BucketSpec, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_nanos();
        Self {
            spec,
            period_nanos: spec.refill_period().as_nanos().max(1),
            clock,
            state: Mutex::new(BucketState {
                available: spec.capacity(),
                last_refill: now,
                carry: 0,
            }),
        }
    }

    pub fn spec(&self) -> BucketSpec {
        self.spec
    }

    /// Try to take `tokens` tokens. Returns `true` when they were taken.
    pub fn try_consume(&self, tokens: u64) -> bool {
        self.try_consume_and_report(tokens).consumed
    }

    /// Try to take `tokens` tokens and report what is left.
    pub fn try_consume_and_report(&self, tokens: u64) -> ConsumptionProbe {
        let mut state = self.lock();
        let now = self.clock.now_nanos();
        self.refill(&mut state, now);

        if tokens <= state.available {
            state.available = state.available.saturating_sub(tokens);
            return ConsumptionProbe {
                consumed: true,
                remaining: state.available,
                nanos_to_wait: 0,
            };
        }

        ConsumptionProbe {
            consumed: false,
            remaining: state.available,
            nanos_to_wait: self.nanos_to_wait(&state, tokens),
        }
    }

    /// Tokens currently available, after accounting for refill up to now.
    pub fn available_tokens(&self) -> u64 {
        let mut state = self.lock();
        let now = self.clock.now_nanos();
        self.refill(&mut state, now);
        state.available
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Token bucket lock poisoned, recovering state");
                poisoned.into_inner()
            }
        }
    }

    fn refill(&self, state: &mut BucketState, now: u64) {
        if now <= state.last_refill {
            return;
        }
        let elapsed = now.saturating_sub(state.last_refill);
        state.last_refill = now;

        let capacity = self.spec.capacity();
        if state.available >= capacity {
            state.carry = 0;
            return;
        }

        let accrued = u128::from(elapsed)
            .saturating_mul(u128::from(self.spec.refill_tokens()))
            .saturating_add(state.carry);
        let whole = accrued / self.period_nanos;
        let missing = capacity.saturating_sub(state.available);

        if whole >= u128::from(missing) {
            state.available = capacity;
            state.carry = 0;
        } else {
            // whole < missing <= u64::MAX
            state.available = state.available.saturating_add(whole as u64);
            state.carry = accrued % self.period_nanos;
        }
    }

    fn nanos_to_wait(&self, state: &BucketState, tokens: u64) -> u64 {
        if tokens > self.spec.capacity() {
            return u64::MAX;
        }
        let deficit = u128::from(tokens.saturating_sub(state.available));
        let needed = deficit
            .saturating_mul(self.period_nanos)
            .saturating_sub(state.carry);
        let refill = u128::from(self.spec.refill_tokens());
        let wait = needed.div_ceil(refill);
        u64::try_from(wait).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::clock::ManualClock;
    use std::time::Duration;

    fn bucket(capacity: u64, refill: u64) -> (Bucket, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let spec = match BucketSpec::new(capacity, refill, Duration::from_secs(60)) {
            Ok(spec) => spec,
            Err(e) => panic!("valid spec rejected: {e}"),
        };
        (Bucket::new(spec, clock.clone()), clock)
    }

    #[test]
    fn fractional_accrual_is_carried_not_lost() {
        let (bucket, clock) = bucket(5, 5);
        for _ in 0..5 {
            assert!(bucket.try_consume(1));
        }
        // 5 tokens per minute = one token every 12s, observed in 4s steps.
        for _ in 0..2 {
            clock.advance(Duration::from_secs(4));
            assert_eq!(bucket.available_tokens(), 0);
            assert!(!bucket.try_consume(1));
        }
        clock.advance(Duration::from_secs(4));
        assert!(bucket.try_consume(1));
        assert_eq!(bucket.available_tokens(), 0);
    }

    #[test]
    fn wait_time_accounts_for_partial_tokens() {
        let (bucket, clock) = bucket(5, 5);
        assert!(bucket.try_consume(5));
        clock.advance(Duration::from_secs(3));

        let probe = bucket.try_consume_and_report(1);
        assert!(!probe.consumed);
        assert_eq!(probe.remaining, 0);
        assert_eq!(probe.nanos_to_wait, Duration::from_secs(9).as_nanos() as u64);
    }

    #[test]
    fn oversized_requests_never_fit() {
        let (bucket, _clock) = bucket(3, 3);
        let probe = bucket.try_consume_and_report(4);
        assert!(!probe.consumed);
        assert_eq!(probe.remaining, 3);
        assert_eq!(probe.nanos_to_wait, u64::MAX);
    }
}
