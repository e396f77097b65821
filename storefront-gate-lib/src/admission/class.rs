use std::fmt;
use std::time::Duration;

use crate::error::{GateError, Result};

/// Refill period shared by every traffic class.
pub const REFILL_PERIOD: Duration = Duration::from_secs(60);

/// Capacity and greedy refill rate of a token bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSpec {
    capacity: u64,
    refill_tokens: u64,
    refill_period: Duration,
}

impl BucketSpec {
    /// Build a spec, rejecting zero capacity, zero refill or an empty period.
    pub fn new(capacity: u64, refill_tokens: u64, refill_period: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(GateError::Config("bucket capacity must be at least 1".into()));
        }
        if refill_tokens == 0 {
            return Err(GateError::Config("bucket refill must be at least 1 token".into()));
        }
        if refill_period.is_zero() {
            return Err(GateError::Config("bucket refill period must be non-zero".into()));
        }
        Ok(Self { capacity, refill_tokens, refill_period })
    }

    /// `n` tokens of capacity, refilled greedily at `n` tokens per minute.
    const fn per_minute(n: u64) -> Self {
        Self { capacity: n, refill_tokens: n, refill_period: REFILL_PERIOD }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn refill_tokens(&self) -> u64 {
        self.refill_tokens
    }

    pub fn refill_period(&self) -> Duration {
        self.refill_period
    }
}

/// Named category of requests sharing one rate-limit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficClass {
    Login,
    Register,
    Payment,
    Admin,
    Default,
    ProductGeneral,
    ProductSearch,
    ProductFilter,
    ProductCacheRefresh,
}

impl TrafficClass {
    pub const COUNT: usize = 9;

    pub const ALL: [TrafficClass; Self::COUNT] = [
        TrafficClass::Login,
        TrafficClass::Register,
        TrafficClass::Payment,
        TrafficClass::Admin,
        TrafficClass::Default,
        TrafficClass::ProductGeneral,
        TrafficClass::ProductSearch,
        TrafficClass::ProductFilter,
        TrafficClass::ProductCacheRefresh,
    ];

    /// Fixed limits of this class. Not configurable at runtime.
    pub const fn spec(self) -> BucketSpec {
        match self {
            TrafficClass::Login => BucketSpec::per_minute(5),
            TrafficClass::Register => BucketSpec::per_minute(3),
            TrafficClass::Payment => BucketSpec::per_minute(20),
            TrafficClass::Admin => BucketSpec::per_minute(200),
            TrafficClass::Default => BucketSpec::per_minute(100),
            TrafficClass::ProductGeneral => BucketSpec::per_minute(60),
            TrafficClass::ProductSearch => BucketSpec::per_minute(20),
            TrafficClass::ProductFilter => BucketSpec::per_minute(30),
            TrafficClass::ProductCacheRefresh => BucketSpec::per_minute(2),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TrafficClass::Login => "login",
            TrafficClass::Register => "register",
            TrafficClass::Payment => "payment",
            TrafficClass::Admin => "admin",
            TrafficClass::Default => "default",
            TrafficClass::ProductGeneral => "product-general",
            TrafficClass::ProductSearch => "product-search",
            TrafficClass::ProductFilter => "product-filter",
            TrafficClass::ProductCacheRefresh => "product-cache-refresh",
        }
    }

    /// Position of the class in [`TrafficClass::ALL`].
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
