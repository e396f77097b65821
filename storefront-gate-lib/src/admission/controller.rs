use http::Method;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::admission::class::TrafficClass;
use crate::admission::classifier::{Classification, TrafficClassifier};
use crate::admission::clock::{Clock, MonotonicClock};
use crate::admission::pool::BucketPool;
use crate::admission::principal::{AuthContext, PrincipalKeyResolver};
use crate::config::RouteRules;
use crate::telemetry::Metrics;

/// What the admission layer needs to know about an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub path: String,
    pub method: Method,
    pub auth: Option<AuthContext>,
    pub client_addr: Option<IpAddr>,
}

impl AdmissionRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { path: path.into(), method, auth: None, client_addr: None }
    }

    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_client_addr(mut self, addr: IpAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Forward without token accounting.
    Bypassed,
    /// Forward and report the tokens left for this key and class.
    Allowed {
        class: TrafficClass,
        key: String,
        remaining: u64,
    },
    /// Answer with a too-many-requests rejection.
    Rejected {
        class: TrafficClass,
        key: String,
        /// Time until one token is available again
        retry_after: Duration,
    },
}

impl AdmissionDecision {
    /// Returns true if the request may reach the upstream.
    pub fn is_forwarded(&self) -> bool {
        !self.is_rejected()
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AdmissionDecision::Rejected { .. })
    }

    pub fn is_bypassed(&self) -> bool {
        matches!(self, AdmissionDecision::Bypassed)
    }

    /// Traffic class charged, if any.
    pub fn class(&self) -> Option<TrafficClass> {
        match self {
            AdmissionDecision::Bypassed => None,
            AdmissionDecision::Allowed { class, .. }
            | AdmissionDecision::Rejected { class, .. } => Some(*class),
        }
    }

    /// Tokens left after an allowed request.
    pub fn remaining(&self) -> Option<u64> {
        match self {
            AdmissionDecision::Allowed { remaining, .. } => Some(*remaining),
            AdmissionDecision::Rejected { .. } => Some(0),
            AdmissionDecision::Bypassed => None,
        }
    }
}

/// Per-identity, per-class request gate.
///
/// Owns one [`BucketPool`] per [`TrafficClass`]. Construct one per process and share it behind
/// an `Arc`; separate instances never share state.
pub struct AdmissionController {
    classifier: TrafficClassifier,
    resolver: PrincipalKeyResolver,
    pools: [BucketPool; TrafficClass::COUNT],
    metrics: Option<Arc<Metrics>>,
}

impl AdmissionController {
    pub fn new(rules: RouteRules) -> Self {
        Self::with_clock(rules, Arc::new(MonotonicClock::default()))
    }

    pub fn with_clock(rules: RouteRules, clock: Arc<dyn Clock>) -> Self {
        let pools =
            TrafficClass::ALL.map(|class| BucketPool::new(class.spec(), Arc::clone(&clock)));
        Self {
            classifier: TrafficClassifier::new(rules),
            resolver: PrincipalKeyResolver::new(),
            pools,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn classifier(&self) -> &TrafficClassifier {
        &self.classifier
    }

    pub fn pool(&self, class: TrafficClass) -> &BucketPool {
        &self.pools[class.index()]
    }

    /// Decide whether `request` proceeds, charging one token when it is rate limited.
    pub fn check(&self, request: &AdmissionRequest) -> AdmissionDecision {
        let class = match self.classifier.classify(request) {
            Classification::Bypass => {
                debug!(path = %request.path, "Admission control bypassed");
                self.record(|m| m.record_admission_bypassed());
                return AdmissionDecision::Bypassed;
            }
            Classification::Limited(class) => class,
        };

        let key = match self.resolver.resolve(request.auth.as_ref(), request.client_addr) {
            Ok(key) => key,
            Err(err) => {
                // Never fail a request because of our own bookkeeping.
                warn!(
                    %err,
                    path = %request.path,
                    %class,
                    "Rate limit key unavailable, admitting request"
                );
                self.record(|m| m.record_key_fallback());
                return AdmissionDecision::Bypassed;
            }
        };

        debug!(%class, key = %key, "Applying rate limit");
        let bucket = self.pool(class).get_or_create(&key);
        let probe = bucket.try_consume_and_report(1);

        if probe.consumed {
            self.record(|m| m.record_admission_allowed(class));
            AdmissionDecision::Allowed { class, key, remaining: probe.remaining }
        } else {
            warn!(key = %key, %class, path = %request.path, "Rate limit exceeded");
            self.record(|m| m.record_admission_rejected(class));
            AdmissionDecision::Rejected {
                class,
                key,
                retry_after: Duration::from_nanos(probe.nanos_to_wait),
            }
        }
    }

    /// Tokens available to `key` in `class`, if that bucket exists.
    pub fn available_tokens(&self, class: TrafficClass, key: &str) -> Option<u64> {
        self.pool(class).get(key).map(|bucket| bucket.available_tokens())
    }

    /// Number of live buckets in `class`.
    pub fn bucket_count(&self, class: TrafficClass) -> usize {
        self.pool(class).len()
    }

    /// Remove every bucket owned by `key`, across all classes. Returns how many were removed.
    pub fn clear_buckets_for_key(&self, key: &str) -> usize {
        let cleared = self.pools.iter().filter(|pool| pool.clear(key)).count();
        debug!(key = %key, cleared, "Cleared rate limit buckets for key");
        self.record(|m| m.record_buckets_cleared(cleared));
        cleared
    }

    /// Remove every bucket. Returns how many were removed.
    pub fn clear_all_buckets(&self) -> usize {
        let cleared: usize = self.pools.iter().map(BucketPool::clear_all).sum();
        debug!(cleared, "Cleared all rate limit buckets");
        self.record(|m| m.record_buckets_cleared(cleared));
        cleared
    }

    fn record(&self, f: impl FnOnce(&Metrics)) {
        if let Some(m) = self.metrics.as_deref() {
            f(m);
        }
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("classifier", &self.classifier)
            .field("pools", &self.pools)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
