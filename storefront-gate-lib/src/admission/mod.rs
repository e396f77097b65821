//! Request admission control.
//!
//! Every inbound request is classified into a traffic class and charged one token from a
//! per-identity, per-class token bucket before any business logic runs.
//!
//! # Architecture
//!
//! 1. **Bucket** (`bucket.rs`): token bucket with continuous (greedy) refill, serialized by a
//!    per-bucket mutex.
//!
//! 2. **BucketPool** (`pool.rs`): lazily populated key -> bucket map, one per traffic class.
//!
//! 3. **TrafficClassifier** (`classifier.rs`): ordered path rules mapping a request to a class
//!    or to bypass.
//!
//! 4. **PrincipalKeyResolver** (`principal.rs`): authenticated principal name, else client
//!    address.
//!
//! 5. **AdmissionController** (`controller.rs`): wires the above together and produces an
//!    [`AdmissionDecision`].
//!
//! # Example Usage
//!
//! ```ignore
//! use storefront_gate_lib::admission::{AdmissionController, AdmissionRequest};
//! use storefront_gate_lib::config::RouteRules;
//!
//! let controller = AdmissionController::new(RouteRules::default());
//! let request = AdmissionRequest::new(http::Method::POST, "/api/users/login")
//!     .with_client_addr("10.0.0.5".parse()?);
//!
//! match controller.check(&request) {
//!     AdmissionDecision::Allowed { remaining, .. } => println!("{remaining} left"),
//!     AdmissionDecision::Rejected { retry_after, .. } => println!("retry in {retry_after:?}"),
//!     AdmissionDecision::Bypassed => {}
//! }
//! ```

mod bucket;
mod class;
mod classifier;
mod clock;
mod controller;
mod pool;
mod principal;

pub use bucket::{Bucket, ConsumptionProbe};
pub use class::{BucketSpec, TrafficClass, REFILL_PERIOD};
pub use classifier::{Classification, TrafficClassifier};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{AdmissionController, AdmissionDecision, AdmissionRequest};
pub use pool::BucketPool;
pub use principal::{AuthContext, PrincipalKeyResolver, ADMIN_AUTHORITY, ANONYMOUS_PRINCIPAL};
