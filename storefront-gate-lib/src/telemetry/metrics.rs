use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

use crate::admission::TrafficClass;

pub mod labels {
    pub const ERROR_TYPE: &str = "error_type";
    pub const CLASS: &str = "class";
    pub const DECISION: &str = "decision";
    pub const STATUS_CODE: &str = "status_code";
    pub const METHOD: &str = "method";
    pub const PROTOCOL: &str = "protocol";
    pub const UPSTREAM: &str = "upstream";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const ERROR_UPSTREAM: &str = "upstream";
    pub const ERROR_UPSTREAM_TIMEOUT: &str = "upstream_timeout";
    pub const DECISION_ALLOWED: &str = "allowed";
    pub const DECISION_REJECTED: &str = "rejected";
    pub const DECISION_BYPASSED: &str = "bypassed";
}

#[derive(Clone)]
pub struct Metrics {
    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    pub upstream_requests_total: Counter<u64>,
    pub upstream_errors_total: Counter<u64>,
    pub upstream_duration_seconds: Histogram<f64>,

    // Admission control metrics
    pub admission_requests_total: Counter<u64>,
    pub admission_allowed_total: Counter<u64>,
    pub admission_rejected_total: Counter<u64>,
    pub admission_bypassed_total: Counter<u64>,
    pub admission_key_fallbacks_total: Counter<u64>,
    pub admission_buckets_cleared_total: Counter<u64>,

    pub errors_total: Counter<u64>,

    // Build info
    pub build_info: Gauge<u64>,
}

impl Metrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("storefront_gate_requests_total")
                .with_description("Total number of requests processed")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("storefront_gate_requests_duration_seconds")
                .with_description("Request duration in seconds")
                .build(),

            upstream_requests_total: meter
                .u64_counter("storefront_gate_upstream_requests_total")
                .with_description("Total number of requests forwarded to the upstream")
                .build(),
            upstream_errors_total: meter
                .u64_counter("storefront_gate_upstream_errors_total")
                .with_description("Total number of upstream errors")
                .build(),
            upstream_duration_seconds: meter
                .f64_histogram("storefront_gate_upstream_duration_seconds")
                .with_description("Upstream request duration in seconds")
                .build(),

            admission_requests_total: meter
                .u64_counter("storefront_gate_admission_requests_total")
                .with_description("Total number of requests evaluated by admission control")
                .build(),
            admission_allowed_total: meter
                .u64_counter("storefront_gate_admission_allowed_total")
                .with_description("Total number of requests admitted, by traffic class")
                .build(),
            admission_rejected_total: meter
                .u64_counter("storefront_gate_admission_rejected_total")
                .with_description("Total number of requests rejected (429), by traffic class")
                .build(),
            admission_bypassed_total: meter
                .u64_counter("storefront_gate_admission_bypassed_total")
                .with_description("Total number of requests that skipped admission control")
                .build(),
            admission_key_fallbacks_total: meter
                .u64_counter("storefront_gate_admission_key_fallbacks_total")
                .with_description(
                    "Total number of requests admitted because no rate limit key could be derived",
                )
                .build(),
            admission_buckets_cleared_total: meter
                .u64_counter("storefront_gate_admission_buckets_cleared_total")
                .with_description("Total number of token buckets removed by administrative resets")
                .build(),

            errors_total: meter
                .u64_counter("storefront_gate_errors_total")
                .with_description("Total number of errors")
                .build(),

            build_info: meter
                .u64_gauge("storefront_gate_build_info")
                .with_description("Build information (version, rust version)")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_admission_allowed(&self, class: TrafficClass) {
        let attrs = [KeyValue::new(labels::CLASS, class.as_str())];
        self.admission_requests_total.add(
            1,
            &[
                KeyValue::new(labels::CLASS, class.as_str()),
                KeyValue::new(labels::DECISION, values::DECISION_ALLOWED),
            ],
        );
        self.admission_allowed_total.add(1, &attrs);
    }

    pub fn record_admission_rejected(&self, class: TrafficClass) {
        let attrs = [KeyValue::new(labels::CLASS, class.as_str())];
        self.admission_requests_total.add(
            1,
            &[
                KeyValue::new(labels::CLASS, class.as_str()),
                KeyValue::new(labels::DECISION, values::DECISION_REJECTED),
            ],
        );
        self.admission_rejected_total.add(1, &attrs);
    }

    pub fn record_admission_bypassed(&self) {
        self.admission_requests_total
            .add(1, &[KeyValue::new(labels::DECISION, values::DECISION_BYPASSED)]);
        self.admission_bypassed_total.add(1, &[]);
    }

    pub fn record_key_fallback(&self) {
        self.admission_key_fallbacks_total.add(1, &[]);
    }

    pub fn record_buckets_cleared(&self, count: usize) {
        if count > 0 {
            self.admission_buckets_cleared_total
                .add(u64::try_from(count).unwrap_or(u64::MAX), &[]);
        }
    }

    pub fn record_request(&self, method: &str, status_code: u16, protocol: &str, duration: f64) {
        let attrs = [
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
            KeyValue::new(labels::PROTOCOL, protocol.to_string()),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds.record(duration, &attrs);
    }

    pub fn record_upstream_request(&self, upstream: &str, status_code: u16, duration: f64) {
        let attrs = [
            KeyValue::new(labels::UPSTREAM, upstream.to_string()),
            KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
        ];
        self.upstream_requests_total.add(1, &attrs);
        self.upstream_duration_seconds.record(duration, &attrs);
    }

    pub fn record_upstream_error(&self, upstream: &str, error_type: &str) {
        self.upstream_errors_total.add(
            1,
            &[
                KeyValue::new(labels::UPSTREAM, upstream.to_string()),
                KeyValue::new(labels::ERROR_TYPE, error_type.to_string()),
            ],
        );
        self.errors_total
            .add(1, &[KeyValue::new(labels::ERROR_TYPE, error_type.to_string())]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("storefront-gate");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
