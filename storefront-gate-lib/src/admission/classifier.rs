use crate::admission::class::TrafficClass;
use crate::admission::controller::AdmissionRequest;
use crate::config::RouteRules;

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Skip admission control entirely.
    Bypass,
    /// Charge one token to the given class.
    Limited(TrafficClass),
}

/// Maps a request to a traffic class, or to bypass.
///
/// Rules are evaluated in a fixed order and the first match wins:
///
/// 1. documentation paths -> bypass
/// 2. exempt module prefixes -> bypass
/// 3. login path -> `login`
/// 4. register path -> `register`
/// 5. payments prefix -> `payment`
/// 6. products prefix -> `product-cache-refresh` | `product-search` | `product-filter` |
///    `product-general`
/// 7. caller holds the admin authority -> `admin`
/// 8. anything else -> `default`
///
/// The HTTP method never influences the outcome.
#[derive(Debug, Clone, Default)]
pub struct TrafficClassifier {
    rules: RouteRules,
}

impl TrafficClassifier {
    pub fn new(rules: RouteRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }

    pub fn classify(&self, request: &AdmissionRequest) -> Classification {
        let rules = &self.rules;
        let path = request.path.as_str();

        if self.is_documentation(path) {
            return Classification::Bypass;
        }
        if starts_with_any(path, &rules.exempt_prefixes) {
            return Classification::Bypass;
        }
        if path == rules.login_path {
            return Classification::Limited(TrafficClass::Login);
        }
        if path == rules.register_path {
            return Classification::Limited(TrafficClass::Register);
        }
        if path.starts_with(rules.payments_prefix.as_str()) {
            return Classification::Limited(TrafficClass::Payment);
        }
        if path.starts_with(rules.products_prefix.as_str()) {
            return Classification::Limited(self.product_class(path));
        }

        let is_admin = request
            .auth
            .as_ref()
            .is_some_and(|auth| auth.has_authority(&rules.admin_authority));
        if is_admin {
            Classification::Limited(TrafficClass::Admin)
        } else {
            Classification::Limited(TrafficClass::Default)
        }
    }

    fn is_documentation(&self, path: &str) -> bool {
        starts_with_any(path, &self.rules.docs_prefixes)
            || self.rules.docs_paths.iter().any(|p| p == path)
    }

    fn product_class(&self, path: &str) -> TrafficClass {
        let rules = &self.rules;
        if path.starts_with(rules.product_cache_refresh_prefix.as_str()) {
            TrafficClass::ProductCacheRefresh
        } else if path.starts_with(rules.product_search_prefix.as_str()) {
            TrafficClass::ProductSearch
        } else if path.starts_with(rules.product_filter_prefix.as_str()) {
            TrafficClass::ProductFilter
        } else {
            TrafficClass::ProductGeneral
        }
    }
}

fn starts_with_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}
