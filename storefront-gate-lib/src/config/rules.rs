use serde::Deserialize;

/// Path rules used to classify traffic
///
/// Only paths are configurable here. The limits attached to each traffic class are fixed.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RouteRules {
    /// Documentation/introspection prefixes that skip admission control
    /// Default: ["/v3/api-docs", "/swagger-ui"]
    pub docs_prefixes: Vec<String>,
    /// Documentation paths that skip admission control on exact match
    /// Default: ["/swagger-ui.html"]
    pub docs_paths: Vec<String>,
    /// Module prefixes that skip admission control entirely
    /// Default: ["/api/products"]
    ///
    /// Because the product module is exempt by default, the product-* classes below are
    /// never selected. Set this to `[]` to rate limit product traffic per sub-path.
    pub exempt_prefixes: Vec<String>,
    /// Login endpoint (exact match)
    /// Default: "/api/users/login"
    pub login_path: String,
    /// Registration endpoint (exact match)
    /// Default: "/api/users/register"
    pub register_path: String,
    /// Payments module prefix
    /// Default: "/api/payments"
    pub payments_prefix: String,
    /// Product catalog prefix
    /// Default: "/api/products"
    pub products_prefix: String,
    /// Product cache refresh prefix
    /// Default: "/api/products/refresh-products-cache"
    pub product_cache_refresh_prefix: String,
    /// Product search prefix
    /// Default: "/api/products/search"
    pub product_search_prefix: String,
    /// Product filter prefix
    /// Default: "/api/products/filter"
    pub product_filter_prefix: String,
    /// Authority that selects the admin class
    /// Default: "ROLE_ADMIN"
    pub admin_authority: String,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            docs_prefixes: vec!["/v3/api-docs".to_string(), "/swagger-ui".to_string()],
            docs_paths: vec!["/swagger-ui.html".to_string()],
            exempt_prefixes: vec!["/api/products".to_string()],
            login_path: "/api/users/login".to_string(),
            register_path: "/api/users/register".to_string(),
            payments_prefix: "/api/payments".to_string(),
            products_prefix: "/api/products".to_string(),
            product_cache_refresh_prefix: "/api/products/refresh-products-cache".to_string(),
            product_search_prefix: "/api/products/search".to_string(),
            product_filter_prefix: "/api/products/filter".to_string(),
            admin_authority: crate::admission::ADMIN_AUTHORITY.to_string(),
        }
    }
}

impl RouteRules {
    /// Every configured path, for validation.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.docs_prefixes
            .iter()
            .chain(&self.docs_paths)
            .chain(&self.exempt_prefixes)
            .map(String::as_str)
            .chain([
                self.login_path.as_str(),
                self.register_path.as_str(),
                self.payments_prefix.as_str(),
                self.products_prefix.as_str(),
                self.product_cache_refresh_prefix.as_str(),
                self.product_search_prefix.as_str(),
                self.product_filter_prefix.as_str(),
            ])
    }
}
