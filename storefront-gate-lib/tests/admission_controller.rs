use std::net::IpAddr;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use http::Method;

use storefront_gate_lib::admission::{
    AdmissionController, AdmissionDecision, AdmissionRequest, AuthContext, ManualClock,
    PrincipalKeyResolver, TrafficClass, ADMIN_AUTHORITY,
};
use storefront_gate_lib::config::RouteRules;

fn controller() -> (AdmissionController, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (AdmissionController::with_clock(RouteRules::default(), clock.clone()), clock)
}

fn ip(addr: &str) -> IpAddr {
    addr.parse().unwrap_or_else(|_| panic!("bad test address {addr}"))
}

fn from(addr: &str, method: Method, path: &str) -> AdmissionRequest {
    AdmissionRequest::new(method, path).with_client_addr(ip(addr))
}

#[test]
fn test_login_burst_from_one_address() {
    let (controller, _clock) = controller();
    let req = from("10.0.0.5", Method::POST, "/api/users/login");

    for expected in (0..5).rev() {
        match controller.check(&req) {
            AdmissionDecision::Allowed { class, key, remaining } => {
                assert_eq!(class, TrafficClass::Login);
                assert_eq!(key, "10.0.0.5");
                assert_eq!(remaining, expected);
            }
            other => panic!("expected Allowed, got {other:?}"),
        }
    }

    match controller.check(&req) {
        AdmissionDecision::Rejected { class, key, retry_after } => {
            assert_eq!(class, TrafficClass::Login);
            assert_eq!(key, "10.0.0.5");
            assert_eq!(retry_after, Duration::from_secs(12));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[test]
fn test_rejected_identity_recovers_after_refill() {
    let (controller, clock) = controller();
    let req = from("10.0.0.5", Method::POST, "/api/users/register");

    for _ in 0..3 {
        assert!(controller.check(&req).is_allowed());
    }
    assert!(controller.check(&req).is_rejected());

    clock.advance(Duration::from_secs(20));
    let decision = controller.check(&req);
    assert!(decision.is_allowed());
    assert_eq!(decision.remaining(), Some(0));
    assert!(controller.check(&req).is_rejected());
}

#[test]
fn test_addresses_do_not_share_buckets() {
    let (controller, _clock) = controller();
    for _ in 0..5 {
        assert!(controller.check(&from("10.0.0.5", Method::POST, "/api/users/login")).is_allowed());
    }
    assert!(controller.check(&from("10.0.0.5", Method::POST, "/api/users/login")).is_rejected());
    assert!(controller.check(&from("10.0.0.6", Method::POST, "/api/users/login")).is_allowed());
}

#[test]
fn test_classes_do_not_share_buckets() {
    let (controller, _clock) = controller();
    for _ in 0..5 {
        controller.check(&from("10.0.0.5", Method::POST, "/api/users/login"));
    }
    assert!(controller.check(&from("10.0.0.5", Method::POST, "/api/users/login")).is_rejected());

    let payment = controller.check(&from("10.0.0.5", Method::POST, "/api/payments"));
    assert_eq!(payment.class(), Some(TrafficClass::Payment));
    assert_eq!(payment.remaining(), Some(19));
}

#[test]
fn test_admin_and_default_pools_are_independent() {
    let (controller, _clock) = controller();
    let admin = AdmissionRequest::new(Method::GET, "/api/orders")
        .with_auth(AuthContext::authenticated("alice", [ADMIN_AUTHORITY]))
        .with_client_addr(ip("10.0.0.5"));
    let user = AdmissionRequest::new(Method::GET, "/api/orders")
        .with_auth(AuthContext::authenticated("alice", ["ROLE_USER"]))
        .with_client_addr(ip("10.0.0.5"));

    for _ in 0..100 {
        assert!(controller.check(&user).is_allowed());
    }
    assert!(controller.check(&user).is_rejected());

    let decision = controller.check(&admin);
    assert_eq!(decision.class(), Some(TrafficClass::Admin));
    assert_eq!(decision.remaining(), Some(199));

    assert_eq!(controller.available_tokens(TrafficClass::Default, "alice"), Some(0));
    assert_eq!(controller.available_tokens(TrafficClass::Admin, "alice"), Some(199));
}

#[test]
fn test_authenticated_principal_keys_across_addresses() {
    let (controller, _clock) = controller();
    let auth = AuthContext::authenticated("bob", ["ROLE_USER"]);

    for n in 0..20u8 {
        let req = AdmissionRequest::new(Method::POST, "/api/payments/checkout")
            .with_auth(auth.clone())
            .with_client_addr(IpAddr::from([192, 168, 0, n]));
        assert!(controller.check(&req).is_allowed());
    }
    let req = AdmissionRequest::new(Method::POST, "/api/payments/checkout")
        .with_auth(auth)
        .with_client_addr(ip("192.168.0.200"));
    assert!(controller.check(&req).is_rejected());
    assert_eq!(controller.bucket_count(TrafficClass::Payment), 1);
}

#[test]
fn test_anonymous_principal_keys_on_address() {
    let (controller, _clock) = controller();
    let req = from("10.0.0.7", Method::GET, "/api/cart").with_auth(AuthContext::anonymous());

    match controller.check(&req) {
        AdmissionDecision::Allowed { key, .. } => assert_eq!(key, "10.0.0.7"),
        other => panic!("expected Allowed, got {other:?}"),
    }
}

#[test]
fn test_bypass_consumes_nothing() {
    let (controller, _clock) = controller();
    for _ in 0..1000 {
        let decision = controller.check(&from("10.0.0.5", Method::GET, "/swagger-ui/index.html"));
        assert!(decision.is_bypassed());
        assert!(decision.is_forwarded());
        assert_eq!(decision.class(), None);
        assert_eq!(decision.remaining(), None);
    }
    assert!(controller.check(&from("10.0.0.5", Method::GET, "/api/products/1")).is_bypassed());
    for class in TrafficClass::ALL {
        assert_eq!(controller.bucket_count(class), 0);
    }
}

#[test]
fn test_missing_identity_fails_open() {
    let (controller, _clock) = controller();
    let req = AdmissionRequest::new(Method::POST, "/api/users/login");

    for _ in 0..20 {
        assert!(controller.check(&req).is_bypassed());
    }
    assert_eq!(controller.bucket_count(TrafficClass::Login), 0);
}

#[test]
fn test_clear_buckets_for_key() {
    let (controller, _clock) = controller();
    for _ in 0..5 {
        controller.check(&from("10.0.0.5", Method::POST, "/api/users/login"));
    }
    controller.check(&from("10.0.0.5", Method::POST, "/api/payments"));
    controller.check(&from("10.0.0.9", Method::POST, "/api/users/login"));

    assert_eq!(controller.clear_buckets_for_key("10.0.0.5"), 2);
    assert_eq!(controller.clear_buckets_for_key("10.0.0.5"), 0);
    assert_eq!(controller.clear_buckets_for_key("nobody"), 0);

    assert_eq!(controller.available_tokens(TrafficClass::Login, "10.0.0.5"), None);
    assert_eq!(controller.available_tokens(TrafficClass::Login, "10.0.0.9"), Some(4));

    let decision = controller.check(&from("10.0.0.5", Method::POST, "/api/users/login"));
    assert_eq!(decision.remaining(), Some(4));
}

#[test]
fn test_clear_all_buckets() {
    let (controller, _clock) = controller();
    controller.check(&from("10.0.0.5", Method::POST, "/api/users/login"));
    controller.check(&from("10.0.0.5", Method::POST, "/api/payments"));
    controller.check(&from("10.0.0.6", Method::GET, "/api/orders"));

    assert_eq!(controller.clear_all_buckets(), 3);
    assert_eq!(controller.clear_all_buckets(), 0);
    for class in TrafficClass::ALL {
        assert_eq!(controller.bucket_count(class), 0);
    }
}

#[test]
fn test_concurrent_checks_admit_exactly_capacity() {
    let threads = 24;
    let (controller, _clock) = controller();
    let controller = Arc::new(controller);
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                controller.check(&from("10.0.0.5", Method::POST, "/api/users/register"))
            })
        })
        .collect();

    let mut allowed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.join() {
            Ok(decision) if decision.is_allowed() => allowed += 1,
            Ok(decision) if decision.is_rejected() => rejected += 1,
            Ok(decision) => panic!("unexpected decision {decision:?}"),
            Err(_) => panic!("checker thread panicked"),
        }
    }

    assert_eq!(allowed, 3);
    assert_eq!(rejected, threads - 3);
}

#[test]
fn test_separate_controllers_do_not_share_state() {
    let (first, _) = controller();
    let (second, _) = controller();
    for _ in 0..3 {
        first.check(&from("10.0.0.5", Method::POST, "/api/users/register"));
    }
    assert!(first.check(&from("10.0.0.5", Method::POST, "/api/users/register")).is_rejected());
    assert!(second.check(&from("10.0.0.5", Method::POST, "/api/users/register")).is_allowed());
}

#[test]
fn test_principal_resolution() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let resolver = PrincipalKeyResolver::new();
    let addr = Some(ip("10.0.0.5"));

    let alice = AuthContext::authenticated("alice", ["ROLE_USER"]);
    assert_eq!(resolver.resolve(Some(&alice), addr)?, "alice");
    assert_eq!(resolver.resolve(Some(&alice), None)?, "alice");

    assert_eq!(resolver.resolve(Some(&AuthContext::anonymous()), addr)?, "10.0.0.5");
    assert_eq!(resolver.resolve(None, addr)?, "10.0.0.5");

    let blank = AuthContext::authenticated("  ", Vec::<String>::new());
    assert_eq!(resolver.resolve(Some(&blank), addr)?, "10.0.0.5");

    let mut unverified = AuthContext::authenticated("carol", ["ROLE_USER"]);
    unverified.authenticated = false;
    assert_eq!(resolver.resolve(Some(&unverified), addr)?, "10.0.0.5");

    assert_eq!(resolver.resolve(None, Some(ip("2001:db8::1")))?, "2001:db8::1");
    assert!(resolver.resolve(None, None).is_err());
    Ok(())
}
