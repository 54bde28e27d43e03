//! End-to-end patrols through the memory router.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use router_outposts::observability::LogLevel;
use router_outposts::outpost::{loader_fn, outpost_fn, OutpostSpec, Scope};
use router_outposts::patrol::{Outcome, Verdict};
use router_outposts::routing::{
    NavigationHook, NavigationResult, RedirectTarget, RouteLocation, RouterHost,
};
use router_outposts::OutpostsConfig;

mod common;
use common::{install, recording, router, sleeping, Calls};

fn completed_at(result: NavigationResult) -> String {
    match result {
        NavigationResult::Completed(to) => to.full_path,
        NavigationResult::Cancelled => panic!("navigation was cancelled"),
    }
}

#[tokio::test]
async fn test_globals_run_in_priority_order() {
    let router = router();
    let (outposts, _logs) = install(&router, OutpostsConfig::default());
    let calls = Calls::default();

    outposts.deploy(OutpostSpec::global("low", recording("low", &calls, Verdict::Allow)).priority(50));
    outposts.deploy(OutpostSpec::global("high", recording("high", &calls, Verdict::Allow)).priority(10));

    let result = router.navigate("/").await.unwrap();
    assert_eq!(completed_at(result), "/");
    assert_eq!(calls.names(), vec!["high", "low"]);
}

#[tokio::test]
async fn test_block_short_circuits() {
    let router = router();
    let (outposts, _logs) = install(&router, OutpostsConfig::default());
    let calls = Calls::default();

    outposts.deploy(OutpostSpec::global("gate", recording("gate", &calls, Verdict::Block)).priority(1));
    outposts.deploy(OutpostSpec::global("later", recording("later", &calls, Verdict::Allow)).priority(2));

    let result = router.navigate("/admin").await.unwrap();
    assert_eq!(result, NavigationResult::Cancelled);
    assert_eq!(calls.names(), vec!["gate"]);
    assert_eq!(router.current_route().full_path, "/");
}

#[tokio::test]
async fn test_default_timeout_blocks_and_warns() {
    let router = router();
    let config = OutpostsConfig {
        default_timeout_ms: Some(50),
        ..OutpostsConfig::default()
    };
    let (outposts, logs) = install(&router, config);

    outposts.deploy(OutpostSpec::global("slow", sleeping(Duration::from_millis(200))));

    let result = router.navigate("/admin").await.unwrap();
    assert_eq!(result, NavigationResult::Cancelled);

    let warnings = logs.matching(LogLevel::Warn, "timed out");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].outpost.as_deref(), Some("slow"));
}

#[tokio::test]
async fn test_route_outpost_redirects_to_named_route() {
    let router = router();
    let (outposts, _logs) = install(&router, OutpostsConfig::default());

    outposts.deploy(OutpostSpec::route(
        "admin-check",
        outpost_fn(|ctx| async move { Ok(ctx.redirect(RedirectTarget::named("login"))) }),
    ));
    assert!(outposts.attach_to_route("admin", ["admin-check"]));

    let to = router.resolve(&RedirectTarget::path("/admin")).unwrap();
    let outcome = outposts
        .patrol(NavigationHook::BeforeEach, to, RouteLocation::start())
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Redirect(RedirectTarget::named("login")));

    let result = router.navigate("/admin").await.unwrap();
    assert_eq!(completed_at(result), "/login");
}

#[tokio::test]
async fn test_handler_error_blocks_and_logs() {
    let router = router();
    let (outposts, logs) = install(&router, OutpostsConfig::default());

    outposts.deploy(OutpostSpec::global(
        "broken",
        outpost_fn(|_ctx| async { Err("boom".into()) }),
    ));

    let result = router.navigate("/admin").await.unwrap();
    assert_eq!(result, NavigationResult::Cancelled);

    let errors = logs.matching(LogLevel::Error, "boom");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].outpost.as_deref(), Some("broken"));
}

#[tokio::test]
async fn test_handler_panic_blocks() {
    let router = router();
    let (outposts, logs) = install(&router, OutpostsConfig::default());

    outposts.deploy(OutpostSpec::global(
        "panicky",
        outpost_fn(|ctx| async move {
            if ctx.to.path == "/admin" {
                panic!("handler exploded");
            }
            Ok(Verdict::Allow)
        }),
    ));

    assert_eq!(router.navigate("/admin").await.unwrap(), NavigationResult::Cancelled);
    assert_eq!(logs.at(LogLevel::Error).len(), 1);
    assert_eq!(completed_at(router.navigate("/login").await.unwrap()), "/login");
}

#[tokio::test]
async fn test_globals_run_before_route_outposts() {
    let router = router();
    let (outposts, _logs) = install(&router, OutpostsConfig::default());
    let calls = Calls::default();

    outposts.deploy(OutpostSpec::route("guard", recording("guard", &calls, Verdict::Allow)).priority(1));
    outposts.deploy(OutpostSpec::global("session", recording("session", &calls, Verdict::Allow)).priority(500));
    outposts.attach_to_route("admin", ["guard"]);

    router.navigate("/admin").await.unwrap();
    assert_eq!(calls.names(), vec!["session", "guard"]);
}

#[tokio::test]
async fn test_duplicate_route_outposts_run_once() {
    let router = router();
    let (outposts, logs) = install(&router, OutpostsConfig::default());
    let calls = Calls::default();

    outposts.deploy(OutpostSpec::route("audit", recording("audit", &calls, Verdict::Allow)));
    outposts.attach_to_route("admin", ["audit"]);
    outposts.attach_to_route("admin-user", ["audit"]);

    let result = router.navigate("/admin/users/7").await.unwrap();
    assert_eq!(completed_at(result), "/admin/users/7");
    assert_eq!(calls.names(), vec!["audit"]);
    assert_eq!(logs.matching(LogLevel::Warn, "Duplicate").len(), 1);
}

#[tokio::test]
async fn test_unregistered_route_outpost_is_skipped() {
    let router = router();
    let (outposts, logs) = install(&router, OutpostsConfig::default());
    let calls = Calls::default();

    outposts.deploy(OutpostSpec::route("known", recording("known", &calls, Verdict::Allow)));
    outposts.attach_to_route("admin", ["ghost", "known"]);

    let result = router.navigate("/admin").await.unwrap();
    assert_eq!(completed_at(result), "/admin");
    assert_eq!(calls.names(), vec!["known"]);

    let warnings = logs.matching(LogLevel::Warn, "not registered");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].outpost.as_deref(), Some("ghost"));
}

#[tokio::test]
async fn test_timeout_precedence() {
    let router = router();
    let config = OutpostsConfig {
        default_timeout_ms: Some(50),
        ..OutpostsConfig::default()
    };
    let (outposts, _logs) = install(&router, config);

    // Explicit 0 disables the default.
    outposts.deploy(OutpostSpec::global("patient", sleeping(Duration::from_millis(100))).timeout_ms(0));
    assert_eq!(completed_at(router.navigate("/admin").await.unwrap()), "/admin");

    // Explicit timeout beats the default.
    outposts.deploy(OutpostSpec::global("strict", sleeping(Duration::from_millis(30))).timeout_ms(10));
    assert_eq!(router.navigate("/login").await.unwrap(), NavigationResult::Cancelled);
}

#[tokio::test]
async fn test_hook_filtering() {
    let router = router();
    let (outposts, _logs) = install(&router, OutpostsConfig::default());
    let calls = Calls::default();

    let seen = calls.clone();
    outposts.deploy(
        OutpostSpec::global(
            "phases",
            outpost_fn(move |ctx| {
                seen.push(ctx.hook.as_str());
                async { Ok(Verdict::Allow) }
            }),
        )
        .applies_to([NavigationHook::BeforeResolve, NavigationHook::AfterEach]),
    );
    outposts.deploy(OutpostSpec::global("default-hooks", recording("default-hooks", &calls, Verdict::Allow)));

    router.navigate("/admin").await.unwrap();
    assert_eq!(
        calls.names(),
        vec!["default-hooks", "before_resolve", "after_each"]
    );
}

#[tokio::test]
async fn test_raw_verdicts_are_normalized() {
    let router = router();
    let (outposts, logs) = install(&router, OutpostsConfig::default());
    let to = router.resolve(&RedirectTarget::path("/admin")).unwrap();

    outposts.deploy(OutpostSpec::global(
        "raw",
        outpost_fn(|_ctx| async { Ok(Verdict::Raw(json!({ "path": "/login" }))) }),
    ));
    let outcome = outposts
        .patrol(NavigationHook::BeforeEach, to.clone(), RouteLocation::start())
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Redirect(RedirectTarget::Located { ref path, .. }) if path == "/login"));

    outposts.deploy(OutpostSpec::global(
        "raw",
        outpost_fn(|_ctx| async { Ok(Verdict::Raw(json!(42))) }),
    ));
    let outcome = outposts
        .patrol(NavigationHook::BeforeEach, to.clone(), RouteLocation::start())
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Block);
    assert_eq!(logs.matching(LogLevel::Error, "unusable outcome").len(), 1);

    outposts.deploy(OutpostSpec::global(
        "raw",
        outpost_fn(|ctx| async move { Ok(ctx.redirect("/nowhere")) }),
    ));
    let outcome = outposts
        .patrol(NavigationHook::BeforeEach, to, RouteLocation::start())
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Block);
}

#[tokio::test]
async fn test_lazy_outpost_loads_once() {
    let router = router();
    let (outposts, _logs) = install(&router, OutpostsConfig::default());
    let loads = Arc::new(AtomicU32::new(0));

    let counter = loads.clone();
    outposts.deploy(OutpostSpec::lazy(
        Scope::Global,
        "lazy",
        loader_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(outpost_fn(|_ctx| async { Ok(Verdict::Allow) })) }
        }),
    ));
    assert!(outposts.registry().get(Scope::Global, "lazy").unwrap().is_lazy());

    router.navigate("/admin").await.unwrap();
    router.navigate("/login").await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_lazy_load_blocks_then_retries() {
    let router = router();
    let (outposts, logs) = install(&router, OutpostsConfig::default());
    let loads = Arc::new(AtomicU32::new(0));

    let counter = loads.clone();
    outposts.deploy(OutpostSpec::lazy(
        Scope::Global,
        "flaky",
        loader_fn(move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    return Err("module unavailable".into());
                }
                Ok(outpost_fn(|_ctx| async { Ok(Verdict::Allow) }))
            }
        }),
    ));

    assert_eq!(router.navigate("/admin").await.unwrap(), NavigationResult::Cancelled);
    assert_eq!(logs.matching(LogLevel::Error, "module unavailable").len(), 1);

    assert_eq!(completed_at(router.navigate("/admin").await.unwrap()), "/admin");
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lazy_load_is_not_timed() {
    let router = router();
    let config = OutpostsConfig {
        default_timeout_ms: Some(20),
        ..OutpostsConfig::default()
    };
    let (outposts, logs) = install(&router, config);

    outposts.deploy(OutpostSpec::lazy(
        Scope::Global,
        "slow-module",
        loader_fn(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(outpost_fn(|_ctx| async { Ok(Verdict::Allow) }))
        }),
    ));

    let result = router.navigate("/admin").await.unwrap();
    assert_eq!(completed_at(result), "/admin");
    assert!(logs.matching(LogLevel::Warn, "timed out").is_empty());
}
