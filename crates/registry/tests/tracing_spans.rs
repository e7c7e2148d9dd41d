//! Integration test verifying that `#[instrument]` annotations and audit
//! events are emitted by the registries.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use adtoken_registry::{
    CachingRegistry, MemoryDirectory, SimpleRegistry, TokenGroupsRegistry, testutil::sid,
};
use tracing::{
    Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer that records span names and audit actions
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Collector {
    spans: Arc<Mutex<Vec<String>>>,
    audit_actions: Arc<Mutex<Vec<String>>>,
    warnings: Arc<Mutex<Vec<String>>>,
}

#[derive(Default)]
struct FieldVisitor {
    audit_action: Option<String>,
    message: Option<String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "audit.action" {
            self.audit_action = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for Collector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }

    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        if let Some(action) = visitor.audit_action {
            self.audit_actions.lock().expect("lock poisoned").push(action);
        }
        if *event.metadata().level() == tracing::Level::WARN
            && let Some(message) = visitor.message
        {
            self.warnings.lock().expect("lock poisoned").push(message);
        }
    }
}

fn directory() -> MemoryDirectory {
    let directory = MemoryDirectory::with_context_base("DC=example,DC=com");
    directory.insert("CN=Users,CN=Builtin", sid("S-1-5-32-545"));
    directory
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn caching_miss_creates_resolve_and_search_spans() {
    let collector = Collector::default();
    let spans = Arc::clone(&collector.spans);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let registry = CachingRegistry::builder().directory(directory()).build().expect("builds");
    registry.resolve(&sid("S-1-5-32-545")).await.expect("lookup");

    let recorded = spans.lock().expect("lock poisoned");
    let resolves = recorded.iter().filter(|s| *s == "resolve").count();
    assert_eq!(resolves, 2, "caching and inner resolve spans, got: {recorded:?}");
    assert!(recorded.iter().any(|s| s == "search"), "expected a 'search' span, got: {recorded:?}");
}

#[tokio::test]
async fn caching_hit_skips_search_span() {
    let registry = CachingRegistry::builder().directory(directory()).build().expect("builds");
    registry.resolve(&sid("S-1-5-32-545")).await.expect("warm");

    let collector = Collector::default();
    let spans = Arc::clone(&collector.spans);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    registry.resolve(&sid("S-1-5-32-545")).await.expect("lookup");

    let recorded = spans.lock().expect("lock poisoned");
    assert_eq!(*recorded, ["resolve"], "a hit creates only the outer span");
}

#[tokio::test]
async fn simple_registry_creates_resolve_span() {
    let collector = Collector::default();
    let spans = Arc::clone(&collector.spans);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let registry = SimpleRegistry::builder().directory(directory()).build().expect("builds");
    registry.get_dn_from_sid_str("S-1-5-32-545").await.expect("lookup");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(
        recorded.iter().any(|s| s == "resolve"),
        "expected a 'resolve' span, got: {recorded:?}"
    );
}

#[tokio::test]
async fn invalidation_emits_audit_events() {
    let collector = Collector::default();
    let spans = Arc::clone(&collector.spans);
    let actions = Arc::clone(&collector.audit_actions);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let registry = CachingRegistry::builder().directory(directory()).build().expect("builds");
    registry.invalidate(&sid("S-1-5-32-545")).await;
    registry.invalidate_all().await;

    assert_eq!(*actions.lock().expect("lock poisoned"), ["invalidate_cache", "clear_cache"]);
    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "invalidate"), "got: {recorded:?}");
    assert!(recorded.iter().any(|s| s == "invalidate_all"), "got: {recorded:?}");
}

#[tokio::test]
async fn malformed_token_is_logged_as_warning() {
    let collector = Collector::default();
    let warnings = Arc::clone(&collector.warnings);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let registry = SimpleRegistry::builder().directory(directory()).build().expect("builds");
    let dn = registry.get_dn_from_sid(&[0x01, 0x05, 0x00]).await.expect("soft failure");
    assert!(dn.is_none());

    let recorded = warnings.lock().expect("lock poisoned");
    assert_eq!(recorded.len(), 1, "got: {recorded:?}");
    assert!(recorded[0].contains("invalid SID"), "got: {recorded:?}");
}
