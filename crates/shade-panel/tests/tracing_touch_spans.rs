#![forbid(unsafe_code)]

//! Tracing output of the touch path.
//!
//! Every event handled through the intercept or touch entry point runs
//! inside a span on the `shade::touch` target; gesture milestones are logged
//! inside it.
//!
//! Run:
//!   cargo test -p shade-panel --test tracing_touch_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shade_panel::testing::{drag, new_controller};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    target: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    parent_span_name: Option<String>,
}

#[derive(Clone, Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn event(&self, message: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.message == message)
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            target: attrs.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .iter()
            .find(|(k, _)| k == "message")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            parent_span_name,
        });
    }
}

fn with_capture<F: FnOnce()>(f: F) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn touch_events_run_inside_touch_spans() {
    let capture = with_capture(|| {
        let mut c = new_controller();
        drag(&mut c, 10.0, 410.0, ms(0), ms(100));
    });

    let touch_spans: Vec<_> = capture
        .spans()
        .into_iter()
        .filter(|s| s.name == "touch")
        .collect();
    // Down, ten moves, up.
    assert_eq!(touch_spans.len(), 12);
    for span in &touch_spans {
        assert_eq!(span.target, "shade::touch");
        assert!(span.fields.contains_key("action"), "{span:?}");
        assert!(span.fields.contains_key("t_ms"), "{span:?}");
    }

    let started = capture.event("tracking started").expect("tracking started logged");
    assert_eq!(started.target, "shade::touch");
    assert_eq!(started.parent_span_name.as_deref(), Some("touch"));

    let classified = capture.event("release classified").expect("release logged");
    assert_eq!(classified.level, tracing::Level::DEBUG);
    assert_eq!(classified.parent_span_name.as_deref(), Some("touch"));

    let fling = capture.event("fling started").expect("fling logged");
    assert_eq!(fling.target, "shade::fling");
}

#[test]
fn duplicate_down_is_warned() {
    let capture = with_capture(|| {
        let mut c = new_controller();
        let down = shade_core::MotionEvent::down(10.0, 10.0, ms(5));
        c.on_touch_event(&down);
        c.on_touch_event(&down);
    });

    let warning = capture
        .event("duplicate down swallowed")
        .expect("duplicate down warned");
    assert_eq!(warning.level, tracing::Level::WARN);
    assert_eq!(warning.target, "shade::touch");
}

#[test]
fn invalid_config_is_reported_at_construction() {
    let capture = with_capture(|| {
        let config = shade_core::ShadeConfig {
            density: 0.0,
            ..shade_core::ShadeConfig::default()
        };
        let _ = shade_panel::PanelController::new(config, shade_panel::Collaborators::default());
    });

    assert!(
        capture
            .events()
            .iter()
            .any(|e| e.level == tracing::Level::WARN && e.target == "shade::controller"),
        "{:?}",
        capture.events()
    );
}
