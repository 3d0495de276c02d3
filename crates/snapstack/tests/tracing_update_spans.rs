#![forbid(unsafe_code)]

//! Tracing instrumentation of the update entry point.
//!
//! Every pass through the update entry point opens a `snapstack.update`
//! span carrying the origin of the update, whether it was recorded, and the
//! resulting history depth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use snapstack::{StackOptions, UndoStack};
use tracing::field::{Field, Visit};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UpdateSpan {
    origin: String,
    recorded: Option<bool>,
    depth: Option<u64>,
    has_duration: bool,
}

impl Visit for UpdateSpan {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "recorded" {
            self.recorded = Some(value);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "depth" => self.depth = Some(value),
            "duration_us" => self.has_duration = true,
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if value >= 0 {
            self.record_u64(field, value as u64);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "origin" {
            self.origin = format!("{value:?}");
        }
    }
}

/// Captures `snapstack.update` spans in creation order.
struct UpdateSpanSubscriber {
    next_id: AtomicU64,
    order: Arc<Mutex<Vec<u64>>>,
    spans: Arc<Mutex<HashMap<u64, UpdateSpan>>>,
}

impl tracing::Subscriber for UpdateSpanSubscriber {
    fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, attrs: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if attrs.metadata().name() == "snapstack.update" {
            let mut span = UpdateSpan::default();
            attrs.record(&mut span);
            self.spans.lock().expect("span capture lock").insert(id, span);
            self.order.lock().expect("span order lock").push(id);
        }
        tracing::span::Id::from_u64(id)
    }

    fn record(&self, span: &tracing::span::Id, values: &tracing::span::Record<'_>) {
        if let Some(captured) = self
            .spans
            .lock()
            .expect("span capture lock")
            .get_mut(&span.into_u64())
        {
            values.record(captured);
        }
    }

    fn record_follows_from(&self, _span: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, _event: &tracing::Event<'_>) {}

    fn enter(&self, _span: &tracing::span::Id) {}

    fn exit(&self, _span: &tracing::span::Id) {}
}

fn capture_update_spans(run: impl FnOnce()) -> Vec<UpdateSpan> {
    let order = Arc::new(Mutex::new(Vec::new()));
    let spans = Arc::new(Mutex::new(HashMap::new()));
    let subscriber = UpdateSpanSubscriber {
        next_id: AtomicU64::new(1),
        order: Arc::clone(&order),
        spans: Arc::clone(&spans),
    };
    {
        let _guard = tracing::subscriber::set_default(subscriber);
        run();
    }
    let spans = spans.lock().expect("span capture lock");
    order
        .lock()
        .expect("span order lock")
        .iter()
        .filter_map(|id| spans.get(id).cloned())
        .collect()
}

#[test]
fn update_spans_report_origin_and_recording() {
    let spans = capture_update_spans(|| {
        let stack = UndoStack::with_data(json!({"s": "a"}), StackOptions::new());
        stack.data().unwrap().set("s", "ab");
        stack.undo();
        stack.pause();
        stack.data().unwrap().set("s", "paused");
    });

    let summary: Vec<_> = spans
        .iter()
        .map(|s| (s.origin.as_str(), s.recorded, s.depth))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Assignment", Some(true), Some(1)),
            ("Write", Some(true), Some(2)),
            ("Navigation", Some(false), Some(2)),
            ("Write", Some(false), Some(2)),
        ]
    );
    assert!(spans.iter().all(|s| s.has_duration));
}

#[test]
fn noop_navigation_opens_no_span() {
    let spans = capture_update_spans(|| {
        let stack = UndoStack::with_data(json!(1), StackOptions::new());
        stack.undo();
        stack.redo();
    });
    assert_eq!(spans.len(), 1);
}

#[test]
fn filtered_writes_open_no_span() {
    let spans = capture_update_spans(|| {
        let stack = UndoStack::with_data(
            json!({"en-US": {"t": 1}}),
            StackOptions::new().with_filter(snapstack::KeyFilter::exact(["en-US"])),
        );
        stack.data().unwrap().at("en-US").set("t", 2);
    });
    assert_eq!(spans.len(), 1);
}

#[test]
fn full_session_formats_under_fmt_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("snapstack=trace"))
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let stack = UndoStack::with_data(json!({"s": "a"}), StackOptions::new().with_max_undos(2));
        let data = stack.data().unwrap();
        data.set("s", "ab");
        stack.data().unwrap().set("s", "abc");
        stack.undo();
        stack.pause();
        stack.unpause(true);
        assert_eq!(stack.len(), 2);
        assert!(!data.is_attached());
    });
}
