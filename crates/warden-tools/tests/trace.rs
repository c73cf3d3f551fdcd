use std::cell::RefCell;
use std::rc::Rc;

use warden_core::FactStore;
use warden_tools::{
    emit, TraceEvent, TraceLog, TraceSink, TracingSink, VecTraceSink, TRACE_LOG, TRACE_SINK,
};

#[derive(Clone, Default)]
struct RcSink(Rc<RefCell<Vec<TraceEvent>>>);

impl TraceSink for RcSink {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}

#[test]
fn emit_is_a_no_op_without_attachments() {
    let mut facts = FactStore::with_schema();
    let before = facts.revision();

    emit(&mut facts, TraceEvent::new(1, "ignored"));

    assert!(!facts.has_attachment(TRACE_LOG));
    assert_eq!(facts.revision(), before);
}

#[test]
fn emit_writes_to_trace_log_when_present() {
    let mut facts = FactStore::with_schema();
    facts.attach(TRACE_LOG, TraceLog::default());

    emit(
        &mut facts,
        TraceEvent::new(1, "test").with_agent(3).with_a(10).with_b(20),
    );

    let log = facts.attachment(TRACE_LOG).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log.events[0].tick, 1);
    assert_eq!(log.events[0].agent, 3);
    assert_eq!(log.events[0].tag, "test");
    assert_eq!(log.events[0].a, 10);
    assert_eq!(log.events[0].b, 20);
}

#[test]
fn emit_writes_to_both_log_and_sink_when_both_present() {
    let mut facts = FactStore::with_schema();
    facts.attach(TRACE_LOG, TraceLog::default());

    let handle = RcSink::default();
    let shared = handle.0.clone();
    facts.attach(TRACE_SINK, Box::new(handle) as Box<dyn TraceSink>);

    emit(&mut facts, TraceEvent::new(3, "both"));

    let log = facts.attachment(TRACE_LOG).unwrap();
    assert_eq!(log.count("both"), 1);

    let events = shared.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tag, "both");
}

#[test]
fn trace_log_filters_by_tag() {
    let mut log = TraceLog::default();
    log.push(TraceEvent::new(1, "mode").with_a(2));
    log.push(TraceEvent::new(2, "task_start").with_a(1));
    log.push(TraceEvent::new(5, "task_start").with_a(2));

    assert_eq!(log.count("task_start"), 2);
    assert_eq!(log.first("task_start").map(|e| e.tick), Some(2));
    assert!(log.first("task_finish").is_none());

    log.clear();
    assert!(log.is_empty());
}

#[test]
fn vec_sink_keeps_events_in_order() {
    let mut sink = VecTraceSink::default();
    sink.emit(TraceEvent::new(1, "sensed").with_a(2).with_b(1));
    sink.emit(TraceEvent::new(1, "mode").with_a(2));

    let tags: Vec<&str> = sink.events.iter().map(|e| e.tag.as_ref()).collect();
    assert_eq!(tags, ["sensed", "mode"]);
}

#[test]
fn tracing_sink_accepts_events_without_a_subscriber() {
    let mut sink = TracingSink;
    sink.emit(TraceEvent::new(9, "mode").with_agent(1));
}
