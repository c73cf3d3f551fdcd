#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use warden_core::{AttachmentKey, FactStore};

/// A small, allocation-friendly trace event.
///
/// `a` and `b` carry tag-specific payload (an actor id, a task generation, a distance in whole
/// units). Tags are short names such as `mode` or `task_finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub agent: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            agent: 0,
            tag: tag.into(),
            a: 0,
            b: 0,
        }
    }

    pub fn with_agent(mut self, agent: u64) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Forwards every event to `tracing` at debug level under the `warden::trace` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&mut self, event: TraceEvent) {
        tracing::debug!(
            target: "warden::trace",
            tick = event.tick,
            agent = event.agent,
            a = event.a,
            b = event.b,
            "{}",
            event.tag
        );
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.tag == tag)
    }

    pub fn count(&self, tag: &str) -> usize {
        self.with_tag(tag).count()
    }

    pub fn first<'a>(&'a self, tag: &'a str) -> Option<&'a TraceEvent> {
        self.with_tag(tag).next()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Attachment key for collecting events in-memory.
pub const TRACE_LOG: AttachmentKey<TraceLog> = AttachmentKey::new(0x5741_5244_0000_0001);
/// Attachment key for streaming events into a user-provided sink.
pub const TRACE_SINK: AttachmentKey<Box<dyn TraceSink>> = AttachmentKey::new(0x5741_5244_0000_0002);

/// Record `event` into whichever of [`TRACE_LOG`] / [`TRACE_SINK`] is attached. No-op otherwise.
pub fn emit(facts: &mut FactStore, event: TraceEvent) {
    if let Some(log) = facts.attachment_mut(TRACE_LOG) {
        log.push(event.clone());
    }
    if let Some(sink) = facts.attachment_mut(TRACE_SINK) {
        sink.emit(event);
    }
}
