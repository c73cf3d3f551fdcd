//! Tooling primitives for warden agents.
//!
//! Trace events are plain data recorded during simulation. They hang off an agent's
//! [`warden_core::FactStore`] as attachments, so nothing in the decision path depends on them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    emit, TraceEvent, TraceLog, TraceSink, TracingSink, VecTraceSink, TRACE_LOG, TRACE_SINK,
};
