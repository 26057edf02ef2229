//! Progress observability primitives.
//!
//! The core never touches presentation directly. It reports through
//! [`GenerationObserver`] (progress, success and failure sinks) and the batch runner's
//! [`crate::batch::BatchObserver`]; [`event_channel`] turns both into an async stream of
//! serializable [`ProgressEvent`]s.

pub mod event;
pub mod observer;

pub use event::{now_millis, ProgressEnvelope, ProgressEvent};
pub use observer::{
    event_channel, ChannelObserver, GenerationFailure, GenerationObserver, GenerationSuccess,
    NoopObserver, ObserverSet, ProgressUpdate, TracingObserver,
};
