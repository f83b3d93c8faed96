//! Extraction sessions
//!
//! A session ties one producer task, which owns the underlying resource, to
//! one [`RecordStream`] subscriber through a bounded channel. The producer
//! talks through an [`Emitter`]; the subscriber polls the stream.

mod emitter;
mod state;
mod stream;

pub(crate) use emitter::{Emitter, Outcome};
pub use state::SessionState;
pub use stream::RecordStream;
pub(crate) use stream::spawn_session;
