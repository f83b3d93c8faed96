//! Producer half of an extraction session

use super::state::{SessionState, SessionStatus};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink};
use crate::error::ExtractError;
use crate::source::Record;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Message sent from a producer to its [`RecordStream`](super::RecordStream)
#[derive(Debug)]
pub(crate) enum Event {
    Next(Record),
    Complete,
    Error(ExtractError),
}

/// How a producer ended
#[derive(Debug)]
pub(crate) enum Outcome {
    Completed,
    Failed(ExtractError),
    Cancelled,
}

/// The subscriber went away; stop producing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Sending side of a session
///
/// Owned by exactly one producer. Terminal events are only reachable through
/// [`Emitter::finish`], which consumes the emitter, so a session can never
/// emit twice or emit after its terminal event.
pub(crate) struct Emitter {
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
    status: SessionStatus,
    diagnostics: Arc<dyn DiagnosticsSink>,
    source: String,
    started: Instant,
    records: u64,
    completion_reported: bool,
    finished: bool,
}

impl Emitter {
    pub(crate) fn new(
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
        status: SessionStatus,
        diagnostics: Arc<dyn DiagnosticsSink>,
        source: String,
    ) -> Self {
        Self {
            tx,
            cancel,
            status,
            diagnostics,
            source,
            started: Instant::now(),
            records: 0,
            completion_reported: false,
            finished: false,
        }
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token a resource can watch while it is being opened
    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolves once the subscriber cancels or drops the stream
    pub(crate) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Time since the session was entered
    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The resource is open and records may follow
    pub(crate) fn streaming(&self) {
        self.status.transition(SessionState::Streaming);
    }

    /// Deliver one record from an async producer
    pub(crate) async fn next(&mut self, record: Record) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            sent = self.tx.send(Event::Next(record)) => sent.map_err(|_| Cancelled),
        };
        self.delivered(sent)
    }

    /// Deliver one record from a producer running on a blocking thread
    ///
    /// Blocks while the channel is full. Closing the subscriber's side wakes
    /// the call up with `Cancelled`.
    pub(crate) fn blocking_next(&mut self, record: Record) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let sent = self
            .tx
            .blocking_send(Event::Next(record))
            .map_err(|_| Cancelled);
        self.delivered(sent)
    }

    fn delivered(&mut self, sent: Result<(), Cancelled>) -> Result<(), Cancelled> {
        match sent {
            Ok(()) => {
                self.records += 1;
                Ok(())
            }
            Err(Cancelled) => {
                // receiver dropped without cancelling first
                self.cancel.cancel();
                Err(Cancelled)
            }
        }
    }

    /// Report successful completion ahead of [`Emitter::finish`]
    ///
    /// Lets a producer emit its completion diagnostic before releasing the
    /// resource. `finish` will not report it a second time.
    pub(crate) fn report_completion(&mut self, elapsed: Option<Duration>) {
        self.diagnostics.record(DiagnosticEvent::SessionCompleted {
            source: self.source.clone(),
            records: self.records,
            elapsed,
        });
        self.completion_reported = true;
    }

    /// Enter the terminal state and notify the subscriber
    ///
    /// Callers must release their resource before calling this.
    pub(crate) async fn finish(mut self, outcome: Outcome) {
        self.finished = true;

        let (state, event) = match outcome {
            Outcome::Completed => {
                if !self.completion_reported {
                    self.diagnostics.record(DiagnosticEvent::SessionCompleted {
                        source: self.source.clone(),
                        records: self.records,
                        elapsed: None,
                    });
                }
                (SessionState::Completed, Some(Event::Complete))
            }
            Outcome::Failed(error) => {
                self.diagnostics.record(DiagnosticEvent::SessionFailed {
                    source: self.source.clone(),
                    records: self.records,
                    error: error.clone(),
                });
                (SessionState::Failed, Some(Event::Error(error)))
            }
            Outcome::Cancelled => {
                self.diagnostics.record(DiagnosticEvent::SessionCancelled {
                    source: self.source.clone(),
                    records: self.records,
                });
                (SessionState::Cancelled, None)
            }
        };

        self.status.transition(state);

        if let Some(event) = event {
            // a subscriber that already left has nothing to hear
            let _ = self.tx.send(event).await;
        }
    }
}

impl Drop for Emitter {
    /// A producer that panicked or was torn down never reached `finish`.
    /// Report it through the sink so the session's end is always recorded.
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if self.cancel.is_cancelled() {
            self.diagnostics.record(DiagnosticEvent::SessionCancelled {
                source: self.source.clone(),
                records: self.records,
            });
            self.status.transition(SessionState::Cancelled);
        } else {
            self.diagnostics.record(DiagnosticEvent::SessionFailed {
                source: self.source.clone(),
                records: self.records,
                error: ExtractError::read(&self.source, "producer stopped without completing"),
            });
            self.status.transition(SessionState::Failed);
        }
    }
}
