//! Subscriber half of an extraction session

use super::emitter::{Emitter, Event};
use super::state::{SessionState, SessionStatus};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink};
use crate::error::ExtractError;
use crate::source::Record;
use futures::Stream;
use futures::stream::FusedStream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lazy, single-subscriber sequence of records from one source
///
/// Each `Ok` item is one record, in source order. The stream ends after the
/// source is exhausted (completion), or right after yielding a single `Err`
/// item (failure). Records yielded before a failure stand.
///
/// Call [`RecordStream::cancel`] to stop early and wait for the underlying
/// resource to be released. Dropping the stream also cancels the session,
/// without waiting. A stream cannot be restarted; ask the
/// [`SourceReader`](crate::SourceReader) for a new one instead.
///
/// # Example
/// ```no_run
/// use futures::StreamExt;
/// use lazy_extract::SourceReader;
///
/// # async fn example() -> eyre::Result<()> {
/// let reader = SourceReader::new();
/// let mut records = reader.from_csv("orders.csv")?;
/// while let Some(record) = records.next().await {
///     println!("{:?}", record?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RecordStream {
    rx: mpsc::Receiver<Event>,
    cancel: CancellationToken,
    status: SessionStatus,
    producer: Option<JoinHandle<()>>,
    source: String,
    done: bool,
}

impl RecordStream {
    /// Current lifecycle state of the session behind this stream
    pub fn state(&self) -> SessionState {
        self.status.get()
    }

    /// Name of the resource being read, credentials masked
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Stop emission and wait until the resource has been released
    ///
    /// No item is yielded after this returns. Calling it again, or after the
    /// stream already ended, is a no-op.
    pub async fn cancel(&mut self) {
        self.done = true;
        self.cancel.cancel();
        // wakes a producer blocked on a full channel
        self.rx.close();

        if let Some(producer) = self.producer.take() {
            // a panicked producer has already reported through its emitter
            let _ = producer.await;
        }
    }
}

impl Stream for RecordStream {
    type Item = Result<Record, ExtractError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done || this.cancel.is_cancelled() {
            this.done = true;
            return Poll::Ready(None);
        }

        let item = match ready!(this.rx.poll_recv(cx)) {
            Some(Event::Next(record)) => return Poll::Ready(Some(Ok(record))),
            Some(Event::Complete) => None,
            Some(Event::Error(err)) => Some(Err(err)),
            None => Some(Err(ExtractError::read(
                &this.source,
                "producer stopped without completing",
            ))),
        };
        this.done = true;
        Poll::Ready(item)
    }
}

impl FusedStream for RecordStream {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("source", &self.source)
            .field("state", &self.state())
            .field("done", &self.done)
            .finish()
    }
}

/// Start a session: spawn `producer` on the runtime and hand back its stream
///
/// Must be called from within a Tokio runtime.
pub(crate) fn spawn_session<F, Fut>(
    source: String,
    capacity: usize,
    diagnostics: Arc<dyn DiagnosticsSink>,
    producer: F,
) -> RecordStream
where
    F: FnOnce(Emitter) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let cancel = CancellationToken::new();
    let status = SessionStatus::new();

    diagnostics.record(DiagnosticEvent::SessionStarted {
        source: source.clone(),
    });

    let emitter = Emitter::new(
        tx,
        cancel.clone(),
        status.clone(),
        diagnostics,
        source.clone(),
    );
    let producer = tokio::spawn(producer(emitter));

    RecordStream {
        rx,
        cancel,
        status,
        producer: Some(producer),
        source,
        done: false,
    }
}
