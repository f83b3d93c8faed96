//! Document-store access behind a trait seam
//!
//! [`DocumentStore`] opens a cursor over a whole collection;
//! [`DocumentCursor`] yields its documents and releases the connection.
//! [`MongoStore`](super::MongoStore) is the production implementation.

use crate::error::ExtractError;
use crate::session::{Emitter, Outcome};
use crate::source::{DocumentStoreSource, Record};
use async_trait::async_trait;
use mongodb::bson::Document;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Documents fetched per round-trip unless configured otherwise
pub const DEFAULT_BATCH_SIZE: u32 = 10_000;

/// Opens collection cursors on a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Connect and start an unfiltered scan of the source's collection
    ///
    /// Returns `Ok(None)` when `cancel` fires before the cursor is ready.
    /// Whatever was connected by then must be shut down before returning, so
    /// the caller never has to race this call against cancellation.
    ///
    /// # Errors
    /// Returns `ResourceOpen` if the connection or the query cannot be
    /// established. Nothing stays open when this fails.
    async fn open(
        &self,
        source: &DocumentStoreSource,
        batch_size: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<Box<dyn DocumentCursor>>, ExtractError>;
}

/// An open scan over a collection, owning its connection
#[async_trait]
pub trait DocumentCursor: Send {
    /// Next document in cursor order, or `None` once exhausted
    async fn next_document(&mut self) -> Option<Result<Document, ExtractError>>;

    /// Close the cursor and the connection behind it
    async fn release(self: Box<Self>);
}

/// Producer for a document-store session
pub(crate) async fn stream_documents(
    store: Arc<dyn DocumentStore>,
    source: DocumentStoreSource,
    batch_size: u32,
    mut emitter: Emitter,
) {
    let opened = store
        .open(&source, batch_size, emitter.cancellation())
        .await;

    let mut cursor = match opened {
        Ok(Some(cursor)) => cursor,
        Ok(None) => return emitter.finish(Outcome::Cancelled).await,
        Err(err) => return emitter.finish(Outcome::Failed(err)).await,
    };
    emitter.streaming();
    log::debug!(
        "Streaming {} with batch size {}",
        emitter.source(),
        batch_size
    );

    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = emitter.cancelled() => break Outcome::Cancelled,
            next = cursor.next_document() => next,
        };

        match next {
            Some(Ok(document)) => {
                if emitter.next(Record::Document(document)).await.is_err() {
                    break Outcome::Cancelled;
                }
            }
            Some(Err(err)) => break Outcome::Failed(err),
            None => {
                let elapsed = emitter.elapsed();
                emitter.report_completion(Some(elapsed));
                break Outcome::Completed;
            }
        }
    };

    cursor.release().await;
    emitter.finish(outcome).await;
}
