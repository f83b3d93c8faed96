//! MongoDB implementation of the document-store seam

use super::document_store::{DocumentCursor, DocumentStore};
use crate::error::ExtractError;
use crate::source::DocumentStoreSource;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Cursor};
use tokio_util::sync::CancellationToken;

/// Database used when the connection string names none
pub const DEFAULT_DATABASE: &str = "test";

/// Reads collections through the official MongoDB driver
///
/// Each [`DocumentStore::open`] builds its own `Client`, so sessions never
/// share a connection pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoStore;

#[async_trait]
impl DocumentStore for MongoStore {
    async fn open(
        &self,
        source: &DocumentStoreSource,
        batch_size: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<Box<dyn DocumentCursor>>, ExtractError> {
        let resource = source.redacted_uri();
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let client = Client::with_uri_str(&source.connection_uri)
            .await
            .map_err(|err| ExtractError::open(&resource, err))?;

        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));
        log::debug!(
            "Opening collection {}.{} on {}",
            database.name(),
            source.collection_name,
            resource
        );

        let collection = database.collection::<Document>(&source.collection_name);
        let found = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            found = collection.find(doc! {}).batch_size(batch_size).into_future() => Some(found),
        };

        let cursor = match found {
            Some(Ok(cursor)) => cursor,
            Some(Err(err)) => {
                client.shutdown().await;
                return Err(ExtractError::open(&resource, err));
            }
            None => {
                client.shutdown().await;
                log::debug!("Cancelled while opening {}", resource);
                return Ok(None);
            }
        };

        let cursor: Box<dyn DocumentCursor> = Box::new(MongoCursor {
            client,
            cursor,
            resource,
        });
        Ok(Some(cursor))
    }
}

struct MongoCursor {
    client: Client,
    cursor: Cursor<Document>,
    resource: String,
}

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn next_document(&mut self) -> Option<Result<Document, ExtractError>> {
        self.cursor
            .try_next()
            .await
            .map_err(|err| ExtractError::read(&self.resource, err))
            .transpose()
    }

    async fn release(self: Box<Self>) {
        let MongoCursor {
            client,
            cursor,
            resource,
        } = *self;

        // the driver waits for open cursors before shutting down
        drop(cursor);
        client.shutdown().await;
        log::debug!("Released connection to {}", resource);
    }
}
