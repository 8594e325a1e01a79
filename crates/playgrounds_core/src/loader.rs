use std::time::Duration;

use mongodb::bson::{self, Document};
use mongodb::options::ClientOptions;
use mongodb::sync::Client;
use serde_json::Value;
use tracing::debug;

use crate::connection::ConnectionTarget;
use crate::error::{ImportError, ImportResult};

/// Sink for a batch of parsed documents.
pub trait DocumentStore {
    fn insert_many(&self, target: &ConnectionTarget, documents: Vec<Document>)
    -> ImportResult<u64>;
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    connect_timeout: Duration,
}

impl MongoStore {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl DocumentStore for MongoStore {
    fn insert_many(
        &self,
        target: &ConnectionTarget,
        documents: Vec<Document>,
    ) -> ImportResult<u64> {
        let namespace = target.namespace();
        let insert_error = |source: mongodb::error::Error| ImportError::Insert {
            namespace: namespace.clone(),
            source,
        };

        let mut options = ClientOptions::parse(target.connection_string.as_str())
            .run()
            .map_err(insert_error)?;
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);

        // The client owns the pool; dropping it on any return path closes every connection.
        let client = Client::with_options(options).map_err(insert_error)?;
        let collection = client
            .database(&target.database_name)
            .collection::<Document>(&target.collection_name);
        debug!(%namespace, count = documents.len(), "inserting playground documents");
        let result = collection.insert_many(documents).run().map_err(insert_error)?;
        Ok(result.inserted_ids.len() as u64)
    }
}

/// Parse a serialized JSON array into BSON documents.
pub fn parse_documents(payload: &str) -> ImportResult<Vec<Document>> {
    let values: Vec<Value> = serde_json::from_str(payload)
        .map_err(|err| ImportError::Parse(format!("failed to unmarshal data: {err}")))?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => bson::to_document(&map).map_err(|err| {
                ImportError::Parse(format!("document {index} cannot be encoded: {err}"))
            }),
            other => Err(ImportError::Parse(format!(
                "document {index} is not an object: {other}"
            ))),
        })
        .collect()
}

/// Parse `payload` and bulk-insert it. Nothing touches the store unless parsing succeeds.
pub fn load_documents(
    store: &dyn DocumentStore,
    target: &ConnectionTarget,
    payload: &str,
) -> ImportResult<u64> {
    if payload.trim().is_empty() {
        debug!(namespace = %target.namespace(), "snapshot has no documents to load");
        return Ok(0);
    }
    let documents = parse_documents(payload)?;
    if documents.is_empty() {
        return Ok(0);
    }
    store.insert_many(target, documents)
}
