//! services/api/src/adapters/store.rs
//!
//! This module contains the document registry adapter, which is the concrete
//! implementation of the `DocumentStore` port from the `core` crate. The
//! registry is in-process and ephemeral: documents live for the process
//! lifetime only, which is the durability level this service promises.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use studium_core::domain::{Document, DocumentStatus};
use studium_core::ports::{DocumentStore, StoreError};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An in-memory document registry implementing the `DocumentStore` port.
///
/// All writes for a given document go through the same `RwLock`, so the
/// single-writer-per-document invariant holds: `begin_processing` checks and
/// transitions the status under one write guard, which is what rejects the
/// second of two simultaneous processing attempts.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryDocumentStore {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, doc: Document) {
        self.documents.write().await.insert(doc.id, doc);
    }

    async fn get(&self, id: Uuid) -> Result<Document, StoreError> {
        self.documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.documents.read().await.values().cloned().collect();
        docs.sort_by_key(|d| d.uploaded_at);
        docs
    }

    async fn begin_processing(&self, id: Uuid) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        let doc = documents.get_mut(&id).ok_or(StoreError::NotFound)?;

        if doc.status == DocumentStatus::Processing {
            return Err(StoreError::AlreadyProcessing);
        }

        // Re-processing from a terminal state reverts through Processing and
        // clears the previous attempt's outcome.
        doc.status = DocumentStatus::Processing;
        doc.text = None;
        doc.word_count = None;
        doc.error = None;

        Ok(doc.clone())
    }

    async fn complete_processing(
        &self,
        id: Uuid,
        text: String,
        word_count: usize,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let doc = documents.get_mut(&id).ok_or(StoreError::NotFound)?;
        doc.status = DocumentStatus::Completed;
        doc.text = Some(text);
        doc.word_count = Some(word_count);
        doc.error = None;
        Ok(())
    }

    async fn fail_processing(&self, id: Uuid, reason: String) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let doc = documents.get_mut(&id).ok_or(StoreError::NotFound)?;
        doc.status = DocumentStatus::Failed;
        doc.text = None;
        doc.word_count = None;
        doc.error = Some(reason);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<Document, StoreError> {
        self.documents
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }
}
