//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-flight processing registry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use studium_core::domain::Document;
use studium_core::ports::DocumentStore;

use crate::config::Config;
use crate::extraction::DocumentExtractor;
use crate::generation::UnifiedGenerator;
use crate::study_plan::StudyPlanService;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub generator: Arc<UnifiedGenerator>,
    pub extractor: Arc<DocumentExtractor>,
    pub study_plans: Arc<StudyPlanService>,
    pub processing: Arc<ProcessingRegistry>,
}

impl AppState {
    /// Where a document's uploaded bytes live on disk.
    pub fn stored_file_path(&self, doc: &Document) -> PathBuf {
        let extension = doc
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        self.config
            .upload_directory
            .join(format!("{}.{}", doc.id, extension))
    }
}

//=========================================================================================
// ProcessingRegistry (Cancellation of In-Flight Extraction)
//=========================================================================================

/// Tracks the cancellation token of each in-flight extraction task, so a
/// document deletion can abandon the work instead of racing it.
#[derive(Default)]
pub struct ProcessingRegistry {
    tokens: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl ProcessingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh token for a document's extraction attempt.
    pub fn register(&self, id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, token.clone());
        token
    }

    /// Cancel the in-flight attempt for a document, if any.
    pub fn cancel(&self, id: Uuid) {
        if let Some(token) = self
            .tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id)
        {
            token.cancel();
        }
    }

    /// Drop the token once the attempt reached a terminal state.
    pub fn clear(&self, id: Uuid) {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
    }
}
