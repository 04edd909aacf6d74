//! services/api/src/web/extract_task.rs
//!
//! The background extraction worker. `POST /process/{id}` hands a document to
//! this task and returns immediately; the task's only externally visible
//! effect is the terminal status it writes to the document store.

use std::sync::Arc;

use studium_core::domain::Document;
use studium_core::ports::{DocumentStore, ExtractionError};

use crate::extraction::ExtractedText;
use crate::web::state::AppState;

/// Spawn the extraction task for a document already gated into `Processing`.
pub fn spawn_extraction(state: Arc<AppState>, doc: Document) {
    let token = state.processing.register(doc.id);

    tokio::spawn(async move {
        let document_id = doc.id;

        tokio::select! {
            _ = token.cancelled() => {
                // Deletion won the race; the document entry is already gone,
                // so there is no status left to write.
                tracing::info!(document_id = %document_id, "extraction cancelled");
            }
            outcome = run_extraction(&state, &doc) => {
                match outcome {
                    Ok(extracted) => {
                        tracing::info!(
                            document_id = %document_id,
                            words = extracted.word_count,
                            pages = extracted.page_count,
                            "document processed"
                        );
                        let _ = state
                            .store
                            .complete_processing(document_id, extracted.text, extracted.word_count)
                            .await;
                    }
                    Err(error) => {
                        tracing::error!(document_id = %document_id, %error, "document processing failed");
                        let _ = state.store.fail_processing(document_id, error.to_string()).await;
                    }
                }
            }
        }

        state.processing.clear(document_id);
    });
}

/// Read the uploaded bytes and run the (blocking) extractor off the async
/// runtime, bounded by the configured processing timeout.
async fn run_extraction(
    state: &Arc<AppState>,
    doc: &Document,
) -> Result<ExtractedText, ExtractionError> {
    let path = state.stored_file_path(doc);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ExtractionError::CorruptInput(format!("stored file unreadable: {e}")))?;

    let extractor = state.extractor.clone();
    let media_type = doc.media_type;
    let work = tokio::task::spawn_blocking(move || extractor.extract(&bytes, media_type));

    match tokio::time::timeout(state.config.max_processing_time, work).await {
        Err(_) => Err(ExtractionError::ExtractionFailed(format!(
            "processing exceeded the {}s limit",
            state.config.max_processing_time.as_secs()
        ))),
        Ok(Err(join_error)) => Err(ExtractionError::ExtractionFailed(format!(
            "extraction task aborted: {join_error}"
        ))),
        Ok(Ok(result)) => result,
    }
}
