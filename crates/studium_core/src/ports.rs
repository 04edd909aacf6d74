//! crates/studium_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like LLM
//! provider SDKs or OCR backends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Document, ProviderKind};

//=========================================================================================
// Error Taxonomy
//=========================================================================================

/// Failure of a single LLM provider attempt.
///
/// Every variant collapses to "this provider attempt failed" for failover
/// purposes; the distinction is kept for diagnostics only.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider call timed out after {0}s")]
    Timeout(u64),
    #[error("provider rejected credentials: {0}")]
    Auth(String),
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("provider response failed schema validation: {0}")]
    Parse(String),
}

/// One recorded failover attempt: which provider, and why it failed.
#[derive(Debug)]
pub struct ProviderAttempt {
    pub provider: ProviderKind,
    pub error: ProviderError,
}

/// Terminal outcome of the generation path.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no AI provider is configured; set ANTHROPIC_API_KEY or OPENAI_API_KEY")]
    NoProvidersConfigured,
    #[error("all AI providers failed ({} attempted)", .0.len())]
    AllProvidersExhausted(Vec<ProviderAttempt>),
}

/// Failure of a document extraction attempt.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("unsupported or undetectable media type")]
    UnsupportedFormat,
    #[error("file is unreadable or corrupt: {0}")]
    CorruptInput(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Failure of a document-registry operation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("document is already being processed")]
    AlreadyProcessing,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Tuning knobs for a single provider invocation.
#[derive(Debug, Clone)]
pub struct InvokeParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A text-generation LLM provider.
///
/// The two concrete backends are interchangeable behind this single
/// capability interface; the generation service selects them through an
/// explicit ordered list rather than scattered conditionals.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Send one prompt and return the raw model output.
    async fn invoke(&self, prompt: &str, params: &InvokeParams) -> Result<String, ProviderError>;
}

/// An OCR backend converting image bytes to recognized text.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// The in-process document registry.
///
/// Single-writer-per-document: only the extraction path transitions a given
/// document's status, and `begin_processing` serializes concurrent attempts.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, doc: Document);

    async fn get(&self, id: Uuid) -> Result<Document, StoreError>;

    async fn list(&self) -> Vec<Document>;

    /// Atomically transition a document into `Processing`.
    ///
    /// Fails with `AlreadyProcessing` when an extraction attempt is already
    /// in flight; succeeds from `Uploaded` and from terminal states
    /// (explicit re-processing).
    async fn begin_processing(&self, id: Uuid) -> Result<Document, StoreError>;

    /// Record a successful extraction. Exactly one terminal write per attempt.
    async fn complete_processing(
        &self,
        id: Uuid,
        text: String,
        word_count: usize,
    ) -> Result<(), StoreError>;

    /// Record a failed extraction with a human-readable reason.
    async fn fail_processing(&self, id: Uuid, reason: String) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<Document, StoreError>;
}
