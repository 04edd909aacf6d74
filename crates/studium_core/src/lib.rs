pub mod chunker;
pub mod domain;
pub mod ports;

pub use chunker::{chunk, ChunkError, TextChunk};
pub use domain::{
    ActivityType, Document, DocumentStatus, Flashcard, GeneratedContent, GeneratedItems,
    GenerationRequest, Language, MediaType, MixedActivity, MultipleChoiceQuestion, ProviderKind,
    Summary, TrueFalseQuestion,
};
pub use ports::{
    DocumentStore, ExtractionError, GenerationError, InvokeParams, LlmProvider, OcrEngine,
    ProviderAttempt, ProviderError, StoreError,
};
