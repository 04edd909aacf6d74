pub mod claude;
pub mod ocr;
pub mod openai;
pub mod store;

pub use claude::ClaudeAdapter;
pub use ocr::DisabledOcr;
#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;
pub use openai::OpenAiAdapter;
pub use store::InMemoryDocumentStore;
