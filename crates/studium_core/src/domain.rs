//! crates/studium_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any HTTP framework or provider SDK.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared media type of an uploaded study document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Pdf,
    Image,
}

impl MediaType {
    /// Detect the media type from a filename extension.
    /// Returns `None` for anything outside the supported set.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Lifecycle status of a document in the registry.
///
/// Transitions are monotonic: `Uploaded → Processing → {Completed, Failed}`.
/// A terminal state is only left through explicit re-processing, which
/// reverts to `Processing` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A study document uploaded by a user, tracked in the in-process registry.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub filename: String,
    pub media_type: MediaType,
    pub status: DocumentStatus,
    /// Extracted text, set once extraction completes.
    pub text: Option<String>,
    pub word_count: Option<usize>,
    /// Human-readable failure reason, set once extraction fails.
    pub error: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: Uuid, filename: String, media_type: MediaType, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            filename,
            media_type,
            status: DocumentStatus::Uploaded,
            text: None,
            word_count: None,
            error: None,
            uploaded_at,
        }
    }
}

/// Target language for generated study content. Spanish is the product default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "es" => Ok(Self::Es),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Kind of study activity a generation request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Flashcard,
    MultipleChoice,
    TrueFalse,
    Summary,
    Mixed,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flashcard => "flashcard",
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::Summary => "summary",
            Self::Mixed => "mixed",
        }
    }
}

/// The LLM backend that produced a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single generation request. Transient: built per call, never persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    pub activity_type: ActivityType,
    pub count: usize,
    pub language: Language,
    /// Optional difficulty hint woven into the prompt ("fácil", "hard", ...).
    pub difficulty: Option<String>,
    /// Optional topic focus hint woven into the prompt.
    pub topic: Option<String>,
}

/// A question/answer study card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    pub difficulty: String,
}

/// A multiple-choice question with 2 to 4 options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    pub explanation: String,
}

/// A statement the student judges true or false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrueFalseQuestion {
    pub statement: String,
    pub correct_answer: bool,
    pub explanation: String,
}

/// A titled summary with key points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
}

/// One entry of a mixed-activities batch. Serialized with a `type` tag so a
/// single list can carry all three shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MixedActivity {
    Flashcard(Flashcard),
    MultipleChoice(MultipleChoiceQuestion),
    TrueFalse(TrueFalseQuestion),
}

/// The typed payload of a successful generation, one variant per activity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedItems {
    Flashcards(Vec<Flashcard>),
    MultipleChoice(Vec<MultipleChoiceQuestion>),
    TrueFalse(Vec<TrueFalseQuestion>),
    Summaries(Vec<Summary>),
    Mixed(Vec<MixedActivity>),
}

impl GeneratedItems {
    pub fn len(&self) -> usize {
        match self {
            Self::Flashcards(v) => v.len(),
            Self::MultipleChoice(v) => v.len(),
            Self::TrueFalse(v) => v.len(),
            Self::Summaries(v) => v.len(),
            Self::Mixed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a generation request: the items plus which provider produced
/// them and whether the failover path was taken.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub activity_type: ActivityType,
    pub language: Language,
    pub items: GeneratedItems,
    pub provider: ProviderKind,
    pub used_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_from_filename_supported_extensions() {
        assert_eq!(MediaType::from_filename("apunte.pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_filename("scan.PNG"), Some(MediaType::Image));
        assert_eq!(MediaType::from_filename("foto.jpeg"), Some(MediaType::Image));
        assert_eq!(MediaType::from_filename("foto.jpg"), Some(MediaType::Image));
    }

    #[test]
    fn media_type_from_filename_rejects_unknown() {
        assert_eq!(MediaType::from_filename("notes.docx"), None);
        assert_eq!(MediaType::from_filename("no_extension"), None);
        assert_eq!(MediaType::from_filename(""), None);
    }

    #[test]
    fn terminal_states() {
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
        assert!(!DocumentStatus::Uploaded.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
    }

    #[test]
    fn mixed_activity_serializes_with_type_tag() {
        let activity = MixedActivity::TrueFalse(TrueFalseQuestion {
            statement: "El agua hierve a 100 °C al nivel del mar.".into(),
            correct_answer: true,
            explanation: "A presión atmosférica estándar.".into(),
        });
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "true_false");
        assert_eq!(json["correct_answer"], true);
    }
}
