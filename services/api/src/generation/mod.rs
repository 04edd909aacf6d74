//! services/api/src/generation/mod.rs
//!
//! The unified generation service: provider selection, prompt templating per
//! content type, output parsing/validation, and failover between providers.
//!
//! Providers are tried strictly in order, one attempt each, never raced.
//! A parse/validation failure counts the same as a transport failure: the
//! contract with callers is "structurally valid result or explicit
//! exhaustion", never a partially valid one.

pub mod parse;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use studium_core::domain::{ActivityType, GeneratedContent, GenerationRequest, ProviderKind};
use studium_core::ports::{
    GenerationError, InvokeParams, LlmProvider, ProviderAttempt, ProviderError,
};

/// Mixed batches produce several activity kinds in one response and need
/// more completion tokens than single-type requests.
const MIXED_MAX_TOKENS: u32 = 3000;

/// One configured provider: the adapter plus its invocation parameters.
pub struct ProviderEntry {
    pub provider: Arc<dyn LlmProvider>,
    pub params: InvokeParams,
}

/// Upper bounds applied to requested item counts.
#[derive(Debug, Clone, Copy)]
pub struct GenerationLimits {
    pub max_flashcards: usize,
    pub max_trivia_questions: usize,
}

//=========================================================================================
// The Service
//=========================================================================================

/// Orchestrates generation across an ordered list of LLM providers.
pub struct UnifiedGenerator {
    entries: Vec<ProviderEntry>,
    call_timeout: Duration,
    limits: GenerationLimits,
}

impl UnifiedGenerator {
    pub fn new(entries: Vec<ProviderEntry>, call_timeout: Duration, limits: GenerationLimits) -> Self {
        Self {
            entries,
            call_timeout,
            limits,
        }
    }

    /// The configured provider order, primary first.
    pub fn service_priority(&self) -> Vec<ProviderKind> {
        self.entries.iter().map(|e| e.provider.kind()).collect()
    }

    /// Clamp a requested item count to the configured bound for its type.
    pub fn clamp_count(&self, activity_type: ActivityType, count: usize) -> usize {
        let limit = match activity_type {
            ActivityType::Flashcard => self.limits.max_flashcards,
            ActivityType::MultipleChoice | ActivityType::TrueFalse => {
                self.limits.max_trivia_questions
            }
            // Summary yields one item; mixed batches have a fixed shape.
            ActivityType::Summary | ActivityType::Mixed => return count.max(1),
        };
        count.clamp(1, limit.max(1))
    }

    /// Run one generation request through the failover chain.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GenerationError> {
        if self.entries.is_empty() {
            return Err(GenerationError::NoProvidersConfigured);
        }

        let count = self.clamp_count(request.activity_type, request.count);
        let prompt = prompts::build_prompt(request, count);

        let mut attempts = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let kind = entry.provider.kind();
            tracing::info!(
                provider = %kind,
                activity_type = request.activity_type.as_str(),
                count,
                "attempting content generation"
            );

            let params = self.params_for(entry, request.activity_type);
            let outcome = match tokio::time::timeout(
                self.call_timeout,
                entry.provider.invoke(&prompt, &params),
            )
            .await
            {
                Err(_) => Err(ProviderError::Timeout(self.call_timeout.as_secs())),
                Ok(Err(e)) => Err(e),
                Ok(Ok(raw)) => parse::parse_items(&raw, request.activity_type, count),
            };

            match outcome {
                Ok(items) => {
                    tracing::info!(
                        provider = %kind,
                        items = items.len(),
                        used_fallback = index > 0,
                        "content generation succeeded"
                    );
                    return Ok(GeneratedContent {
                        activity_type: request.activity_type,
                        language: request.language,
                        items,
                        provider: kind,
                        used_fallback: index > 0,
                    });
                }
                Err(error) => {
                    tracing::warn!(provider = %kind, %error, "provider attempt failed");
                    attempts.push(ProviderAttempt {
                        provider: kind,
                        error,
                    });
                }
            }
        }

        Err(GenerationError::AllProvidersExhausted(attempts))
    }

    /// Failover invocation for callers that parse their own wire format
    /// (e.g. study plans). Returns the raw output, the producing provider,
    /// and whether the fallback path was taken.
    pub async fn invoke_raw(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<(String, ProviderKind, bool), GenerationError> {
        if self.entries.is_empty() {
            return Err(GenerationError::NoProvidersConfigured);
        }

        let mut attempts = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let kind = entry.provider.kind();
            let params = InvokeParams {
                max_tokens,
                temperature: entry.params.temperature,
            };
            let outcome = match tokio::time::timeout(
                self.call_timeout,
                entry.provider.invoke(prompt, &params),
            )
            .await
            {
                Err(_) => Err(ProviderError::Timeout(self.call_timeout.as_secs())),
                Ok(result) => result,
            };

            match outcome {
                Ok(raw) => return Ok((raw, kind, index > 0)),
                Err(error) => {
                    tracing::warn!(provider = %kind, %error, "raw provider attempt failed");
                    attempts.push(ProviderAttempt {
                        provider: kind,
                        error,
                    });
                }
            }
        }

        Err(GenerationError::AllProvidersExhausted(attempts))
    }

    fn params_for(&self, entry: &ProviderEntry, activity_type: ActivityType) -> InvokeParams {
        let mut params = entry.params.clone();
        if activity_type == ActivityType::Mixed {
            params.max_tokens = params.max_tokens.max(MIXED_MAX_TOKENS);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use studium_core::domain::{GeneratedItems, Language};

    enum Behavior {
        Succeed(&'static str),
        FailTransport,
        Sleep(Duration),
    }

    struct ScriptedProvider {
        kind: ProviderKind,
        behavior: Behavior,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn invoke(
            &self,
            _prompt: &str,
            _params: &InvokeParams,
        ) -> Result<String, ProviderError> {
            match &self.behavior {
                Behavior::Succeed(raw) => Ok(raw.to_string()),
                Behavior::FailTransport => {
                    Err(ProviderError::Transport("connection refused".into()))
                }
                Behavior::Sleep(duration) => {
                    tokio::time::sleep(*duration).await;
                    Ok("{}".to_string())
                }
            }
        }
    }

    const VALID_FLASHCARDS: &str = r#"{
        "tarjetas": [
            {"pregunta": "¿Qué es el ADN?", "respuesta": "El material genético.", "dificultad": "medio"},
            {"pregunta": "¿Dónde está el ADN?", "respuesta": "En el núcleo.", "dificultad": "fácil"},
            {"pregunta": "¿Qué forma tiene?", "respuesta": "Doble hélice.", "dificultad": "medio"}
        ]
    }"#;

    fn generator(providers: Vec<(ProviderKind, Behavior)>) -> UnifiedGenerator {
        let entries = providers
            .into_iter()
            .map(|(kind, behavior)| ProviderEntry {
                provider: Arc::new(ScriptedProvider { kind, behavior }),
                params: InvokeParams {
                    max_tokens: 1000,
                    temperature: 0.7,
                },
            })
            .collect();
        UnifiedGenerator::new(
            entries,
            Duration::from_millis(200),
            GenerationLimits {
                max_flashcards: 10,
                max_trivia_questions: 10,
            },
        )
    }

    fn flashcard_request(count: usize) -> GenerationRequest {
        GenerationRequest {
            text: "El ADN almacena la información genética.".into(),
            activity_type: ActivityType::Flashcard,
            count,
            language: Language::Es,
            difficulty: None,
            topic: None,
        }
    }

    #[tokio::test]
    async fn primary_success_does_not_use_fallback() {
        let generator = generator(vec![
            (ProviderKind::Claude, Behavior::Succeed(VALID_FLASHCARDS)),
            (ProviderKind::OpenAi, Behavior::FailTransport),
        ]);
        let result = generator.generate(&flashcard_request(3)).await.unwrap();
        assert_eq!(result.provider, ProviderKind::Claude);
        assert!(!result.used_fallback);
        assert_eq!(result.items.len(), 3);
    }

    #[tokio::test]
    async fn failing_primary_falls_over_to_secondary() {
        let generator = generator(vec![
            (ProviderKind::Claude, Behavior::FailTransport),
            (ProviderKind::OpenAi, Behavior::Succeed(VALID_FLASHCARDS)),
        ]);
        let result = generator.generate(&flashcard_request(3)).await.unwrap();
        assert_eq!(result.provider, ProviderKind::OpenAi);
        assert!(result.used_fallback);
    }

    #[tokio::test]
    async fn exhaustion_records_every_attempt() {
        let generator = generator(vec![
            (ProviderKind::Claude, Behavior::FailTransport),
            (ProviderKind::OpenAi, Behavior::FailTransport),
        ]);
        let err = generator.generate(&flashcard_request(3)).await.unwrap_err();
        let GenerationError::AllProvidersExhausted(attempts) = err else {
            panic!("expected exhaustion")
        };
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].provider, ProviderKind::Claude);
        assert_eq!(attempts[1].provider, ProviderKind::OpenAi);
    }

    #[tokio::test]
    async fn malformed_response_triggers_failover_not_a_crash() {
        let generator = generator(vec![
            (
                ProviderKind::Claude,
                // Missing respuesta_correcta on a multiple choice item.
                Behavior::Succeed(r#"{"preguntas": [{"pregunta": "¿2+2?", "opciones": ["3","4"]}]}"#),
            ),
            (
                ProviderKind::OpenAi,
                Behavior::Succeed(
                    r#"{"preguntas": [{"pregunta": "¿2+2?", "opciones": ["3","4"], "respuesta_correcta": 1}]}"#,
                ),
            ),
        ]);
        let request = GenerationRequest {
            activity_type: ActivityType::MultipleChoice,
            ..flashcard_request(1)
        };
        let result = generator.generate(&request).await.unwrap();
        assert!(result.used_fallback);
        let GeneratedItems::MultipleChoice(questions) = result.items else {
            panic!("wrong variant")
        };
        assert_eq!(questions[0].correct_answer, 1);
    }

    #[tokio::test]
    async fn slow_provider_is_recorded_as_timeout() {
        let generator = generator(vec![(
            ProviderKind::Claude,
            Behavior::Sleep(Duration::from_secs(5)),
        )]);
        let err = generator.generate(&flashcard_request(3)).await.unwrap_err();
        let GenerationError::AllProvidersExhausted(attempts) = err else {
            panic!("expected exhaustion")
        };
        assert!(matches!(attempts[0].error, ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn over_delivery_is_truncated_and_under_delivery_accepted() {
        let generator = generator(vec![(
            ProviderKind::Claude,
            Behavior::Succeed(VALID_FLASHCARDS),
        )]);

        // Provider returns 3 cards; asking for 2 truncates.
        let result = generator.generate(&flashcard_request(2)).await.unwrap();
        assert_eq!(result.items.len(), 2);

        // Asking for 10 accepts the 3 delivered as a valid non-error result.
        let result = generator.generate(&flashcard_request(10)).await.unwrap();
        assert_eq!(result.items.len(), 3);
    }

    #[tokio::test]
    async fn requested_count_is_clamped_to_configured_maximum() {
        let generator = generator(vec![(
            ProviderKind::Claude,
            Behavior::Succeed(VALID_FLASHCARDS),
        )]);
        assert_eq!(generator.clamp_count(ActivityType::Flashcard, 50), 10);
        assert_eq!(generator.clamp_count(ActivityType::Flashcard, 0), 1);
        assert_eq!(generator.clamp_count(ActivityType::TrueFalse, 7), 7);
    }

    #[tokio::test]
    async fn no_providers_is_its_own_error() {
        let generator = generator(vec![]);
        let err = generator.generate(&flashcard_request(3)).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoProvidersConfigured));
    }

    #[tokio::test]
    async fn invoke_raw_fails_over_and_reports_provider() {
        let generator = generator(vec![
            (ProviderKind::Claude, Behavior::FailTransport),
            (ProviderKind::OpenAi, Behavior::Succeed("{\"plan\": []}")),
        ]);
        let (raw, provider, used_fallback) = generator.invoke_raw("plan prompt", 4000).await.unwrap();
        assert_eq!(raw, "{\"plan\": []}");
        assert_eq!(provider, ProviderKind::OpenAi);
        assert!(used_fallback);
    }
}
