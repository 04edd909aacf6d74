//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{ClaudeAdapter, InMemoryDocumentStore, OpenAiAdapter},
    config::Config,
    error::ApiError,
    extraction::{DocumentExtractor, EmbeddedImageRenderer, PdfTextExtractor},
    generation::{GenerationLimits, ProviderEntry, UnifiedGenerator},
    study_plan::StudyPlanService,
    web::{
        ai_status_handler, delete_document_handler, delete_study_plan_handler,
        document_text_handler, generate_flashcards_handler, generate_handler,
        generate_mixed_handler, generate_multiple_choice_handler, generate_study_plan_handler,
        generate_summary_handler, generate_true_false_handler, get_study_plan_handler,
        health_handler, list_documents_handler, list_study_plans_handler, process_handler,
        rest::ApiDoc,
        state::{AppState, ProcessingRegistry},
        status_handler, upload_handler,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use studium_core::domain::ProviderKind;
use studium_core::ports::{InvokeParams, OcrEngine};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Provider Adapters (primary first, per configuration) ---
    let mut entries = Vec::new();
    for kind in config.service_priority() {
        match kind {
            ProviderKind::Claude => {
                if let Some(key) = &config.claude.api_key {
                    entries.push(ProviderEntry {
                        provider: Arc::new(ClaudeAdapter::new(
                            &config.anthropic_base_url,
                            key.clone(),
                            config.claude.model.clone(),
                        )),
                        params: InvokeParams {
                            max_tokens: config.claude.max_tokens,
                            temperature: config.claude.temperature,
                        },
                    });
                    info!("Claude provider initialized");
                }
            }
            ProviderKind::OpenAi => {
                if let Some(key) = &config.openai.api_key {
                    let openai_client =
                        Client::with_config(OpenAIConfig::new().with_api_key(key.clone()));
                    entries.push(ProviderEntry {
                        provider: Arc::new(OpenAiAdapter::new(
                            openai_client,
                            config.openai.model.clone(),
                        )),
                        params: InvokeParams {
                            max_tokens: config.openai.max_tokens,
                            temperature: config.openai.temperature,
                        },
                    });
                    info!("OpenAI provider initialized");
                }
            }
        }
    }
    if entries.is_empty() {
        warn!("No AI provider configured; generation endpoints will return 503");
    }

    let generator = Arc::new(UnifiedGenerator::new(
        entries,
        config.max_processing_time,
        GenerationLimits {
            max_flashcards: config.max_flashcards,
            max_trivia_questions: config.max_trivia_questions,
        },
    ));

    // --- 3. Initialize the Extraction Pipeline ---
    #[cfg(feature = "ocr")]
    let ocr: Box<dyn OcrEngine> = Box::new(api_lib::adapters::TesseractOcr::new("spa+eng"));
    #[cfg(not(feature = "ocr"))]
    let ocr: Box<dyn OcrEngine> = Box::new(api_lib::adapters::DisabledOcr);

    let extractor = Arc::new(
        DocumentExtractor::new(Box::new(PdfTextExtractor), ocr)
            .with_renderer(Box::new(EmbeddedImageRenderer)),
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store: Arc::new(InMemoryDocumentStore::new()),
        generator,
        extractor,
        study_plans: Arc::new(StudyPlanService::new()),
        processing: Arc::new(ProcessingRegistry::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/upload", post(upload_handler))
        .route("/process/{document_id}", post(process_handler))
        .route("/process/{document_id}/status", get(status_handler))
        .route("/documents", get(list_documents_handler))
        .route("/documents/{document_id}/text", get(document_text_handler))
        .route("/documents/{document_id}", delete(delete_document_handler))
        .route("/generate", post(generate_handler))
        .route("/generate/flashcards", post(generate_flashcards_handler))
        .route("/generate/multiple-choice", post(generate_multiple_choice_handler))
        .route("/generate/true-false", post(generate_true_false_handler))
        .route("/generate/summary", post(generate_summary_handler))
        .route("/generate/mixed", post(generate_mixed_handler))
        .route("/ai-status", get(ai_status_handler))
        .route("/student/learn/plan/generate", post(generate_study_plan_handler))
        .route(
            "/student/learn/plan/{plan_id}",
            get(get_study_plan_handler).delete(delete_study_plan_handler),
        )
        .route("/student/learn/plans", get(list_study_plans_handler));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_file_size + 1024 * 1024))
        .layer(cors)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
