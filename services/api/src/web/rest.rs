//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use studium_core::domain::{
    ActivityType, Document, DocumentStatus, GenerationRequest, Language, MediaType,
};
use studium_core::ports::{DocumentStore, GenerationError, StoreError};

use crate::study_plan::{StudyPlan, StudyPlanError, StudyPlanSummary};
use crate::web::extract_task::spawn_extraction;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_handler,
        process_handler,
        status_handler,
        generate_handler,
        health_handler,
        ai_status_handler,
    ),
    components(
        schemas(
            UploadResponse,
            ProcessingResponse,
            GenerateContentBody,
            ActivityResponse,
            ErrorBody,
            ProviderErrorEntry,
            AiStatusResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Document Processing", description = "Upload and process PDF/image files and extract text for educational content generation."),
        (name = "AI Content Generation", description = "Generate educational content: flashcards, multiple choice, true/false questions and summaries."),
        (name = "System Status", description = "Health checks and AI provider status.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after a successful upload.
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    document_id: Uuid,
    filename: String,
    file_size: usize,
    file_type: String,
    status: String,
}

/// Processing state of a document, including the extracted text once completed.
#[derive(Serialize, ToSchema)]
pub struct ProcessingResponse {
    document_id: Uuid,
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_count: Option<usize>,
}

impl ProcessingResponse {
    fn from_document(doc: &Document) -> Self {
        let message = match doc.status {
            DocumentStatus::Uploaded => "ready for processing".to_string(),
            DocumentStatus::Processing => "extracting text from document".to_string(),
            DocumentStatus::Completed => "document processed successfully".to_string(),
            DocumentStatus::Failed => doc
                .error
                .clone()
                .unwrap_or_else(|| "processing failed".to_string()),
        };
        Self {
            document_id: doc.id,
            status: status_str(doc.status).to_string(),
            message,
            extracted_text: doc.text.clone(),
            word_count: doc.word_count,
        }
    }
}

/// Body of the generation endpoints.
#[derive(Deserialize, ToSchema)]
pub struct GenerateContentBody {
    /// Source text the content is generated from.
    text: String,
    /// Required on the generic endpoint; ignored on the typed shortcuts.
    activity_type: Option<String>,
    #[serde(default = "default_count")]
    count: usize,
    /// "es" (default) or "en".
    language: Option<String>,
    difficulty: Option<String>,
    topic: Option<String>,
}

fn default_count() -> usize {
    5
}

/// A successful generation result.
#[derive(Serialize, ToSchema)]
pub struct ActivityResponse {
    activity_type: String,
    count: usize,
    /// Item schema depends on `activity_type`.
    #[schema(value_type = Object)]
    activities: serde_json::Value,
    processing_time: f64,
    provider: String,
    used_fallback: bool,
    language: String,
}

/// Structured error payload `{code, message, provider_errors}`.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_errors: Option<Vec<ProviderErrorEntry>>,
}

#[derive(Serialize, ToSchema)]
pub struct ProviderErrorEntry {
    provider: String,
    error: String,
}

#[derive(Serialize, ToSchema)]
pub struct AiStatusResponse {
    claude_available: bool,
    openai_available: bool,
    primary_service: String,
    service_priority: Vec<String>,
    default_language: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
    timestamp: String,
}

#[derive(Serialize)]
pub struct DocumentSummary {
    document_id: Uuid,
    filename: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_count: Option<usize>,
    uploaded_at: String,
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    documents: Vec<DocumentSummary>,
    total_count: usize,
}

#[derive(Serialize)]
pub struct DocumentTextResponse {
    document_id: Uuid,
    extracted_text: String,
    word_count: usize,
}

#[derive(Deserialize)]
pub struct StudyPlanBody {
    file_id: Uuid,
    subject_name: String,
    exam_date: String,
    language: Option<String>,
}

#[derive(Serialize)]
pub struct StudyPlanListResponse {
    study_plans: Vec<StudyPlanSummary>,
    total_count: usize,
}

//=========================================================================================
// Helpers
//=========================================================================================

type HandlerError = (StatusCode, Json<ErrorBody>);

fn err(status: StatusCode, code: &str, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            code: code.to_string(),
            message: message.into(),
            provider_errors: None,
        }),
    )
}

fn status_str(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Uploaded => "uploaded",
        DocumentStatus::Processing => "processing",
        DocumentStatus::Completed => "completed",
        DocumentStatus::Failed => "failed",
    }
}

fn parse_activity_type(raw: &str) -> Option<ActivityType> {
    match raw {
        "flashcard" | "flashcards" => Some(ActivityType::Flashcard),
        "multiple_choice" | "multiple-choice" => Some(ActivityType::MultipleChoice),
        "true_false" | "true-false" => Some(ActivityType::TrueFalse),
        "summary" => Some(ActivityType::Summary),
        "mixed" => Some(ActivityType::Mixed),
        _ => None,
    }
}

fn parse_language(raw: Option<&str>, default: Language) -> Result<Language, HandlerError> {
    match raw {
        None => Ok(default),
        Some(s) => s.parse::<Language>().map_err(|e| {
            err(StatusCode::BAD_REQUEST, "invalid_language", e)
        }),
    }
}

fn generation_error_response(error: GenerationError) -> HandlerError {
    match error {
        GenerationError::NoProvidersConfigured => err(
            StatusCode::SERVICE_UNAVAILABLE,
            "no_providers_configured",
            "No AI provider is configured; set ANTHROPIC_API_KEY or OPENAI_API_KEY",
        ),
        GenerationError::AllProvidersExhausted(attempts) => {
            let provider_errors = attempts
                .iter()
                .map(|attempt| ProviderErrorEntry {
                    provider: attempt.provider.as_str().to_string(),
                    error: attempt.error.to_string(),
                })
                .collect();
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    code: "all_providers_exhausted".to_string(),
                    message: "All AI providers failed".to_string(),
                    provider_errors: Some(provider_errors),
                }),
            )
        }
    }
}

//=========================================================================================
// Document Processing Handlers
//=========================================================================================

/// Upload a study document (PDF or image).
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    tag = "Document Processing",
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 201, description = "Document registered", body = UploadResponse),
        (status = 400, description = "Missing or unreadable file part", body = ErrorBody),
        (status = 413, description = "File exceeds the configured size limit", body = ErrorBody),
        (status = 415, description = "Unsupported media type", body = ErrorBody)
    )
)]
pub async fn upload_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let mut upload: Option<(String, bytes::Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        err(
            StatusCode::BAD_REQUEST,
            "invalid_multipart",
            format!("failed to read multipart data: {e}"),
        )
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(|e| {
            err(
                StatusCode::BAD_REQUEST,
                "invalid_multipart",
                format!("failed to read file bytes: {e}"),
            )
        })?;
        upload = Some((file_name, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(err(
            StatusCode::BAD_REQUEST,
            "missing_file",
            "multipart form must include a file",
        ));
    };

    if data.len() > app_state.config.max_file_size {
        return Err(err(
            StatusCode::PAYLOAD_TOO_LARGE,
            "file_too_large",
            format!(
                "file size {} exceeds the maximum of {} bytes",
                data.len(),
                app_state.config.max_file_size
            ),
        ));
    }

    let Some(media_type) = MediaType::from_filename(&filename) else {
        return Err(err(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            "only .pdf, .png, .jpg and .jpeg files are supported",
        ));
    };

    let doc = Document::new(Uuid::new_v4(), filename.clone(), media_type, Utc::now());
    let path = app_state.stored_file_path(&doc);

    let save = async {
        tokio::fs::create_dir_all(&app_state.config.upload_directory).await?;
        tokio::fs::write(&path, &data).await
    }
    .await;
    if let Err(e) = save {
        error!(document_id = %doc.id, "failed to persist upload: {e}");
        return Err(err(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_failure",
            "failed to store the uploaded file",
        ));
    }

    tracing::info!(document_id = %doc.id, filename = %filename, size = data.len(), "file uploaded");

    let response = UploadResponse {
        document_id: doc.id,
        filename,
        file_size: data.len(),
        file_type: match media_type {
            MediaType::Pdf => "pdf".to_string(),
            MediaType::Image => "image".to_string(),
        },
        status: status_str(doc.status).to_string(),
    };
    app_state.store.put(doc).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Trigger background extraction for an uploaded document.
#[utoipa::path(
    post,
    path = "/api/v1/process/{document_id}",
    tag = "Document Processing",
    params(("document_id" = Uuid, Path, description = "The document to process.")),
    responses(
        (status = 202, description = "Extraction started", body = ProcessingResponse),
        (status = 404, description = "Unknown document", body = ErrorBody),
        (status = 409, description = "Extraction already in flight", body = ErrorBody)
    )
)]
pub async fn process_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let doc = app_state
        .store
        .begin_processing(document_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => err(StatusCode::NOT_FOUND, "not_found", "document not found"),
            StoreError::AlreadyProcessing => err(
                StatusCode::CONFLICT,
                "already_processing",
                "an extraction attempt is already in flight for this document",
            ),
        })?;

    let response = ProcessingResponse::from_document(&doc);
    spawn_extraction(app_state, doc);

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Poll the processing status of a document.
#[utoipa::path(
    get,
    path = "/api/v1/process/{document_id}/status",
    tag = "Document Processing",
    params(("document_id" = Uuid, Path, description = "The document to inspect.")),
    responses(
        (status = 200, description = "Current status", body = ProcessingResponse),
        (status = 404, description = "Unknown document", body = ErrorBody)
    )
)]
pub async fn status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<ProcessingResponse>, HandlerError> {
    let doc = app_state
        .store
        .get(document_id)
        .await
        .map_err(|_| err(StatusCode::NOT_FOUND, "not_found", "document not found"))?;
    Ok(Json(ProcessingResponse::from_document(&doc)))
}

/// List all registered documents.
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<DocumentListResponse> {
    let documents: Vec<DocumentSummary> = app_state
        .store
        .list()
        .await
        .iter()
        .map(|doc| DocumentSummary {
            document_id: doc.id,
            filename: doc.filename.clone(),
            status: status_str(doc.status).to_string(),
            word_count: doc.word_count,
            uploaded_at: doc.uploaded_at.to_rfc3339(),
        })
        .collect();
    let total_count = documents.len();
    Json(DocumentListResponse {
        documents,
        total_count,
    })
}

/// Fetch the extracted text of a completed document.
pub async fn document_text_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentTextResponse>, HandlerError> {
    let doc = app_state
        .store
        .get(document_id)
        .await
        .map_err(|_| err(StatusCode::NOT_FOUND, "not_found", "document not found"))?;

    match (doc.status, doc.text) {
        (DocumentStatus::Completed, Some(text)) => Ok(Json(DocumentTextResponse {
            document_id,
            word_count: doc.word_count.unwrap_or_else(|| text.split_whitespace().count()),
            extracted_text: text,
        })),
        _ => Err(err(
            StatusCode::BAD_REQUEST,
            "not_completed",
            "document processing is not completed",
        )),
    }
}

/// Delete a document, cancelling any in-flight extraction.
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    app_state.processing.cancel(document_id);

    let doc = app_state
        .store
        .delete(document_id)
        .await
        .map_err(|_| err(StatusCode::NOT_FOUND, "not_found", "document not found"))?;

    let path = app_state.stored_file_path(&doc);
    let file_cleanup = tokio::fs::remove_file(&path).await.is_ok();

    Ok(Json(serde_json::json!({
        "message": format!("Document {document_id} deleted successfully"),
        "file_cleanup": file_cleanup,
    })))
}

//=========================================================================================
// AI Content Generation Handlers
//=========================================================================================

/// Number of overlapping chunks a prompt may carry before the tail is dropped.
const MAX_PROMPT_CHUNKS: usize = 8;

/// Keep prompts inside provider input limits: long source texts are chunked
/// with the configured size/overlap and only the leading window is kept.
fn bound_source_text(text: String, chunk_size: usize, overlap: usize) -> String {
    match studium_core::chunk(&text, chunk_size, overlap) {
        Ok(chunks) if chunks.len() > MAX_PROMPT_CHUNKS => {
            let mut bounded = String::new();
            for chunk in &chunks[..MAX_PROMPT_CHUNKS] {
                if chunk.index == 0 {
                    bounded.push_str(&chunk.content);
                } else {
                    bounded.extend(chunk.content.chars().skip(overlap));
                }
            }
            tracing::debug!(
                original_chars = text.chars().count(),
                bounded_chars = bounded.chars().count(),
                "source text truncated for prompt construction"
            );
            bounded
        }
        _ => text,
    }
}

async fn run_generation(
    app_state: Arc<AppState>,
    activity_type: ActivityType,
    body: GenerateContentBody,
) -> Result<Json<ActivityResponse>, HandlerError> {
    if body.text.trim().is_empty() {
        return Err(err(
            StatusCode::BAD_REQUEST,
            "empty_text",
            "text must not be empty",
        ));
    }
    let language = parse_language(body.language.as_deref(), app_state.config.default_language)?;

    let request = GenerationRequest {
        text: bound_source_text(
            body.text,
            app_state.config.chunk_size,
            app_state.config.chunk_overlap,
        ),
        activity_type,
        count: body.count,
        language,
        difficulty: body.difficulty,
        topic: body.topic,
    };

    let started = Instant::now();
    let content = app_state
        .generator
        .generate(&request)
        .await
        .map_err(generation_error_response)?;

    let activities = serde_json::to_value(&content.items).map_err(|e| {
        error!("failed to serialize generated items: {e}");
        err(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "failed to serialize generated content",
        )
    })?;

    Ok(Json(ActivityResponse {
        activity_type: content.activity_type.as_str().to_string(),
        count: content.items.len(),
        activities,
        processing_time: started.elapsed().as_secs_f64(),
        provider: content.provider.as_str().to_string(),
        used_fallback: content.used_fallback,
        language: content.language.as_str().to_string(),
    }))
}

/// Generate study content of the type named in the request body.
#[utoipa::path(
    post,
    path = "/api/v1/generate",
    tag = "AI Content Generation",
    request_body = GenerateContentBody,
    responses(
        (status = 200, description = "Generated content", body = ActivityResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 502, description = "All providers exhausted", body = ErrorBody),
        (status = 503, description = "No provider configured", body = ErrorBody)
    )
)]
pub async fn generate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<ActivityResponse>, HandlerError> {
    let Some(raw) = body.activity_type.as_deref() else {
        return Err(err(
            StatusCode::BAD_REQUEST,
            "missing_activity_type",
            "activity_type is required",
        ));
    };
    let Some(activity_type) = parse_activity_type(raw) else {
        return Err(err(
            StatusCode::BAD_REQUEST,
            "invalid_activity_type",
            format!("'{raw}' is not a supported activity type"),
        ));
    };
    run_generation(app_state, activity_type, body).await
}

pub async fn generate_flashcards_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<ActivityResponse>, HandlerError> {
    run_generation(app_state, ActivityType::Flashcard, body).await
}

pub async fn generate_multiple_choice_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<ActivityResponse>, HandlerError> {
    run_generation(app_state, ActivityType::MultipleChoice, body).await
}

pub async fn generate_true_false_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<ActivityResponse>, HandlerError> {
    run_generation(app_state, ActivityType::TrueFalse, body).await
}

pub async fn generate_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<ActivityResponse>, HandlerError> {
    run_generation(app_state, ActivityType::Summary, body).await
}

pub async fn generate_mixed_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<ActivityResponse>, HandlerError> {
    run_generation(app_state, ActivityType::Mixed, body).await
}

//=========================================================================================
// Study Plan Handlers
//=========================================================================================

/// Generate a study plan from a processed document and an exam date.
pub async fn generate_study_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<StudyPlanBody>,
) -> Result<Json<StudyPlan>, HandlerError> {
    let doc = app_state
        .store
        .get(body.file_id)
        .await
        .map_err(|_| err(StatusCode::NOT_FOUND, "not_found", "document not found"))?;

    let text = match (doc.status, doc.text) {
        (DocumentStatus::Completed, Some(text)) if !text.is_empty() => text,
        (DocumentStatus::Completed, _) => {
            return Err(err(
                StatusCode::BAD_REQUEST,
                "empty_document",
                "no text was extracted from the document",
            ))
        }
        (status, _) => {
            return Err(err(
                StatusCode::BAD_REQUEST,
                "not_completed",
                format!(
                    "document processing is not completed (current status: {})",
                    status_str(status)
                ),
            ))
        }
    };

    let language = parse_language(body.language.as_deref(), app_state.config.default_language)?;

    let plan = app_state
        .study_plans
        .generate_study_plan(
            &app_state.generator,
            &text,
            &body.subject_name,
            &body.exam_date,
            language,
        )
        .await
        .map_err(|e| match e {
            StudyPlanError::InvalidExamDate(_) => {
                err(StatusCode::BAD_REQUEST, "invalid_exam_date", e.to_string())
            }
            StudyPlanError::NotFound => err(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        })?;

    Ok(Json(plan))
}

pub async fn get_study_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<Json<StudyPlan>, HandlerError> {
    app_state
        .study_plans
        .get(&plan_id)
        .await
        .map(Json)
        .map_err(|_| err(StatusCode::NOT_FOUND, "not_found", "study plan not found"))
}

pub async fn list_study_plans_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<StudyPlanListResponse> {
    let study_plans = app_state.study_plans.list().await;
    let total_count = study_plans.len();
    Json(StudyPlanListResponse {
        study_plans,
        total_count,
    })
}

pub async fn delete_study_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    app_state
        .study_plans
        .delete(&plan_id)
        .await
        .map_err(|_| err(StatusCode::NOT_FOUND, "not_found", "study plan not found"))?;
    Ok(Json(serde_json::json!({
        "message": format!("Study plan {plan_id} deleted successfully"),
    })))
}

//=========================================================================================
// System Status Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System Status",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "studium-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Which providers hold valid credentials and which one is primary.
#[utoipa::path(
    get,
    path = "/api/v1/ai-status",
    tag = "System Status",
    responses((status = 200, description = "Provider availability", body = AiStatusResponse))
)]
pub async fn ai_status_handler(State(app_state): State<Arc<AppState>>) -> Json<AiStatusResponse> {
    let config = &app_state.config;
    Json(AiStatusResponse {
        claude_available: config.claude.is_available(),
        openai_available: config.openai.is_available(),
        primary_service: config.primary_ai_service.as_str().to_string(),
        service_priority: app_state
            .generator
            .service_priority()
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect(),
        default_language: config.default_language.as_str().to_string(),
    })
}
