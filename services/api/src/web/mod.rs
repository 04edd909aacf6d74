pub mod extract_task;
pub mod rest;
pub mod state;

// Re-export the handlers the binary wires into the router.
pub use rest::{
    ai_status_handler, delete_document_handler, delete_study_plan_handler,
    document_text_handler, generate_flashcards_handler, generate_handler, generate_mixed_handler,
    generate_multiple_choice_handler, generate_study_plan_handler, generate_summary_handler,
    generate_true_false_handler, get_study_plan_handler, health_handler, list_documents_handler,
    list_study_plans_handler, process_handler, status_handler, upload_handler,
};
