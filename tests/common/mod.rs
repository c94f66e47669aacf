use axum::Router;

/// App with no database and no provider credentials: storage-backed routes
/// answer 503, provider-backed routes take their fallback paths.
pub async fn create_test_app() -> Router {
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("OPENAI_API_KEY", "");
    std::env::set_var("GEMINI_API_KEY", "");
    std::env::set_var("AI_PROVIDER", "");

    learnsphere_backend_rust::create_app().await
}
