use axum::{Router, routing::get, Json, extract::State};
use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        bucket: state.uploads.bucket_name(),
        profile: state.config.aws.profile.to_string(),
    };

    Json(response)
}
