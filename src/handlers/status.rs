use crate::AppState;
use axum::{extract::Extension, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let db_status = match &state.db_pool {
        Some(pool) => match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => "healthy",
            Err(_) => "unhealthy",
        },
        None => "not_configured",
    };
    let gemini_status = if state.generation_configured {
        "configured"
    } else {
        "not_configured"
    };
    let models = state.gateway.settings();

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "gemini_ai": gemini_status
        },
        "models": {
            "ideas": models.idea_model,
            "strategy": models.strategy_model,
            "image": models.image_model
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_status_reports_services() {
        let state = test_state();
        let Json(status) = api_status(Extension(state.app.clone())).await;
        assert_eq!(status["status"], "operational");
        assert_eq!(status["services"]["database"], "not_configured");
        assert_eq!(status["services"]["gemini_ai"], "configured");
        assert_eq!(status["models"]["image"], "gemini-2.5-flash-image");
    }
}
