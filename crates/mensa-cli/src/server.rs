// HTTP surface: GET /api/mensa
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mensa_core::{MealRecord, MealService};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MealService>,
}

/// Body of a failed request
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    details: String,
}

/// Any failure to produce the meal plan; always answered with a 500
pub struct ApiError(mensa_core::Error);

impl From<mensa_core::Error> for ApiError {
    fn from(err: mensa_core::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Failed to load meal plan: {}", self.0);
        let body = ErrorBody {
            error: "Failed to load the meal plan".to_string(),
            details: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(service: Arc<MealService>) -> Router {
    Router::new()
        .route("/api/mensa", get(get_meals))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

async fn get_meals(State(state): State<AppState>) -> Result<Json<Arc<Vec<MealRecord>>>, ApiError> {
    info!("Meal plan requested");
    let meals = state.service.meals().await?;
    Ok(Json(meals))
}

pub async fn serve(service: Arc<MealService>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}
