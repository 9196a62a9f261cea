use crate::app::{LoadSummary, SalesRefundApp};
use crate::error::MatcherError;
use crate::models::{MatchedPairView, TransactionView};
use crate::stats::Stats;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

const HEALTH_MESSAGE: &str = "Sales/refund matcher API is running";

/// Successful JSON envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            count: None,
        })
    }

    fn counted(data: T, count: usize) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            count: Some(count),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
    pub uptime: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadCsvRequest {
    #[serde(rename = "csvFilePath")]
    pub csv_file_path: Option<String>,
}

/// Error envelope: `{success: false, error}` with a 400 or 500 status
#[derive(Debug)]
pub struct ApiError(MatcherError);

impl From<MatcherError> for ApiError {
    fn from(e: MatcherError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

pub fn router(app: Arc<SalesRefundApp>) -> Router {
    Router::new()
        .route("/api/sales-refunds", get(sales_refunds))
        .route("/api/unmatched", get(unmatched))
        .route("/api/stats", get(stats))
        .route("/api/load-csv", post(load_csv))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn sales_refunds(State(app): State<Arc<SalesRefundApp>>) -> Json<ApiResponse<Vec<MatchedPairView>>> {
    let pairs: Vec<MatchedPairView> = app.matched_pairs().await.iter().map(MatchedPairView::from).collect();
    let count = pairs.len();
    ApiResponse::counted(pairs, count)
}

async fn unmatched(State(app): State<Arc<SalesRefundApp>>) -> Json<ApiResponse<Vec<TransactionView>>> {
    let transactions: Vec<TransactionView> = app.unmatched().await.iter().map(TransactionView::from).collect();
    let count = transactions.len();
    ApiResponse::counted(transactions, count)
}

async fn stats(State(app): State<Arc<SalesRefundApp>>) -> Json<ApiResponse<Stats>> {
    ApiResponse::ok(app.stats().await)
}

async fn load_csv(
    State(app): State<Arc<SalesRefundApp>>,
    payload: Option<Json<LoadCsvRequest>>,
) -> Result<Json<ApiResponse<LoadSummary>>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let path = match request.csv_file_path {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => return Err(MatcherError::MissingField("csvFilePath").into()),
    };

    let summary = app.load_from_csv_file(&path).await?;
    Ok(ApiResponse::ok(summary))
}

async fn health(State(app): State<Arc<SalesRefundApp>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE,
        timestamp: Utc::now().to_rfc3339(),
        uptime: app.uptime().as_secs_f64(),
    })
}
