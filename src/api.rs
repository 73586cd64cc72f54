/// HTTP API поверх сервиса предсказаний

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::PredictError;
use crate::pipeline::PredictionService;
use crate::types::{PredictionResponse, RawSpecRecord};

pub type AppState = Arc<PredictionService>;

pub fn router(service: AppState) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn root(State(service): State<AppState>) -> Json<serde_json::Value> {
    let status = if service.is_ready() {
        "Model loaded"
    } else {
        "Model not loaded"
    };
    Json(json!({
        "message": "Mobile Price Prediction API (Rust)",
        "version": env!("CARGO_PKG_VERSION"),
        "status": status,
    }))
}

async fn health(State(service): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match service.as_ref() {
        PredictionService::Ready(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        PredictionService::Unavailable { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "reason": reason })),
        ),
    }
}

async fn predict(
    State(service): State<AppState>,
    payload: Result<Json<RawSpecRecord>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(record) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let prediction = service.predict(&record)?;
    tracing::info!(prediction, "Prediction served");
    Ok(Json(PredictionResponse { prediction }))
}

/// Ошибка в ответе: {"error": {"kind", "message", "fields"?}}
#[derive(Debug)]
pub enum ApiError {
    Predict(PredictError),
    /// Тело запроса не разобралось как JSON запись
    BadRequest(String),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "kind": "validation_error", "message": message }),
            ),
            ApiError::Predict(err) => {
                let status = match err {
                    PredictError::Validation(_) => StatusCode::BAD_REQUEST,
                    PredictError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    PredictError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let mut body = json!({ "kind": err.kind(), "message": err.to_string() });
                if let PredictError::Validation(validation) = err {
                    body["fields"] = json!(validation.issues);
                }
                (status, body)
            }
        };

        if status.is_server_error() {
            tracing::error!(%status, "Request failed: {}", body["message"]);
        } else {
            tracing::debug!(%status, "Request rejected: {}", body["message"]);
        }

        (status, Json(json!({ "error": body }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForestParams;
    use crate::pipeline::TrainingPipeline;
    use crate::types::{LabeledRecord, SpecField};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn ready_state() -> AppState {
        let records: Vec<LabeledRecord> = (0..24)
            .map(|i| LabeledRecord {
                row: i + 1,
                spec: RawSpecRecord::default()
                    .with(SpecField::MobileWeight, format!("{}g", 160 + i * 2))
                    .with(SpecField::Ram, format!("{}GB", 4 + (i % 4) * 2))
                    .with(SpecField::FrontCamera, "12MP")
                    .with(SpecField::BackCamera, "48MP")
                    .with(SpecField::Processor, ["A16 Bionic", "Exynos 2200"][i % 2])
                    .with(SpecField::BatteryCapacity, "4500mAh")
                    .with(SpecField::ScreenSize, "6.5 inches")
                    .with(SpecField::LaunchedYear, (2020 + i % 5) as f64),
                price: Some(format!("₹{},999", 20 + i * 4)),
            })
            .collect();
        let data = TrainingPipeline::prepare(&records).unwrap();
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        let artifact = TrainingPipeline::fit(&data.features, &data.targets, &params).unwrap();
        Arc::new(PredictionService::from_artifact(artifact))
    }

    fn unavailable_state() -> AppState {
        Arc::new(PredictionService::Unavailable {
            reason: "scaler.json not found".to_string(),
        })
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_predict(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn full_request() -> serde_json::Value {
        json!({
            "Mobile Weight": 188,
            "RAM": 8,
            "Front Camera": 16,
            "Back Camera": 50,
            "Processor": "Snapdragon 8 Gen 2",
            "Battery Capacity": 5000,
            "Screen Size": 6.7,
            "Launched Year": 2024
        })
    }

    #[tokio::test]
    async fn test_predict_ok() {
        let (status, body) = send(ready_state(), post_predict(full_request())).await;
        assert_eq!(status, StatusCode::OK);
        let prediction = body["prediction"].as_f64().unwrap();
        assert!(prediction.is_finite() && prediction >= 0.0);
    }

    #[tokio::test]
    async fn test_predict_missing_field() {
        let mut request = full_request();
        request.as_object_mut().unwrap().remove("Screen Size");

        let (status, body) = send(ready_state(), post_predict(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation_error");
        assert_eq!(body["error"]["fields"][0]["field"], "Screen Size");
        assert_eq!(body["error"]["fields"][0]["problem"], "missing");
    }

    #[tokio::test]
    async fn test_predict_malformed_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(ready_state(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_predict_unavailable() {
        let (status, body) = send(unavailable_state(), post_predict(full_request())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["kind"], "service_unavailable");
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let (status, body) = send(ready_state(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Model loaded");

        let (status, body) = send(unavailable_state(), get("/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }
}
