use crate::core::codec::decode_base64;
use crate::domain::model::{Classification, ClassifyRequest};
use crate::server::error::{ApiError, MISSING_IMAGE_MESSAGE};
use crate::server::AppState;
use axum::{body::Bytes, extract::State, Json};
use serde_json::json;

/// `POST /classify/v0`
///
/// The body is read as JSON whatever its `Content-Type`. Classification runs
/// on the blocking pool since the digit network is CPU bound.
pub async fn classify_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Classification>, ApiError> {
    if !state.classifier.is_ready() {
        return Err(ApiError::ServiceUnavailable(
            "Model not loaded. Cannot perform classification.".to_string(),
        ));
    }

    let request = parse_request(&body)?;

    let encoded = request.image.as_str().ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid base64 encoding: expected a string, got {}",
            json_type_name(&request.image)
        ))
    })?;
    let image_bytes = decode_base64(encoded)?;
    tracing::debug!("Decoded {} image bytes", image_bytes.len());

    let classifier = state.classifier.clone();
    let outcome = tokio::task::spawn_blocking(move || classifier.classify(&image_bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(outcome))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "classifier": state.classifier.name(),
        "ready": state.classifier.is_ready(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn parse_request(body: &[u8]) -> Result<ClassifyRequest, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string()))?;

    match value {
        serde_json::Value::Object(mut fields) => match fields.remove("image") {
            Some(image) => Ok(ClassifyRequest { image }),
            None => Err(ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string())),
        },
        _ => Err(ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string())),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
