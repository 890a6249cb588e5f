//! Request handlers.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use claimcheck_core::Prediction;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;

/// The two form fields a prediction needs.
#[derive(Debug, Default)]
struct PredictForm {
    text: Option<String>,
    image: Option<Vec<u8>>,
}

impl PredictForm {
    /// Both fields, non-empty, or `MissingInput`.
    fn into_inputs(self) -> Result<(String, Vec<u8>), ApiError> {
        match (self.text, self.image) {
            (Some(text), Some(image)) if !text.is_empty() && !image.is_empty() => {
                Ok((text, image))
            }
            _ => Err(ApiError::MissingInput),
        }
    }
}

/// Map a multipart read failure onto the two client-error tiers.
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        tracing::debug!("Unreadable multipart body: {err}");
        ApiError::MissingInput
    }
}

/// Read `text` and `image` from the form. The first occurrence of each wins;
/// other fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<PredictForm, ApiError> {
    let mut form = PredictForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") if form.text.is_none() => {
                form.text = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("image") if form.image.is_none() => {
                form.image = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `POST /predict` - classify a claim and image.
///
/// Expects `multipart/form-data` with a `text` field and an `image` file.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!("Not a multipart request: {rejection}");
        ApiError::MissingInput
    })?;

    let (text, image) = read_form(multipart).await?.into_inputs()?;
    tracing::debug!(
        "Predict request: {} chars of text, {} image bytes",
        text.chars().count(),
        image.len()
    );

    let analysis = state.predictor.clone().predict_blocking(text, image).await?;
    tracing::debug!(
        "Prediction {} softmax={:?} objects={:?} tokens={}+{}",
        analysis.prediction.label,
        analysis.prediction.softmax,
        analysis.detected_objects,
        analysis.claim_tokens,
        analysis.object_tokens
    );

    Ok(Json(analysis.prediction))
}

/// `GET /health` - liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": claimcheck_core::VERSION,
    }))
}
