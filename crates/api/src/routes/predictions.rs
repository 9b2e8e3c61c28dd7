//! Prediction Routes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use feature_engine::FeatureSet;
use risk_classifier::{PredictionResult, SampleMeta};
use rule_engine::Assessment;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Request body: the nine parameters (each optional) plus free-form metadata
#[derive(Debug, Deserialize)]
pub struct WaterSamplePayload {
    #[serde(flatten)]
    pub features: FeatureSet,
    #[serde(flatten)]
    pub meta: SampleMeta,
}

/// Apply the request precondition and return the sample
fn accept(state: &AppState, payload: Result<Json<WaterSamplePayload>, JsonRejection>) -> Result<WaterSamplePayload, ApiError> {
    let Json(payload) = payload?;
    let present = state.validator.validate(&payload.features).into_result()?;
    debug!("Accepted sample with {} parameters", present);
    Ok(payload)
}

/// Model-backed microbial-risk prediction
pub async fn predict_microbial_risk(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WaterSamplePayload>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let sample = accept(&state, payload)?;
    let result = state.service.predict(&sample.features, &sample.meta).await?;
    Ok(Json(result))
}

/// Rule-engine assessment only
pub async fn assess_microbial_risk_rules(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WaterSamplePayload>, JsonRejection>,
) -> Result<Json<Assessment>, ApiError> {
    let sample = accept(&state, payload)?;
    Ok(Json(state.service.assess_rules(&sample.features)))
}
