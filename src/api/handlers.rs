//! Axum request handlers.

use axum::{body::Bytes, extract::State, Json};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::serialize::stringify_ids;
use super::AppState;
use crate::database::{StoreError, StoreHandle};
use crate::extractor::extract;
use crate::types::{DerivedMetrics, RawSample, SamplePayload};
use crate::utils::current_timestamp;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    /// 原样回显收到的数据
    pub received_data: Value,
    pub processed_metrics: DerivedMetrics,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub status: &'static str,
    pub latest_data: Value,
}

/// `POST /api/data`
///
/// The body is parsed by hand rather than through the `Json` extractor so that
/// every failure, including a body that is not JSON, produces the same
/// `{status: "error", message}` 500 response.
pub async fn receive_data(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<IngestResponse>> {
    let received_data: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedPayload(e.to_string()))?;
    info!("Received data: {}", received_data);

    let payload = SamplePayload::from_json(&received_data)?;
    let sample = payload.into_sample(current_timestamp());
    let processed_metrics = extract(&sample);

    persist_sample(&state.store, sample, processed_metrics.clone()).await?;

    Ok(Json(IngestResponse {
        status: "success",
        received_data,
        processed_metrics,
    }))
}

/// 两步写入：先写原始记录，再写派生指标，两者不在同一事务中。
///
/// A failure after the first step leaves a raw record with no derived
/// counterpart. A derived record is never written without its raw record.
async fn persist_sample(
    store: &StoreHandle,
    sample: RawSample,
    metrics: DerivedMetrics,
) -> Result<(), StoreError> {
    let raw_id = store.append_raw(sample).await?;

    match store.append_derived(metrics).await {
        Ok(derived_id) => {
            info!("Data saved successfully (raw {}, derived {})", raw_id, derived_id);
            Ok(())
        }
        Err(e) => {
            error!("Raw record {} saved but derived metrics were not: {}", raw_id, e);
            Err(e)
        }
    }
}

/// `GET /api/retrieve`
pub async fn retrieve_data(State(state): State<AppState>) -> ApiResult<Json<RetrieveResponse>> {
    let latest = state
        .store
        .most_recent_raw()
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut latest_data =
        serde_json::to_value(&latest).map_err(|e| ApiError::Internal(e.to_string()))?;
    stringify_ids(&mut latest_data);

    Ok(Json(RetrieveResponse {
        status: "success",
        latest_data,
    }))
}
