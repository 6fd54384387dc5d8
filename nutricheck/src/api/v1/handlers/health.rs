use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::config::{parse_llm_provider_model, LlmConfig};

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub pubmed: PubMedStatus,
    pub extractor: ModelStatus,
    pub enrichment: ModelStatus,
    pub ledger: LedgerStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PubMedStatus {
    pub base_url: String,
    pub requests_per_second: f64,
    pub api_key: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ModelStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatus {
    pub configured: bool,
    pub auto_publish: bool,
}

fn model_status(config: Option<&LlmConfig>) -> ModelStatus {
    match config {
        Some(config) => {
            let (provider, model) = parse_llm_provider_model(&config.model);
            ModelStatus {
                status: "configured".to_string(),
                provider: Some(provider.to_string()),
                model: Some(model.to_string()),
            }
        }
        None => ModelStatus {
            status: "not_configured".to_string(),
            provider: None,
            model: None,
        },
    }
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let config = &state.config;

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pubmed: PubMedStatus {
            base_url: config.pubmed.base_url.clone(),
            requests_per_second: config.pubmed.requests_per_second,
            api_key: config.pubmed.api_key.is_some(),
        },
        extractor: model_status(config.extractor.as_ref()),
        enrichment: model_status(config.enrichment.llm.as_ref()),
        ledger: LedgerStatus {
            configured: state.validation.publisher_configured(),
            auto_publish: config.ledger.as_ref().is_some_and(|l| l.auto_publish),
        },
    })
}
