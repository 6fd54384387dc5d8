use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Nutricheck API",
        version = "1.0.0",
        description = "Validates nutrition and health claims against PubMed evidence.",
    ),
    paths(
        handlers::health::health_check,
        handlers::claims::validate_claim,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Claims
        dto::claims::ValidateClaimRequest,
        models::ValidationReport,
        models::ExtractedClaim,
        models::EffectDirection,
        models::EnrichedTerms,
        models::EvidenceRecord,
        models::EvidenceSet,
        models::EvidenceStatus,
        models::Verdict,
        models::VerdictLabel,
        models::RecordAssessment,
        models::RelevanceTier,
        models::Stance,
        models::PublishStatus,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::PubMedStatus,
        handlers::health::ModelStatus,
        handlers::health::LedgerStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "claims", description = "Claim validation against PubMed evidence"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
