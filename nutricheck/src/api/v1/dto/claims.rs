//! Claim validation request DTOs for the v1 API.

use serde::Deserialize;
use validator::Validate;

use crate::services::ValidationOptions;

/// Request body for `POST /v1/claims:validate`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateClaimRequest {
    /// Free-text health claim, e.g. "Vitamin D lowers cortisol". At most
    /// 2000 characters.
    #[validate(length(min = 1, max = 2000))]
    pub claim: String,
    /// Maximum number of PubMed records to retrieve, at most 200. Defaults to
    /// the server setting.
    #[validate(range(max = 200))]
    pub max_results: Option<usize>,
    /// Publish the verdict to the ledger. Defaults to the server setting.
    pub publish: Option<bool>,
    /// Only consider human studies. Defaults to the server setting.
    pub human_only: Option<bool>,
    /// Accepted publication types, e.g. "Randomized Controlled Trial". An
    /// empty list accepts any type. At most 10 entries.
    #[validate(length(max = 10))]
    pub publication_types: Option<Vec<String>>,
}

impl ValidateClaimRequest {
    pub fn options(&self) -> ValidationOptions {
        ValidationOptions {
            max_results: self.max_results,
            publish: self.publish,
            human_only: self.human_only,
            publication_types: self.publication_types.clone(),
        }
    }
}
