mod validation;

pub use validation::{search_terms, ClaimValidationService, ValidationOptions};
