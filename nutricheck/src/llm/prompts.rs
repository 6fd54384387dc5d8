//! Simple prompt templates for the extraction and enrichment models
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

/// System prompt for claim extraction.
pub const CLAIM_EXTRACTION_SYSTEM: &str =
    "You identify the subject and the claimed effect in nutrition and health claims. \
     You answer with JSON only.";

/// Generate a prompt for extracting the `(subject, effect)` pair from a claim
///
/// The model is asked for a JSON object with `subject` and `effect` fields,
/// or `null` when the text makes no health claim.
///
/// # Example
/// ```
/// use nutricheck::llm::prompts::claim_extraction_prompt;
///
/// let prompt = claim_extraction_prompt("Vitamin D lowers cortisol");
/// assert!(prompt.contains("Vitamin D lowers cortisol"));
/// ```
pub fn claim_extraction_prompt(claim: &str) -> String {
    format!(
        r#"Extract the subject and the effect from the following health claim.

The subject is the food, nutrient, supplement or behaviour the claim is about.
The effect is what the claim says happens, including its direction (for example "lowers cortisol").
Keep the wording of the claim where possible. Do not explain.

If the text does not make a health claim, respond with null.

Claim:
{claim}

Respond with valid JSON only. Example format:
{{"subject": "green tea", "effect": "reduces body weight"}}"#
    )
}

/// System prompt for term expansion.
pub const TERM_EXPANSION_SYSTEM: &str =
    "You are a biomedical terminology assistant. You list synonyms and related \
     scientific terms, separated by commas, without commentary.";

/// Generate a prompt for expanding one concept into scientific terms
///
/// The completion is expected to be a comma separated list.
///
/// # Example
/// ```
/// use nutricheck::llm::prompts::term_expansion_prompt;
///
/// let prompt = term_expansion_prompt("vitamin D", 5);
/// assert!(prompt.contains("vitamin D"));
/// assert!(prompt.contains('5'));
/// ```
pub fn term_expansion_prompt(concept: &str, max_terms: usize) -> String {
    format!(
        r#"List up to {max_terms} scientific terms, synonyms, or compound names used in biomedical literature for: {concept}

Prefer MeSH headings and chemical names. Each term must be at most six words.
Answer with a single comma separated line.

Scientific terms for {concept} include:"#
    )
}
