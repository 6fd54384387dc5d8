//! Reported sample size and statistical significance of a study.

use regex::Regex;
use std::sync::LazyLock;

/// Score used when no participant count is reported.
pub const UNKNOWN_SAMPLE_SCORE: f32 = 0.5;

/// Score used when no statistical analysis is reported.
pub const NO_STATISTICS_SCORE: f32 = 0.2;

/// Minimum participant count for each score, largest first.
const SAMPLE_SIZE_TIERS: &[(u64, f32)] = &[
    (1001, 1.0),
    (500, 0.9),
    (200, 0.8),
    (100, 0.7),
    (50, 0.6),
    (20, 0.5),
    (10, 0.4),
    (5, 0.3),
    (2, 0.2),
    (1, 0.1),
];

/// Weights of design, sample size and significance in the quality score.
const DESIGN_WEIGHT: f32 = 0.30;
const SAMPLE_WEIGHT: f32 = 0.20;
const SIGNIFICANCE_WEIGHT: f32 = 0.15;

static SAMPLE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \bn \s* = \s* (?P<n>\d{1,3}(?:,\d{3})+|\d+)
        |
        \b(?P<count>\d{1,3}(?:,\d{3})+|\d+) \s+ (?:[a-z-]+\s+){0,2}?
        (?:participants|patients|subjects|adults|children|adolescents|women|men|
           volunteers|individuals|people|persons|athletes|infants|respondents)\b",
    )
    .unwrap()
});

static P_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bp(?:\s*-?\s*values?)?\s*(?P<op><=|≤|<|=)\s*(?P<value>0?\.\d+)").unwrap()
});

static NOT_SIGNIFICANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:not|no|non)[\s-]*(?:statistically\s+)?significant").unwrap());

static SIGNIFICANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsignificant(?:ly)?\b").unwrap());

/// Largest participant count reported in `text`, if any.
pub fn reported_sample_size(text: &str) -> Option<u64> {
    SAMPLE_SIZE
        .captures_iter(text)
        .filter_map(|caps| caps.name("n").or_else(|| caps.name("count")))
        .filter_map(|m| m.as_str().replace(',', "").parse::<u64>().ok())
        .max()
}

/// Sample size score in `[0, 1]`.
pub fn sample_size_score(text: &str) -> f32 {
    match reported_sample_size(text) {
        Some(n) => SAMPLE_SIZE_TIERS
            .iter()
            .find(|(min, _)| n >= *min)
            .map(|(_, score)| *score)
            .unwrap_or(UNKNOWN_SAMPLE_SCORE),
        None => UNKNOWN_SAMPLE_SCORE,
    }
}

/// Statistical significance score in `[0, 1]`.
///
/// The strongest reported p-value decides. Without one, wording is used:
/// "not significant" scores 0.4, "significant" 0.8, and silence
/// `NO_STATISTICS_SCORE`.
pub fn significance_score(text: &str) -> f32 {
    let best = P_VALUE
        .captures_iter(text)
        .filter_map(|caps| {
            let value: f32 = caps.name("value")?.as_str().parse().ok()?;
            let strict = caps.name("op").is_some_and(|op| op.as_str() != "=");
            Some(p_value_score(value, strict))
        })
        .fold(None, |best: Option<f32>, score| Some(best.map_or(score, |b| b.max(score))));

    if let Some(score) = best {
        return score;
    }
    if NOT_SIGNIFICANT.is_match(text) {
        0.4
    } else if SIGNIFICANT.is_match(text) {
        0.8
    } else {
        NO_STATISTICS_SCORE
    }
}

/// `strict` is true for `p < value`, where the bound itself counts.
fn p_value_score(value: f32, strict: bool) -> f32 {
    let below = |bound: f32| if strict { value <= bound } else { value < bound };
    if below(0.001) {
        1.0
    } else if below(0.01) {
        0.9
    } else if below(0.05) {
        0.8
    } else if below(0.1) {
        0.6
    } else {
        0.4
    }
}

/// Weighted study quality in `[0, 1]` from design, sample size and
/// significance scores.
pub fn quality_score(design: f32, sample_size: f32, significance: f32) -> f32 {
    (DESIGN_WEIGHT * design + SAMPLE_WEIGHT * sample_size + SIGNIFICANCE_WEIGHT * significance)
        / (DESIGN_WEIGHT + SAMPLE_WEIGHT + SIGNIFICANCE_WEIGHT)
}
