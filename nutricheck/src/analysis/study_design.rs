/// Score used when no design can be recognized.
pub const UNKNOWN_DESIGN_SCORE: f32 = 0.5;

/// Evidence-strength rubric, strongest first. Matched case-insensitively
/// against publication types, then against the title.
const DESIGN_RUBRIC: &[(&[&str], f32)] = &[
    (&["meta-analysis", "meta analysis", "systematic review"], 1.0),
    (&["randomized controlled trial", "randomised controlled trial"], 0.9),
    (&["controlled clinical trial", "clinical trial", "randomized", "randomised"], 0.8),
    (&["observational study", "cohort", "prospective", "longitudinal"], 0.7),
    (&["comparative study", "case-control", "case control", "cross-sectional"], 0.6),
    (&["case report", "case reports", "case series"], 0.4),
    (&["review"], 0.3),
    (&["editorial", "comment", "letter", "opinion"], 0.2),
];

fn score_text(text: &str) -> Option<f32> {
    let lower = text.to_lowercase();
    DESIGN_RUBRIC
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
        .map(|(_, score)| *score)
}

/// Strength of a study design in `[0, 1]`.
///
/// The best publication type wins; when none is informative the title is
/// checked for design keywords before falling back to `UNKNOWN_DESIGN_SCORE`.
pub fn design_score(publication_types: &[String], title: &str) -> f32 {
    publication_types
        .iter()
        .filter_map(|pt| score_text(pt))
        .fold(None, |best: Option<f32>, score| {
            Some(best.map_or(score, |b| b.max(score)))
        })
        .or_else(|| score_text(title))
        .unwrap_or(UNKNOWN_DESIGN_SCORE)
}
