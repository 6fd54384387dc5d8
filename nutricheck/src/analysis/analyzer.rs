use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

use super::polarity::Polarity;
use super::quality::{quality_score, sample_size_score, significance_score};
use super::study_design::design_score;
use super::text::{content_words, fuzzy_word_match, WordIndex};
use crate::config::AnalysisConfig;
use crate::models::{
    EffectDirection, EnrichedTerms, EvidenceRecord, EvidenceSet, ExtractedClaim,
    RecordAssessment, RelevanceTier, Stance, Verdict, VerdictLabel,
};

/// Abstract sections describing prior work rather than findings.
const SKIPPED_SECTIONS: &[&str] = &[
    "BACKGROUND",
    "INTRODUCTION",
    "OBJECTIVE",
    "OBJECTIVES",
    "AIM",
    "AIMS",
    "PURPOSE",
    "CONTEXT",
    "RATIONALE",
];

/// Deterministic evidence scorer for one claim.
///
/// Relevance comes from lexical overlap between the claim concepts and each
/// record, stance from keyword polarity, and the verdict from a majority vote
/// over the first `top_k` relevant records.
#[derive(Debug)]
pub struct EvidenceAnalyzer {
    claim: ExtractedClaim,
    direction: EffectDirection,
    /// Content words of each term naming the subject.
    subject_terms: Vec<Vec<String>>,
    /// Content words of each term naming the effect.
    effect_terms: Vec<Vec<String>>,
    /// Every content word of the claim and its terms.
    claim_words: HashSet<String>,
    config: AnalysisConfig,
}

impl EvidenceAnalyzer {
    pub fn for_claim(
        claim: &ExtractedClaim,
        terms: &EnrichedTerms,
        config: &AnalysisConfig,
    ) -> Self {
        let focus = claim.effect_focus();
        let focus_words = content_words(&focus);

        let mut subject_terms = vec![content_words(&claim.subject)];
        let mut effect_terms = vec![focus_words.clone()];

        for term in terms {
            let term_words = content_words(term);
            if term_words.is_empty() {
                continue;
            }
            let shares_effect_word = term_words
                .iter()
                .any(|w| focus_words.iter().any(|f| fuzzy_word_match(w, f)));
            if shares_effect_word {
                effect_terms.push(term_words);
            } else {
                subject_terms.push(term_words);
            }
        }

        subject_terms.retain(|t| !t.is_empty());
        effect_terms.retain(|t| !t.is_empty());

        let claim_words = subject_terms
            .iter()
            .chain(effect_terms.iter())
            .flatten()
            .cloned()
            .collect();

        Self {
            claim: claim.clone(),
            direction: claim.direction(),
            subject_terms,
            effect_terms,
            claim_words,
            config: config.clone(),
        }
    }

    pub fn relevance(&self, record: &EvidenceRecord) -> RelevanceTier {
        let index = WordIndex::new(&record.searchable_text());
        let subject_found = self.subject_terms.iter().any(|t| index.contains_concept(t));
        let effect_found = self.effect_terms.iter().any(|t| index.contains_concept(t));

        match (subject_found, effect_found) {
            (true, true) => RelevanceTier::Direct,
            (true, false) | (false, true) => RelevanceTier::Indirect,
            (false, false) => {
                let overlap = index.overlap(&self.claim_words);
                if overlap > 0.0 && overlap >= self.config.contextual_min_overlap {
                    RelevanceTier::Contextual
                } else {
                    RelevanceTier::NotRelevant
                }
            }
        }
    }

    /// Stance of a record, voted over the sentences that mention a claim concept.
    /// Records that never name the subject say nothing about its effect.
    pub fn stance(&self, record: &EvidenceRecord) -> Stance {
        let index = WordIndex::new(&record.searchable_text());
        if !self.subject_terms.iter().any(|t| index.contains_concept(t)) {
            return Stance::Neutral;
        }

        let mut supports = 0usize;
        let mut refutes = 0usize;

        for sentence in self.finding_sentences(record) {
            if !self.mentions_concept(&sentence) {
                continue;
            }
            match Polarity::of(&sentence).stance(self.direction) {
                Stance::Supports => supports += 1,
                Stance::Refutes => refutes += 1,
                Stance::Neutral => {}
            }
        }

        match supports.cmp(&refutes) {
            std::cmp::Ordering::Greater => Stance::Supports,
            std::cmp::Ordering::Less => Stance::Refutes,
            std::cmp::Ordering::Equal => Stance::Neutral,
        }
    }

    fn mentions_concept(&self, sentence: &str) -> bool {
        let index = WordIndex::new(sentence);
        self.subject_terms
            .iter()
            .chain(self.effect_terms.iter())
            .any(|t| index.contains_concept(t))
    }

    /// Title plus abstract sentences, skipping background-style sections.
    fn finding_sentences(&self, record: &EvidenceRecord) -> Vec<String> {
        let mut sentences: Vec<String> = Vec::new();
        if !record.title.is_empty() {
            sentences.push(record.title.clone());
        }

        for section in record.abstract_text.lines() {
            let body = match section.split_once(": ") {
                Some((label, body)) if is_section_label(label) => {
                    if SKIPPED_SECTIONS.contains(&label.trim().to_uppercase().as_str()) {
                        continue;
                    }
                    body
                }
                _ => section,
            };
            sentences.extend(
                body.unicode_sentences()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }

        sentences
    }

    pub fn analyze(&self, evidence: &EvidenceSet) -> Verdict {
        if evidence.records.is_empty() {
            return Verdict::inconclusive(self.claim.clone());
        }

        let assessed: Vec<(&EvidenceRecord, RecordAssessment)> = evidence
            .records
            .iter()
            .map(|record| {
                let relevance = self.relevance(record);
                let stance = if relevance.is_relevant() {
                    self.stance(record)
                } else {
                    Stance::Neutral
                };
                let text = record.searchable_text();
                let design_score = design_score(&record.publication_types, &record.title);
                let sample_size_score = sample_size_score(&text);
                let significance_score = significance_score(&text);
                let assessment = RecordAssessment {
                    record_id: record.id.clone(),
                    relevance,
                    stance,
                    design_score,
                    sample_size_score,
                    significance_score,
                    quality_score: quality_score(
                        design_score,
                        sample_size_score,
                        significance_score,
                    ),
                };
                (record, assessment)
            })
            .collect();

        let voters: Vec<&(&EvidenceRecord, RecordAssessment)> = assessed
            .iter()
            .filter(|(_, a)| a.relevance.is_relevant())
            .take(self.config.top_k)
            .collect();

        let supporting = voters
            .iter()
            .filter(|(_, a)| a.stance == Stance::Supports)
            .count();
        let refuting = voters
            .iter()
            .filter(|(_, a)| a.stance == Stance::Refutes)
            .count();
        let neutral = voters.len() - supporting - refuting;

        let label = match supporting.cmp(&refuting) {
            std::cmp::Ordering::Greater => VerdictLabel::Supported,
            std::cmp::Ordering::Less => VerdictLabel::Refuted,
            std::cmp::Ordering::Equal => VerdictLabel::Inconclusive,
        };

        let confidence = match label {
            VerdictLabel::Supported => confidence(supporting, refuting),
            VerdictLabel::Refuted => confidence(refuting, supporting),
            VerdictLabel::Inconclusive => 0.0,
        };

        let cited_evidence = voters
            .iter()
            .filter(|(_, a)| match label {
                VerdictLabel::Supported => a.stance == Stance::Supports,
                VerdictLabel::Refuted => a.stance == Stance::Refutes,
                VerdictLabel::Inconclusive => a.stance != Stance::Neutral,
            })
            .map(|(record, _)| (*record).clone())
            .collect();

        let truth_score = truth_score(voters.iter().map(|(_, a)| a));

        Verdict {
            claim: self.claim.clone(),
            label,
            confidence,
            truth_score,
            cited_evidence,
            assessments: assessed.into_iter().map(|(_, a)| a).collect(),
            supporting,
            refuting,
            neutral,
        }
    }
}

fn is_section_label(label: &str) -> bool {
    let label = label.trim();
    !label.is_empty()
        && label.len() <= 40
        && label
            .chars()
            .all(|c| c.is_uppercase() || c.is_whitespace() || c == '&' || c == '/')
}

/// `((a - d) / (a + d)) * (a / (a + 1))` for `a` agreeing and `d` disagreeing
/// records. Zero when there is no majority.
pub fn confidence(agreeing: usize, disagreeing: usize) -> f32 {
    if agreeing <= disagreeing {
        return 0.0;
    }
    let a = agreeing as f32;
    let d = disagreeing as f32;
    ((a - d) / (a + d)) * (a / (a + 1.0))
}

/// Relevance and quality weighted balance of stances, in `[-1, 1]`.
fn truth_score<'a>(assessments: impl Iterator<Item = &'a RecordAssessment>) -> f32 {
    let (signed, total) = assessments.fold((0.0f32, 0.0f32), |(signed, total), a| {
        let weight = a.relevance.weight() * a.quality_score;
        (signed + weight * a.stance.sign(), total + weight)
    });
    if total <= 0.0 {
        0.0
    } else {
        (signed / total).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, title: &str, abstract_text: &str) -> EvidenceRecord {
        EvidenceRecord {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            ..EvidenceRecord::new(id)
        }
    }

    fn analyzer(subject: &str, effect: &str, terms: &[&str]) -> EvidenceAnalyzer {
        EvidenceAnalyzer::for_claim(
            &ExtractedClaim::new(subject, effect),
            &terms.iter().collect(),
            &AnalysisConfig::default(),
        )
    }

    fn set(records: Vec<EvidenceRecord>) -> EvidenceSet {
        EvidenceSet {
            query: "q".to_string(),
            total_available: records.len() as u64,
            records,
        }
    }

    #[test]
    fn test_empty_evidence_is_inconclusive() {
        let verdict = analyzer("Vitamin D", "lowers cortisol", &[]).analyze(&EvidenceSet::empty());
        assert_eq!(verdict.label, VerdictLabel::Inconclusive);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.cited_evidence.is_empty());
    }

    #[test]
    fn test_relevance_tiers() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &[]);
        assert_eq!(
            analyzer.relevance(&record("1", "Vitamin D and cortisol", "")),
            RelevanceTier::Direct
        );
        assert_eq!(
            analyzer.relevance(&record("2", "Cortisol in shift workers", "")),
            RelevanceTier::Indirect
        );
        assert_eq!(
            analyzer.relevance(&record("3", "Ocean temperature trends", "")),
            RelevanceTier::NotRelevant
        );
    }

    #[test]
    fn test_contextual_tier_from_partial_overlap() {
        let analyzer = analyzer("green tea extract", "weight loss", &[]);
        assert_eq!(
            analyzer.relevance(&record("1", "Green tea drinking habits in adults", "")),
            RelevanceTier::Contextual
        );
    }

    #[test]
    fn test_enriched_terms_extend_concepts() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &["cholecalciferol"]);
        assert_eq!(
            analyzer.relevance(&record("1", "Cholecalciferol and serum cortisol", "")),
            RelevanceTier::Direct
        );
    }

    #[test]
    fn test_background_section_is_ignored() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &[]);
        let rec = record(
            "1",
            "Vitamin D trial",
            "BACKGROUND: Stress increased cortisol in earlier work.\nRESULTS: Vitamin D reduced cortisol.",
        );
        assert_eq!(analyzer.stance(&rec), Stance::Supports);
    }

    #[test]
    fn test_vitamin_d_lowers_cortisol_supported() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &["cholecalciferol"]);
        let verdict = analyzer.analyze(&set(vec![
            record(
                "100",
                "Vitamin D supplementation and cortisol",
                "RESULTS: Vitamin D supplementation significantly reduced serum cortisol.",
            ),
            record(
                "101",
                "Cholecalciferol in stressed adults",
                "Cortisol levels were lower after cholecalciferol treatment.",
            ),
            record("102", "Soil bacteria of alpine meadows", "Microbial diversity rose."),
        ]));

        assert_eq!(verdict.label, VerdictLabel::Supported);
        assert_eq!(verdict.supporting, 2);
        assert_eq!(verdict.refuting, 0);
        let cited: Vec<&str> = verdict.cited_evidence.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(cited, vec!["100", "101"]);
        assert!((verdict.confidence - confidence(2, 0)).abs() < f32::EPSILON);
        assert!(verdict.truth_score > 0.0);
        assert_eq!(verdict.assessments.len(), 3);
        assert_eq!(verdict.assessments[2].relevance, RelevanceTier::NotRelevant);
    }

    #[test]
    fn test_tie_is_inconclusive_and_cites_both_sides() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &[]);
        let verdict = analyzer.analyze(&set(vec![
            record("1", "Vitamin D reduced cortisol", ""),
            record("2", "Vitamin D did not change cortisol", ""),
        ]));
        assert_eq!(verdict.label, VerdictLabel::Inconclusive);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.cited_evidence.len(), 2);
    }

    #[test]
    fn test_refuted_by_null_findings() {
        let analyzer = analyzer("Zinc", "reduces cold duration", &[]);
        let verdict = analyzer.analyze(&set(vec![
            record("1", "Zinc lozenges had no effect on cold duration", ""),
            record("2", "Zinc did not shorten common cold duration", ""),
            record("3", "Zinc reduced cold duration in children", ""),
        ]));
        assert_eq!(verdict.label, VerdictLabel::Refuted);
        assert_eq!(verdict.cited_evidence.len(), 2);
        assert!(verdict.truth_score < 0.0);
    }

    #[test]
    fn test_only_top_k_relevant_records_vote() {
        let analyzer = EvidenceAnalyzer::for_claim(
            &ExtractedClaim::new("Vitamin D", "lowers cortisol"),
            &EnrichedTerms::new(),
            &AnalysisConfig {
                top_k: 1,
                ..Default::default()
            },
        );
        let verdict = analyzer.analyze(&set(vec![
            record("0", "Unrelated astronomy paper", ""),
            record("1", "Vitamin D reduced cortisol", ""),
            record("2", "Vitamin D increased cortisol", ""),
            record("3", "Vitamin D increased cortisol again", ""),
        ]));
        assert_eq!(verdict.label, VerdictLabel::Supported);
        assert_eq!(verdict.supporting + verdict.refuting + verdict.neutral, 1);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = analyzer("Coffee", "increases blood pressure", &[]);
        let evidence = set(vec![
            record("1", "Coffee increased blood pressure", ""),
            record("2", "Coffee intake and blood pressure", "No significant change was seen."),
        ]);
        assert_eq!(analyzer.analyze(&evidence), analyzer.analyze(&evidence));
    }

    #[test]
    fn test_confidence_monotonic_in_agreement() {
        for d in 0..5 {
            let mut previous = 0.0;
            for a in 0..20 {
                let c = confidence(a, d);
                assert!(c >= previous, "confidence dropped at a={a} d={d}");
                assert!((0.0..=1.0).contains(&c));
                previous = c;
            }
        }
    }

    #[test]
    fn test_other_vitamin_is_not_evidence() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &[]);
        let vitamin_c = record("1", "Vitamin C supplementation reduced cortisol in athletes", "");

        assert_eq!(analyzer.relevance(&vitamin_c), RelevanceTier::Indirect);
        assert_eq!(analyzer.stance(&vitamin_c), Stance::Neutral);

        let verdict = analyzer.analyze(&set(vec![vitamin_c]));
        assert_eq!(verdict.label, VerdictLabel::Inconclusive);
        assert_eq!(verdict.supporting, 0);
        assert!(verdict.cited_evidence.is_empty());
    }

    #[test]
    fn test_reduced_risk_supports_undirected_claim() {
        let analyzer = analyzer("chia seeds", "heart health", &[]);
        let rec = record(
            "1",
            "Chia seeds and cardiovascular outcomes",
            "RESULTS: Chia seed intake reduced the risk of heart disease.",
        );
        assert!(analyzer.relevance(&rec).is_relevant());
        assert_eq!(analyzer.stance(&rec), Stance::Supports);

        let verdict = analyzer.analyze(&set(vec![rec]));
        assert_eq!(verdict.label, VerdictLabel::Supported);
    }

    #[test]
    fn test_agreeing_record_never_lowers_confidence() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &[]);
        let mut records = vec![
            record("1", "Vitamin D reduced cortisol", ""),
            record("2", "Vitamin D increased cortisol", ""),
            record("3", "Vitamin D lowered cortisol in adults", ""),
        ];
        let mut previous = analyzer.analyze(&set(records.clone())).confidence;

        for i in 4..9 {
            records.push(record(&i.to_string(), "Vitamin D reduced serum cortisol", ""));
            let current = analyzer.analyze(&set(records.clone())).confidence;
            assert!(current >= previous, "confidence dropped after record {i}");
            previous = current;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_study_quality_weights_truth_score() {
        let analyzer = analyzer("Vitamin D", "lowers cortisol", &[]);
        let strong_support = EvidenceRecord {
            publication_types: vec!["Randomized Controlled Trial".to_string()],
            ..record(
                "1",
                "Vitamin D reduced cortisol",
                "In 1,200 adults Vitamin D reduced cortisol (p < 0.001).",
            )
        };
        let weak_refutation = EvidenceRecord {
            publication_types: vec!["Case Reports".to_string()],
            ..record("2", "Vitamin D increased cortisol", "One patient was described.")
        };

        let verdict = analyzer.analyze(&set(vec![strong_support, weak_refutation]));

        assert_eq!(verdict.label, VerdictLabel::Inconclusive);
        let strong = &verdict.assessments[0];
        assert_eq!(strong.sample_size_score, 1.0);
        assert_eq!(strong.significance_score, 1.0);
        assert!(strong.quality_score > verdict.assessments[1].quality_score);
        assert!(verdict.truth_score > 0.0);
    }
}
