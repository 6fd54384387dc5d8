use regex::Regex;
use std::sync::LazyLock;

use crate::models::{EffectDirection, Stance};

/// Keyword cues that give a sentence its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// "no significant", "did not", "failed to"
    NullFinding,
    /// "decreased", "reduced", "lower"
    Decrease,
    /// "increased", "elevated", "higher"
    Increase,
    /// "improved", "beneficial", "protective"
    Benefit,
    /// "adverse", "harmful", "worsened"
    Harm,
}

impl Cue {
    /// All phrases this cue matches (lowercase, whole words).
    fn phrases(&self) -> &'static [&'static str] {
        match self {
            Self::NullFinding => &[
                "no significant",
                "not significant",
                "not significantly",
                "nonsignificant",
                "non-significant",
                "non significant",
                "did not",
                "does not",
                "do not",
                "was not",
                "were not",
                "failed to",
                "no effects?",
                "no association",
                "not associated",
                "no differences?",
                "no changes?",
                "no evidence",
                "had no",
                "showed no",
                "unchanged",
                "unaffected",
            ],
            Self::Decrease => &[
                "decrease[ds]?",
                "decreasing",
                "reduce[ds]?",
                "reducing",
                "reductions?",
                "lower(?:ed|s|ing)?",
                "declined?",
                "fell",
                "drop(?:ped)?",
                "attenuated",
                "suppressed",
                "inhibited",
                "diminished",
            ],
            Self::Increase => &[
                "increase[ds]?",
                "increasing",
                "higher",
                "elevated",
                "elevation",
                "raised",
                "rise",
                "rose",
                "enhanced",
                "boosted",
                "augmented",
                "greater",
            ],
            Self::Benefit => &[
                "improve[ds]?",
                "improvements?",
                "beneficial",
                "benefits?",
                "protective",
                "effective",
                "efficacy",
                "alleviated",
                "ameliorated",
            ],
            Self::Harm => &[
                "adverse",
                "harmful",
                "harm",
                "worse",
                "worsen(?:ed|ing)",
                "detrimental",
                "toxicity",
                "toxic",
                "ineffective",
            ],
        }
    }

    fn all() -> &'static [Cue] {
        &[
            Cue::NullFinding,
            Cue::Decrease,
            Cue::Increase,
            Cue::Benefit,
            Cue::Harm,
        ]
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::NullFinding => &NULL_FINDING,
            Self::Decrease => &DECREASE,
            Self::Increase => &INCREASE,
            Self::Benefit => &BENEFIT,
            Self::Harm => &HARM,
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.pattern().is_match(text)
    }
}

static NULL_FINDING: LazyLock<Regex> = LazyLock::new(|| whole_words(Cue::NullFinding.phrases()));
static DECREASE: LazyLock<Regex> = LazyLock::new(|| whole_words(Cue::Decrease.phrases()));
static INCREASE: LazyLock<Regex> = LazyLock::new(|| whole_words(Cue::Increase.phrases()));
static BENEFIT: LazyLock<Regex> = LazyLock::new(|| whole_words(Cue::Benefit.phrases()));
static HARM: LazyLock<Regex> = LazyLock::new(|| whole_words(Cue::Harm.phrases()));

/// Clause boundaries: punctuation and contrastive conjunctions.
static CLAUSE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[,;:]|\b(?:but|whereas|while|although|however)\b").unwrap()
});

/// Outcomes that are bad by nature: lowering them is a benefit.
static RISK_OUTCOME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:risks?|incidence|odds|hazards?|mortality)\b").unwrap());

/// Case-insensitive alternation of phrases on word boundaries, with any run
/// of spaces or hyphens between the words of a phrase.
fn whole_words(phrases: &[&str]) -> Regex {
    let alternation = phrases
        .iter()
        .map(|p| p.replace(' ', r"[\s-]+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
}

/// Cues detected in one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polarity {
    pub null_finding: bool,
    pub decrease: bool,
    pub increase: bool,
    pub benefit: bool,
    pub harm: bool,
}

impl Polarity {
    pub fn of(sentence: &str) -> Self {
        let mut polarity = Self::default();

        for clause in CLAUSE_BOUNDARY.split(sentence) {
            let decrease = Cue::Decrease.matches(clause);
            let increase = Cue::Increase.matches(clause);

            polarity.null_finding |= Cue::NullFinding.matches(clause);
            polarity.decrease |= decrease;
            polarity.increase |= increase;
            polarity.benefit |= Cue::Benefit.matches(clause);
            polarity.harm |= Cue::Harm.matches(clause);

            // "reduced the risk of" reads as a benefit, "higher odds of" as harm.
            if RISK_OUTCOME.is_match(clause) {
                polarity.benefit |= decrease && !increase;
                polarity.harm |= increase && !decrease;
            }
        }

        polarity
    }

    /// Stance of this sentence towards a claimed effect.
    ///
    /// A null finding refutes regardless of other cues. Otherwise direction
    /// cues decide for directed claims and benefit/harm cues for the rest.
    /// Mixed cues are neutral.
    pub fn stance(&self, direction: EffectDirection) -> Stance {
        if self.null_finding {
            return Stance::Refutes;
        }

        let (agrees, disagrees) = match direction {
            EffectDirection::Decrease => (self.decrease, self.increase),
            EffectDirection::Increase => (self.increase, self.decrease),
            EffectDirection::Unspecified => (self.benefit, self.harm),
        };

        match (agrees, disagrees) {
            (true, false) => Stance::Supports,
            (false, true) => Stance::Refutes,
            _ => Stance::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stance(sentence: &str, direction: EffectDirection) -> Stance {
        Polarity::of(sentence).stance(direction)
    }

    #[test]
    fn test_every_cue_matches_its_forms() {
        let samples = [
            (Cue::NullFinding, "There were no differences"),
            (Cue::Decrease, "levels dropped"),
            (Cue::Increase, "intake rose"),
            (Cue::Benefit, "clear improvements"),
            (Cue::Harm, "symptoms worsening"),
        ];
        for (cue, sample) in samples {
            assert!(cue.matches(sample), "{cue:?} did not match {sample:?}");
        }
    }

    #[test]
    fn test_decrease_claim() {
        assert_eq!(
            stance("Serum cortisol was reduced after 12 weeks.", EffectDirection::Decrease),
            Stance::Supports
        );
        assert_eq!(
            stance("Cortisol increased in the treatment arm.", EffectDirection::Decrease),
            Stance::Refutes
        );
    }

    #[test]
    fn test_null_finding_refutes() {
        assert_eq!(
            stance(
                "Supplementation did not reduce cortisol concentrations.",
                EffectDirection::Decrease
            ),
            Stance::Refutes
        );
        assert_eq!(
            stance("No significant change in blood pressure.", EffectDirection::Increase),
            Stance::Refutes
        );
        assert!(Polarity::of("Effects were non-significant.").null_finding);
    }

    #[test]
    fn test_undirected_claim_uses_benefit_cues() {
        assert_eq!(
            stance("Green tea improved weight loss outcomes.", EffectDirection::Unspecified),
            Stance::Supports
        );
        assert_eq!(
            stance("High doses caused adverse events.", EffectDirection::Unspecified),
            Stance::Refutes
        );
    }

    #[test]
    fn test_lowered_risk_is_a_benefit() {
        assert_eq!(
            stance(
                "Chia seed intake reduced the risk of heart disease.",
                EffectDirection::Unspecified
            ),
            Stance::Supports
        );
        assert_eq!(
            stance(
                "Daily intake was associated with lower mortality.",
                EffectDirection::Unspecified
            ),
            Stance::Supports
        );
        assert_eq!(
            stance(
                "Processed meat was linked to a higher risk of colorectal cancer.",
                EffectDirection::Unspecified
            ),
            Stance::Refutes
        );
        assert_eq!(
            stance("The risk of bias was assessed.", EffectDirection::Unspecified),
            Stance::Neutral
        );
    }

    #[test]
    fn test_risk_flip_stays_in_its_clause() {
        let polarity =
            Polarity::of("Fiber reduced LDL cholesterol, but the risk of bloating was unchanged.");
        assert!(!polarity.benefit);
        assert!(polarity.null_finding);
    }

    #[test]
    fn test_mixed_or_missing_cues_are_neutral() {
        assert_eq!(
            stance("Cortisol rose then decreased.", EffectDirection::Decrease),
            Stance::Neutral
        );
        assert_eq!(
            stance("Participants were recruited in 2019.", EffectDirection::Decrease),
            Stance::Neutral
        );
    }

    #[test]
    fn test_cue_matches_whole_words_only() {
        let polarity = Polarity::of("The lowermost quartile");
        assert!(!polarity.decrease);
        assert!(Polarity::of("Levels were LOWER at follow-up").decrease);
    }
}
