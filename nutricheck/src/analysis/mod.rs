mod analyzer;
mod polarity;
mod quality;
mod study_design;
pub(crate) mod text;

pub use analyzer::{confidence, EvidenceAnalyzer};
pub use polarity::{Cue, Polarity};
pub use quality::{quality_score, reported_sample_size, sample_size_score, significance_score};
pub use study_design::{design_score, UNKNOWN_DESIGN_SCORE};
