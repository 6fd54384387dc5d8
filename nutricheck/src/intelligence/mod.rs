mod cache;
mod enricher;
mod extractor;
mod lexicon;
pub mod mock;

pub use cache::{cached_complete, CompletionCache};
pub use enricher::{parse_term_list, LlmTermEnricher, TermEnricher};
pub use extractor::{parse_extraction, ClaimExtractor, LlmClaimExtractor};
pub use lexicon::{LexiconEntry, NormalizedPhrase, TermLexicon, MAX_PHRASE_WORDS};
