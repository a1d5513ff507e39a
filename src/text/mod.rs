//! Transcript text repair.
//!
//! Speech-to-text output tends to arrive with uneven casing, stray spacing
//! around punctuation, and (for Vietnamese) missing diacritics. These
//! modules clean that up without touching the wording itself.

pub mod normalizer;
pub mod vietnamese;

pub use normalizer::TextNormalizer;
