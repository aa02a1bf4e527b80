// Lexicon input: wordlist tables, syllable segmentation, structure merging

pub mod table;
pub mod syllable;
pub mod phonemes;

pub use table::*;
pub use syllable::*;
pub use phonemes::*;
