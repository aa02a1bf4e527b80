use serde::{Deserialize, Serialize};

/// A lexicon entry with its syllables as plain strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub doculect: String,
    pub gloss: String,
    pub glossid: String,
    #[serde(default)]
    pub syllables: Vec<String>,
}

impl Word {
    /// Word id for a lexicon row ID
    pub fn id_for_row(row_id: &str) -> String {
        format!("word-{}", row_id)
    }

    /// Split a syllable id (`word-<ID>-<n>`) into its word id and position
    pub fn split_syllable_id(syllable_id: &str) -> Option<(&str, usize)> {
        let (word_id, n) = syllable_id.rsplit_once('-')?;
        n.parse().ok().map(|n| (word_id, n))
    }
}

/// One syllable of a word, as placed in a column
///
/// Carries a copy of the word's metadata so columns render without a
/// lookup. `syll_order` is the 0-based position of `syllable` within
/// `syllables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Syllable {
    pub id: String,
    pub doculect: String,
    pub gloss: String,
    pub glossid: String,
    pub syll_order: usize,
    pub syllable: String,
    #[serde(default)]
    pub syllables: Vec<String>,
    #[serde(alias = "wordID")]
    pub word_id: String,
}

impl Syllable {
    /// Build the syllable at `order` of `word`
    pub fn of_word(word: &Word, order: usize) -> Option<Self> {
        let syllable = word.syllables.get(order)?;
        Some(Self {
            id: Self::id_for(&word.id, order),
            doculect: word.doculect.clone(),
            gloss: word.gloss.clone(),
            glossid: word.glossid.clone(),
            syll_order: order,
            syllable: syllable.clone(),
            syllables: word.syllables.clone(),
            word_id: word.id.clone(),
        })
    }

    pub fn id_for(word_id: &str, order: usize) -> String {
        format!("{}-{}", word_id, order)
    }
}
