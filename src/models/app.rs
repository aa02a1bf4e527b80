use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::{Board, Column, Syllable, Word};

/// Root board document exchanged with the board UI
///
/// `fst_index`, `max_column`, `search_columns`, `fst_doculects`, `fst_up`
/// and `fst_down` are owned by the UI and the transducer tooling; they are
/// carried as opaque JSON and never interpreted here. Absent ones stay
/// absent on output. Maps keep document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognateApp {
    #[serde(default)]
    pub boards: IndexMap<String, Board>,
    #[serde(default)]
    pub columns: IndexMap<String, Column>,
    #[serde(default)]
    pub current_board: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fst_index: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_column: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_columns: Option<Vec<Value>>,
    #[serde(default)]
    pub syllables: IndexMap<String, Syllable>,
    #[serde(default)]
    pub words: IndexMap<String, Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fst_doculects: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fst_down: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fst_up: Option<Value>,
}

// a field given as null is kept as null
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// A reference from one record to a record that is not in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    Column { board_id: String, column_id: String },
    Syllable { column_id: String, syllable_id: String },
    Word { syllable_id: String, word_id: String },
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DanglingReference::Column { board_id, column_id } => {
                write!(f, "board {} lists unknown column {}", board_id, column_id)
            }
            DanglingReference::Syllable { column_id, syllable_id } => {
                write!(f, "column {} lists unknown syllable {}", column_id, syllable_id)
            }
            DanglingReference::Word { syllable_id, word_id } => {
                write!(f, "syllable {} belongs to unknown word {}", syllable_id, word_id)
            }
        }
    }
}

impl CognateApp {
    /// All board → column, column → syllable and syllable → word references
    /// that do not resolve, in map order
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();

        for board in self.boards.values() {
            for column_id in &board.column_ids {
                if !self.columns.contains_key(column_id) {
                    dangling.push(DanglingReference::Column {
                        board_id: board.id.clone(),
                        column_id: column_id.clone(),
                    });
                }
            }
        }

        for column in self.columns.values() {
            for syllable_id in &column.syllable_ids {
                if !self.syllables.contains_key(syllable_id) {
                    dangling.push(DanglingReference::Syllable {
                        column_id: column.id.clone(),
                        syllable_id: syllable_id.clone(),
                    });
                }
            }
        }

        for syllable in self.syllables.values() {
            if !self.words.contains_key(&syllable.word_id) {
                dangling.push(DanglingReference::Word {
                    syllable_id: syllable.id.clone(),
                    word_id: syllable.word_id.clone(),
                });
            }
        }

        dangling
    }

    /// Ids of columns that no board lists
    pub fn unboarded_columns(&self) -> Vec<&str> {
        let boarded: std::collections::HashSet<&str> = self
            .boards
            .values()
            .flat_map(|b| b.column_ids.iter().map(String::as_str))
            .collect();
        self.columns
            .keys()
            .map(String::as_str)
            .filter(|id| !boarded.contains(id))
            .collect()
    }
}
