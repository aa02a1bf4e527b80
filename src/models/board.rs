use serde::{Deserialize, Serialize};

/// Outcome of the last refishing pass for a column
///
/// A column that kept its place carries no status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefishingStatus {
    /// Column was unboarded and is now on a board
    New,
    /// Column was on a board and no new board claimed it
    Deadfish,
}

/// A board: a titled, ordered view over columns
///
/// Boards reference columns by id; the column records live in the
/// application's column map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub column_ids: Vec<String>,
}

impl Board {
    pub fn new(id: impl Into<String>, title: impl Into<String>, column_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            column_ids,
        }
    }

    /// Board id for the n-th generated board (1-based)
    pub fn numbered_id(n: usize) -> String {
        format!("board-{}", n)
    }
}

/// A column: one cognate set, as an ordered list of syllable ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub syllable_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protogloss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refishing_status: Option<RefishingStatus>,
}

impl Column {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            syllable_ids: Vec::new(),
            protogloss: None,
            refishing_status: None,
        }
    }

    /// Column id for a cognate set id
    pub fn id_for_cognate(cognate_id: &str) -> String {
        format!("column-{}", cognate_id)
    }

    pub fn is_empty(&self) -> bool {
        self.syllable_ids.is_empty()
    }
}
