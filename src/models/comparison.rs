use serde::{Deserialize, Serialize};

/// Syllable position a correspondence chapter is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Initial,
    Medial,
    Rime,
    Tone,
}

impl Position {
    /// Position of a slot letter of a merged syllable structure
    pub fn from_slot(s: &str) -> Option<Self> {
        match s {
            "i" => Some(Position::Initial),
            "m" => Some(Position::Medial),
            "r" => Some(Position::Rime),
            "t" => Some(Position::Tone),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Position::Initial => "Initial",
            Position::Medial => "Medial",
            Position::Rime => "Rime",
            Position::Tone => "Tone",
        }
    }
}

/// Whether the new transducer fixed or broke the language under study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowStatus {
    #[default]
    #[serde(rename = "")]
    Unchanged,
    /// Only the new transducer matches
    #[serde(rename = "smiling")]
    Smiling,
    /// Only the old transducer matched
    #[serde(rename = "frowning")]
    Frowning,
}

impl RowStatus {
    pub fn from_matches(old_matched: bool, new_matched: bool) -> Self {
        match (old_matched, new_matched) {
            (true, false) => RowStatus::Frowning,
            (false, true) => RowStatus::Smiling,
            _ => RowStatus::Unchanged,
        }
    }
}

/// One column's line in a correspondence section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub gloss: String,
    pub ipas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_reconstruction: Option<String>,
    pub old_reconstructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_reconstruction: Option<String>,
    pub new_reconstructions: Vec<String>,
    pub status: RowStatus,
}

/// All columns sharing one correspondence pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub rows: Vec<ComparisonRow>,
}

/// Sections per syllable position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chapters {
    pub i: Vec<Section>,
    pub m: Vec<Section>,
    pub r: Vec<Section>,
    pub t: Vec<Section>,
}

impl Chapters {
    pub fn get(&self, position: Position) -> &Vec<Section> {
        match position {
            Position::Initial => &self.i,
            Position::Medial => &self.m,
            Position::Rime => &self.r,
            Position::Tone => &self.t,
        }
    }

    pub fn get_mut(&mut self, position: Position) -> &mut Vec<Section> {
        match position {
            Position::Initial => &mut self.i,
            Position::Medial => &mut self.m,
            Position::Rime => &mut self.r,
            Position::Tone => &mut self.t,
        }
    }
}

/// Old-versus-new transducer comparison over a board document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FstComparison {
    pub chapters: Chapters,
}
