//! Board assembly: grouping cognate sets (columns) into boards.
//!
//! Columns whose reconstructions overlap are merged with a [`DisjointSet`];
//! each resulting group with at least one clean column becomes a board.

pub mod compile;
pub mod refish;

pub use compile::*;
pub use refish::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::models::{Board, Column};
use crate::reconstruct::{shared_reconstructions, ColumnReconstruction, DisjointSet};

/// The board-and-column part of a board document
///
/// Refishing and comparison only need these two maps; the rest of a
/// `CognateApp` document is ignored on input. Both keep document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default)]
    pub columns: IndexMap<String, Column>,
    #[serde(default)]
    pub boards: IndexMap<String, Board>,
}

/// How board titles are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleStyle {
    /// Title of a board without any shared reconstruction
    pub placeholder: &'static str,
    /// Append `?` when the shared reconstruction is lenient
    pub mark_lenient: bool,
}

impl TitleStyle {
    pub const COMPILE: TitleStyle = TitleStyle {
        placeholder: "*?",
        mark_lenient: false,
    };

    pub const REFISH: TitleStyle = TitleStyle {
        placeholder: "*???",
        mark_lenient: true,
    };

    pub fn title(&self, reconstructions: &[String], strict: bool) -> String {
        if reconstructions.is_empty() {
            return self.placeholder.to_string();
        }
        let mut title = reconstructions.join(", ");
        if title.chars().count() > 12 {
            title = title.chars().take(10).collect::<String>() + "...";
        }
        if self.mark_lenient && !strict {
            title.push('?');
        }
        title
    }
}

/// Boards built from a set of reconstructed columns
#[derive(Debug, Clone, Default)]
pub struct Boarding {
    /// Boards in display order, `board-1` first
    pub boards: Vec<Board>,
    pub board_of_column: HashMap<String, String>,
}

impl Boarding {
    pub fn into_map(self) -> IndexMap<String, Board> {
        self.boards.into_iter().map(|b| (b.id.clone(), b)).collect()
    }
}

/// Merge columns sharing a reconstruction and turn clean groups into boards
///
/// `columns` is in processing order: the first column to claim a
/// reconstruction is the one later columns are merged with. Board members
/// keep that order.
pub fn assemble_boards(columns: &[(String, ColumnReconstruction)], style: TitleStyle) -> Boarding {
    let by_id: HashMap<&str, &ColumnReconstruction> =
        columns.iter().map(|(id, rec)| (id.as_str(), rec)).collect();
    let position: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.as_str(), i))
        .collect();

    let mut ds = DisjointSet::new();
    let mut first_column_of_reconstruction: HashMap<&str, &str> = HashMap::new();
    for (column_id, rec) in columns {
        ds.add(column_id.as_str(), column_id.as_str());
        for form in &rec.forms {
            match first_column_of_reconstruction.get(form.as_str()) {
                Some(first) => ds.add(*first, column_id.as_str()),
                None => {
                    first_column_of_reconstruction.insert(form.as_str(), column_id.as_str());
                }
            }
        }
    }

    let mut leaders: Vec<&str> = ds.leaders().copied().collect();
    leaders.sort_by(|a, b| by_id[a].sort_key.cmp(&by_id[b].sort_key));

    let mut boarding = Boarding::default();
    for leader in leaders {
        let Some(group) = ds.get(&leader) else { continue };
        let mut members: Vec<&str> = group.iter().copied().collect();
        members.sort_by_key(|m| position[m]);

        if !members.iter().any(|m| by_id[m].clean) {
            continue;
        }
        let mut strict = members.iter().all(|m| by_id[m].strict);

        let sets: Vec<BTreeSet<String>> = members
            .iter()
            .map(|m| by_id[m].forms.iter().cloned().collect())
            .collect();
        let shared = shared_reconstructions(&sets);
        strict &= shared.strict;

        let board_id = Board::numbered_id(boarding.boards.len() + 1);
        for member in &members {
            boarding.board_of_column.insert(member.to_string(), board_id.clone());
        }
        let title = style.title(&shared.forms, strict);
        log::debug!("{} {:?}: {} column(s)", board_id, title, members.len());
        boarding.boards.push(Board::new(
            board_id,
            title,
            members.iter().map(|m| m.to_string()).collect(),
        ));
    }
    boarding
}
