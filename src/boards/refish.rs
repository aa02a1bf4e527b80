// Refishing: rebuilding boards over an edited board document

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{assemble_boards, BoardDocument, TitleStyle};
use crate::error::Result;
use crate::fst::TransducerSet;
use crate::lexicon::{syllabize, transliterate_up, Lexicon};
use crate::models::{Board, Column, RefishingStatus, Syllable, Word};
use crate::reconstruct::{ColumnReconstruction, DisjointSet, Evidence};

/// A board document sent for refishing, optionally with its own transducer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefishRequest {
    #[serde(flatten)]
    pub document: BoardDocument,
    /// foma source replacing the default refishing transducer
    #[serde(default)]
    pub transducer: Option<String>,
}

/// Columns with refishing statuses and the rebuilt boards
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RefishOutcome {
    pub columns: IndexMap<String, Column>,
    pub boards: IndexMap<String, Board>,
}

#[derive(Debug, Clone)]
struct LexiconSyllable {
    doculect: String,
    syllable: String,
    glossid: String,
}

/// Syllables of every lexicon word, keyed by syllable id
fn lexicon_syllables(lexicon: &Lexicon) -> Result<HashMap<String, LexiconSyllable>> {
    lexicon.require(&["ID", "DOCULECT", "IPA", "GLOSSID"])?;
    let mut syllables = HashMap::new();
    for row in lexicon.rows() {
        let word_id = Word::id_for_row(row.id());
        for (n, syllable) in syllabize(row.get("IPA")).into_iter().enumerate() {
            syllables.insert(
                Syllable::id_for(&word_id, n),
                LexiconSyllable {
                    doculect: row.doculect().to_string(),
                    syllable,
                    glossid: row.get("GLOSSID").to_string(),
                },
            );
        }
    }
    Ok(syllables)
}

/// One syllable of a column with its reconstructions
struct Reconstructed<'a> {
    syllable: &'a LexiconSyllable,
    forms: Vec<String>,
}

/// Columns that share a reconstruction for the same gloss
///
/// These are cognate sets the aligner split but the transducer would join.
/// Groups come back with their columns in document order.
fn strict_overlaps<'e>(evidence: &'e [(String, Vec<Reconstructed<'_>>)]) -> Vec<Vec<&'e str>> {
    let mut ds = DisjointSet::new();
    let mut first_column: HashMap<(&str, &str), &str> = HashMap::new();

    for (column_id, syllables) in evidence {
        ds.add(column_id.as_str(), column_id.as_str());
        for rec in syllables {
            for form in &rec.forms {
                let key = (form.as_str(), rec.syllable.glossid.as_str());
                match first_column.get(&key) {
                    Some(first) => ds.add(*first, column_id.as_str()),
                    None => {
                        first_column.insert(key, column_id.as_str());
                    }
                }
            }
        }
    }

    let position: HashMap<&str, usize> = evidence
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.as_str(), i))
        .collect();
    let mut overlaps: Vec<Vec<&str>> = ds
        .groups()
        .filter(|(_, group)| group.len() > 1)
        .map(|(_, group)| {
            let mut columns: Vec<&str> = group.iter().copied().collect();
            columns.sort_by_key(|c| position[c]);
            columns
        })
        .collect();
    overlaps.sort_by_key(|columns| position[columns[0]]);
    overlaps
}

/// Log the strict overlaps; merging them is left to the user
fn report_strict_overlaps(evidence: &[(String, Vec<Reconstructed<'_>>)]) {
    let syllables_of: HashMap<&str, &Vec<Reconstructed<'_>>> =
        evidence.iter().map(|(id, s)| (id.as_str(), s)).collect();
    for columns in strict_overlaps(evidence) {
        log::debug!("Strict overlap between {:?}", columns);
        for column in columns {
            let report: Vec<String> = syllables_of[column]
                .iter()
                .map(|r| format!("{}{}", r.syllable.glossid, r.syllable.syllable))
                .collect();
            log::debug!("  {}: {}", column, report.join(", "));
        }
    }
}

/// Rebuild boards for `document` with `fsts` and mark what moved
///
/// Empty columns are dropped. A column that had no board and now has one
/// is marked `new`; a column that lost its board is marked `deadfish` and
/// placed on the new board of its last old boardmate that has one.
pub fn refish(document: BoardDocument, lexicon: &Lexicon, fsts: &TransducerSet) -> Result<RefishOutcome> {
    let lexicon_syllables = lexicon_syllables(lexicon)?;
    let BoardDocument {
        columns: mut input_columns,
        boards: old_boards,
    } = document;

    let mut old_board_of_column: HashMap<&str, &str> = HashMap::new();
    for board in old_boards.values() {
        for column_id in &board.column_ids {
            old_board_of_column.insert(column_id.as_str(), board.id.as_str());
        }
    }

    fsts.prefetch_up(
        input_columns
            .values()
            .flat_map(|column| &column.syllable_ids)
            .filter_map(|syllable_id| lexicon_syllables.get(syllable_id))
            .map(|syllable| (syllable.doculect.as_str(), transliterate_up(&syllable.syllable))),
    )?;

    let mut evidence: Vec<(String, Vec<Reconstructed<'_>>)> = Vec::new();
    for (column_id, column) in &input_columns {
        let mut syllables = Vec::new();
        for syllable_id in &column.syllable_ids {
            let Some(syllable) = lexicon_syllables.get(syllable_id) else {
                log::warn!("{} lists {}, which is not in the lexicon", column_id, syllable_id);
                continue;
            };
            let forms = match fsts.get(&syllable.doculect) {
                Some(fst) => fst.apply_up(&transliterate_up(&syllable.syllable))?,
                None => Vec::new(),
            };
            syllables.push(Reconstructed { syllable, forms });
        }
        evidence.push((column_id.clone(), syllables));
    }

    report_strict_overlaps(&evidence);

    let reconstructions: Vec<(String, ColumnReconstruction)> = evidence
        .iter()
        .map(|(column_id, syllables)| {
            let mut column_evidence = Evidence::new();
            for rec in syllables {
                column_evidence.observe(&rec.syllable.syllable);
                column_evidence.add(&rec.syllable.doculect, rec.forms.iter().cloned());
            }
            (column_id.clone(), column_evidence.reconstruct())
        })
        .collect();

    let boarding = assemble_boards(&reconstructions, TitleStyle::REFISH);
    let new_board_of_column = boarding.board_of_column.clone();
    let mut new_boards = boarding.into_map();

    let column_ids: Vec<String> = input_columns.keys().cloned().collect();
    for column_id in column_ids {
        let Some(column) = input_columns.get_mut(&column_id) else { continue };
        if column.is_empty() {
            input_columns.shift_remove(&column_id);
            continue;
        }

        let old_board = old_board_of_column.get(column_id.as_str()).copied();
        let new_board = new_board_of_column.get(&column_id);
        match (old_board, new_board) {
            (None, Some(_)) => column.refishing_status = Some(RefishingStatus::New),
            (Some(old_board), None) => {
                column.refishing_status = Some(RefishingStatus::Deadfish);
                let boardmates = old_boards
                    .get(old_board)
                    .map(|b| b.column_ids.as_slice())
                    .unwrap_or_default();
                let adoptive = boardmates
                    .iter()
                    .filter_map(|mate| new_board_of_column.get(mate))
                    .last();
                if let Some(board) = adoptive.and_then(|id| new_boards.get_mut(id)) {
                    log::debug!("{} reassigned to {} {}", column_id, board.id, board.title);
                    board.column_ids.push(column_id.clone());
                }
            }
            _ => column.refishing_status = None,
        }
    }

    log::info!("Successful refishing.");
    Ok(RefishOutcome {
        columns: input_columns,
        boards: new_boards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::RelationTransducer;

    const LEXICON: &str = "\
ID\tDOCULECT\tCONCEPT\tGLOSSID\tIPA
1\tMaru\tfire\t10\tmji⁵⁵
2\tBola\tfire\t10\tmi⁵⁵
3\tMaru\tfire\t10\tmji⁵³
4\tBola\twater\t20\tɣɛ⁵⁵
5\tMaru\twater\t20\tvɐʔ³¹
";

    fn fsts() -> TransducerSet {
        let mut set = TransducerSet::new();
        set.insert("Maru", RelationTransducer::from_pairs([("mji⁵⁵", "mij"), ("mji⁵³", "mij")]));
        set.insert("Bola", RelationTransducer::from_pairs([("mi⁵⁵", "mij")]));
        set
    }

    fn column(id: &str, syllables: &[&str]) -> (String, Column) {
        let mut column = Column::new(id);
        column.syllable_ids = syllables.iter().map(|s| s.to_string()).collect();
        (id.to_string(), column)
    }

    fn document() -> BoardDocument {
        BoardDocument {
            columns: IndexMap::from([
                column("column-a", &["word-1-0", "word-2-0"]),
                column("column-b", &["word-3-0"]),
                column("column-c", &["word-4-0"]),
                column("column-d", &["word-5-0"]),
                column("column-e", &[]),
            ]),
            boards: IndexMap::from([
                (
                    "board-1".to_string(),
                    Board::new("board-1", "*mij", vec!["column-a".into(), "column-c".into()]),
                ),
                ("board-2".to_string(), Board::new("board-2", "*wa", vec!["column-d".into()])),
            ]),
        }
    }

    #[test]
    fn test_refish_statuses() {
        let lexicon = Lexicon::parse(LEXICON).unwrap();
        let outcome = refish(document(), &lexicon, &fsts()).unwrap();

        assert!(!outcome.columns.contains_key("column-e"));
        assert_eq!(outcome.columns["column-a"].refishing_status, None);
        assert_eq!(outcome.columns["column-b"].refishing_status, Some(RefishingStatus::New));
        assert_eq!(outcome.columns["column-c"].refishing_status, Some(RefishingStatus::Deadfish));
        assert_eq!(outcome.columns["column-d"].refishing_status, Some(RefishingStatus::Deadfish));
    }

    #[test]
    fn test_refish_boards_and_deadfish_adoption() {
        let lexicon = Lexicon::parse(LEXICON).unwrap();
        let outcome = refish(document(), &lexicon, &fsts()).unwrap();

        assert_eq!(outcome.boards.len(), 1);
        let board = &outcome.boards["board-1"];
        assert_eq!(board.title, "*mij");
        // column-c followed its old boardmate column-a; column-d had nowhere to go
        assert_eq!(board.column_ids, vec!["column-a", "column-b", "column-c"]);
    }

    #[test]
    fn test_refish_clears_stale_status() {
        let lexicon = Lexicon::parse(LEXICON).unwrap();
        let mut doc = document();
        doc.columns.get_mut("column-a").unwrap().refishing_status = Some(RefishingStatus::New);
        let outcome = refish(doc, &lexicon, &fsts()).unwrap();
        assert_eq!(outcome.columns["column-a"].refishing_status, None);

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json["columns"]["column-a"].get("refishingStatus").is_none());
        assert_eq!(json["columns"]["column-b"]["refishingStatus"], "new");
    }

    #[test]
    fn test_refish_request_with_transducer() {
        let json = r#"{"columns": {}, "boards": {}, "currentBoard": "board-1",
                       "transducer": "save stack maru.bin"}"#;
        let request: RefishRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.transducer.as_deref(), Some("save stack maru.bin"));
        assert!(request.document.columns.is_empty());
    }

    #[test]
    fn test_deadfish_follows_last_boardmate_with_a_board() {
        let lexicon = Lexicon::parse(
            "ID\tDOCULECT\tGLOSSID\tIPA\n1\tMaru\t1\tpa⁵⁵\n2\tBola\t1\tpa⁵⁵\n\
             3\tMaru\t2\tka⁵⁵\n4\tBola\t2\tka⁵⁵\n5\tMaru\t3\tvɐʔ³¹\n",
        )
        .unwrap();
        let mut set = TransducerSet::new();
        set.insert("Maru", RelationTransducer::from_pairs([("pa⁵⁵", "pa"), ("ka⁵⁵", "ka")]));
        set.insert("Bola", RelationTransducer::from_pairs([("pa⁵⁵", "pa"), ("ka⁵⁵", "ka")]));

        let document = |mates: [&str; 3]| BoardDocument {
            columns: IndexMap::from([
                column("column-a", &["word-1-0", "word-2-0"]),
                column("column-b", &["word-3-0", "word-4-0"]),
                column("column-c", &["word-5-0"]),
            ]),
            boards: IndexMap::from([(
                "board-1".to_string(),
                Board::new("board-1", "*pa", mates.iter().map(|m| m.to_string()).collect()),
            )]),
        };

        let outcome = refish(document(["column-a", "column-b", "column-c"]), &lexicon, &set).unwrap();
        assert_eq!(outcome.boards["board-1"].title, "*ka");
        assert_eq!(outcome.boards["board-1"].column_ids, vec!["column-b", "column-c"]);
        assert_eq!(outcome.boards["board-2"].title, "*pa");
        assert_eq!(outcome.boards["board-2"].column_ids, vec!["column-a"]);

        let outcome = refish(document(["column-b", "column-a", "column-c"]), &lexicon, &set).unwrap();
        assert_eq!(outcome.boards["board-1"].column_ids, vec!["column-b"]);
        assert_eq!(outcome.boards["board-2"].column_ids, vec!["column-a", "column-c"]);
        assert_eq!(outcome.columns["column-c"].refishing_status, Some(RefishingStatus::Deadfish));
    }

    #[test]
    fn test_strict_overlaps_group_same_gloss() {
        let syllable = |doculect: &str, glossid: &str| LexiconSyllable {
            doculect: doculect.to_string(),
            syllable: "mi⁵⁵".to_string(),
            glossid: glossid.to_string(),
        };
        let (maru, bola, atsi) = (syllable("Maru", "10"), syllable("Bola", "10"), syllable("Atsi", "20"));
        let rec = |syllable, forms: &[&str]| Reconstructed {
            syllable,
            forms: forms.iter().map(|f| f.to_string()).collect(),
        };
        let evidence = vec![
            ("column-9".to_string(), vec![rec(&maru, &["mij", "mej"])]),
            // same reconstruction, other gloss
            ("column-3".to_string(), vec![rec(&atsi, &["mij"])]),
            ("column-12".to_string(), vec![rec(&bola, &["mij"])]),
            ("column-4".to_string(), vec![rec(&bola, &["kaj"])]),
        ];

        assert_eq!(strict_overlaps(&evidence), vec![vec!["column-9", "column-12"]]);
        assert!(strict_overlaps(&evidence[1..]).is_empty());
    }

    #[test]
    fn test_refish_keeps_document_order() {
        let lexicon = Lexicon::parse(
            "ID\tDOCULECT\tGLOSSID\tIPA\n11\tMaru\t1\tka\n12\tBola\t1\tka\n\
             13\tMaru\t2\tki\n14\tBola\t2\tki\n15\tMaru\t3\tba\n16\tBola\t3\tba\n",
        )
        .unwrap();
        let pairs = [("ka", "kaj"), ("ki", "aj"), ("ki", "kaj"), ("ba", "baj")];
        let mut set = TransducerSet::new();
        set.insert("Maru", RelationTransducer::from_pairs(pairs));
        set.insert("Bola", RelationTransducer::from_pairs(pairs));

        let json = r#"{"columns": {
            "column-2": {"id": "column-2", "syllableIds": ["word-11-0", "word-12-0"]},
            "column-10": {"id": "column-10", "syllableIds": ["word-13-0", "word-14-0"]},
            "column-3": {"id": "column-3", "syllableIds": ["word-15-0", "word-16-0"]}
        }, "boards": {}}"#;
        let document: BoardDocument = serde_json::from_str(json).unwrap();
        let outcome = refish(document, &lexicon, &set).unwrap();

        assert_eq!(
            outcome.columns.keys().collect::<Vec<_>>(),
            vec!["column-2", "column-10", "column-3"]
        );
        // column-2 comes first, so its *kaj names the merged group and sorts after *baj
        assert_eq!(outcome.boards["board-1"].title, "*baj");
        assert_eq!(outcome.boards["board-2"].title, "*kaj");
        assert_eq!(outcome.boards["board-2"].column_ids, vec!["column-2", "column-10"]);
    }
}
