// Compiling a lexicon into a board document

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{assemble_boards, TitleStyle};
use crate::error::Result;
use crate::fst::TransducerSet;
use crate::lexicon::{fetch_syllable, syllabize, transliterate_down, transliterate_up, Lexicon, LexiconRow};
use crate::models::{Board, CognateApp, Column, Syllable, Word};
use crate::reconstruct::{ColumnReconstruction, Evidence};

/// Cognate column used by partial-cognate lexicons unless told otherwise
pub const DEFAULT_COGNATE_COLUMN: &str = "COGIDS";

/// Transducer lookups cached in the board document, doculect → form → results
type FstTable = BTreeMap<String, BTreeMap<String, Vec<String>>>;

fn sorted_unique(forms: impl IntoIterator<Item = String>) -> Vec<String> {
    forms.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn word_of_row(row: &LexiconRow<'_>, syllables: Vec<String>) -> Word {
    Word {
        id: Word::id_for_row(row.id()),
        doculect: row.doculect().to_string(),
        gloss: row.get("CONCEPT").to_string(),
        glossid: row.get("GLOSSID").to_string(),
        syllables,
    }
}

/// Display rank of a doculect within a column: Old Burmese, then Rangoon
fn doculect_rank(doculect: &str) -> u8 {
    match doculect {
        "Old_Burmese" => 0,
        "Rangoon" => 1,
        _ => 2,
    }
}

/// All doculects of a lexicon, sorted
pub fn lexicon_doculects(lexicon: &Lexicon) -> Vec<String> {
    lexicon
        .rows()
        .map(|row| row.doculect().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn fst_value(table: FstTable) -> Result<Value> {
    Ok(serde_json::to_value(table)?)
}

/// Compile a lexicon whose cognate sets are syllable-level cross ids
///
/// Needs `ID DOCULECT CONCEPT GLOSSID IPA CROSSIDS`. Words are split into
/// syllables from their IPA; the n-th cross id names the cognate set of the
/// n-th syllable.
pub fn compile_crossids(lexicon: &Lexicon, fsts: &TransducerSet) -> Result<CognateApp> {
    lexicon.require(&["ID", "DOCULECT", "CONCEPT", "GLOSSID", "IPA", "CROSSIDS"])?;
    log::info!("Processing {} TSV rows...", lexicon.len());

    let mut app = CognateApp::default();
    let mut crossid_order: Vec<String> = Vec::new();
    let mut rows_of_crossid: HashMap<String, Vec<(usize, LexiconRow<'_>)>> = HashMap::new();

    for row in lexicon.rows() {
        let crossids = row.get("CROSSIDS");
        if crossids.trim().is_empty() {
            log::warn!("SANITY: empty crossid: {}", row.id());
            continue;
        }

        let word = word_of_row(&row, syllabize(row.get("IPA")));
        for (syl, crossid) in crossids.split(' ').enumerate() {
            let Some(syllable) = Syllable::of_word(&word, syl) else {
                log::warn!("{} has more cross ids than syllables", word.id);
                break;
            };
            app.syllables.insert(syllable.id.clone(), syllable);
            rows_of_crossid
                .entry(crossid.to_string())
                .or_insert_with(|| {
                    crossid_order.push(crossid.to_string());
                    Vec::new()
                })
                .push((syl, row));
        }
        app.words.insert(word.id.clone(), word);
    }

    fsts.prefetch_up(rows_of_crossid.values().flatten().map(|(syl, row)| {
        let form = fetch_syllable(row.get("IPA"), *syl).unwrap_or_default();
        (row.doculect(), transliterate_up(&form))
    }))?;

    let mut fst_up: FstTable = fsts.doculects().map(|d| (d.to_string(), BTreeMap::new())).collect();
    let mut attested: BTreeSet<String> = BTreeSet::new();
    let mut reconstructions: Vec<(String, ColumnReconstruction)> = Vec::new();

    for crossid in &crossid_order {
        let mut members = rows_of_crossid.remove(crossid).unwrap_or_default();
        members.sort_by(|(_, a), (_, b)| {
            a.get("CONCEPT")
                .cmp(&b.get("CONCEPT"))
                .then(doculect_rank(a.doculect()).cmp(&doculect_rank(b.doculect())))
                .then(a.doculect().cmp(&b.doculect()))
        });

        let mut column = Column::new(Column::id_for_cognate(crossid));
        let mut evidence = Evidence::new();
        for (syl, row) in &members {
            column
                .syllable_ids
                .push(Syllable::id_for(&Word::id_for_row(row.id()), *syl));

            let form = fetch_syllable(row.get("IPA"), *syl).unwrap_or_default();
            evidence.observe(&form);
            if let Some(fst) = fsts.get(row.doculect()) {
                let surface = transliterate_up(&form);
                let found = sorted_unique(fst.apply_up(&surface)?);
                attested.extend(found.iter().cloned());
                evidence.add(row.doculect(), found.iter().cloned());
                fst_up
                    .entry(row.doculect().to_string())
                    .or_default()
                    .insert(surface, found);
            }
        }

        reconstructions.push((column.id.clone(), evidence.reconstruct()));
        app.columns.insert(column.id.clone(), column);
    }

    let attested: Vec<String> = attested.into_iter().collect();
    fsts.prefetch_down(&attested)?;

    let mut fst_down: FstTable = BTreeMap::new();
    for doculect in fsts.doculects() {
        let Some(fst) = fsts.get(doculect) else { continue };
        let table = fst_down.entry(doculect.to_string()).or_default();
        for proto in &attested {
            let surfaces = fst.apply_down(proto)?;
            table.insert(
                proto.clone(),
                sorted_unique(surfaces.iter().map(|s| transliterate_down(s))),
            );
        }
    }

    app.boards = assemble_boards(&reconstructions, TitleStyle::COMPILE).into_map();
    app.current_board = Board::numbered_id(1);
    app.fst_doculects = Some(fsts.doculects().map(|d| Value::String(d.to_string())).collect());
    app.fst_up = Some(fst_value(fst_up)?);
    app.fst_down = Some(fst_value(fst_down)?);

    log::info!(
        "Compiled {} words into {} columns on {} boards",
        app.words.len(),
        app.columns.len(),
        app.boards.len()
    );
    Ok(app)
}

/// Compile a lexicon with morpheme-level (partial) cognate ids
///
/// Needs `ID DOCULECT CONCEPT GLOSSID TOKENS` and `cognate_column`.
/// Syllables are the ` + `-separated morphemes of TOKENS with their
/// segments joined by `.`. `fsts` must be keyed by the lexicon's doculect
/// names.
///
/// Strict reconstructions are starred like lenient ones, so a strict and a
/// lenient result for the same proto-form land on the same board. Earlier
/// versions of the tool starred only lenient results and kept them apart.
pub fn compile_cognates(lexicon: &Lexicon, fsts: &TransducerSet, cognate_column: &str) -> Result<CognateApp> {
    lexicon.require(&["ID", "DOCULECT", "CONCEPT", "GLOSSID", "TOKENS", cognate_column])?;

    let doculects = lexicon_doculects(lexicon);
    let mut fst_up: FstTable = doculects.iter().map(|d| (d.clone(), BTreeMap::new())).collect();
    let fst_down: FstTable = doculects.iter().map(|d| (d.clone(), BTreeMap::new())).collect();

    let mut app = CognateApp::default();
    let mut cognate_order: Vec<String> = Vec::new();
    let mut forms_of_cognate: HashMap<String, Vec<(String, String)>> = HashMap::new();

    for row in lexicon.rows() {
        let syllables: Vec<String> = row
            .get("TOKENS")
            .split(" + ")
            .map(|morpheme| morpheme.split(' ').collect::<Vec<_>>().join("."))
            .collect();
        let word = word_of_row(&row, syllables);

        for (syl, cogid) in row.get(cognate_column).split(' ').enumerate() {
            let Some(syllable) = Syllable::of_word(&word, syl) else {
                log::warn!("{} has more cognate ids than morphemes", word.id);
                break;
            };

            let column_id = Column::id_for_cognate(cogid);
            app.columns
                .entry(column_id.clone())
                .or_insert_with(|| Column::new(column_id))
                .syllable_ids
                .push(syllable.id.clone());

            forms_of_cognate
                .entry(cogid.to_string())
                .or_insert_with(|| {
                    cognate_order.push(cogid.to_string());
                    Vec::new()
                })
                .push((syllable.syllable.clone(), word.doculect.clone()));

            app.syllables.insert(syllable.id.clone(), syllable);
        }
        app.words.insert(word.id.clone(), word);
    }

    fsts.prefetch_up(
        forms_of_cognate
            .values()
            .flatten()
            .map(|(form, doculect)| (doculect.as_str(), transliterate_up(&form.replace('.', "")))),
    )?;

    let mut reconstructions: Vec<(String, ColumnReconstruction)> = Vec::new();
    for cogid in &cognate_order {
        let mut evidence = Evidence::new();
        for (form, doculect) in forms_of_cognate.get(cogid).into_iter().flatten() {
            evidence.observe(form);
            if let Some(fst) = fsts.get(doculect) {
                let surface = transliterate_up(&form.replace('.', ""));
                let found = sorted_unique(fst.apply_up(&surface)?);
                evidence.add(doculect, found.iter().cloned());
                fst_up.entry(doculect.clone()).or_default().insert(form.clone(), found);
            }
        }
        reconstructions.push((Column::id_for_cognate(cogid), evidence.reconstruct()));
    }

    app.boards = assemble_boards(&reconstructions, TitleStyle::COMPILE).into_map();
    app.current_board = Board::numbered_id(1);
    app.fst_doculects = Some(doculects.into_iter().map(Value::String).collect());
    app.fst_up = Some(fst_value(fst_up)?);
    app.fst_down = Some(fst_value(fst_down)?);
    Ok(app)
}
