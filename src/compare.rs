//! Correspondence charts comparing two versions of the transducers.
//!
//! Every column on a board is described, per syllable position, by the most
//! common sound each language under study has there. Columns with the same
//! description form a section. Each row then shows what the old and the new
//! transducers reconstruct for the column and for each language's most
//! common form, so the effect of a transducer edit on the last language
//! (the one under study) is visible at a glance.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::boards::BoardDocument;
use crate::error::{CognateError, Result};
use crate::fst::{Transducer, TransducerSet};
use crate::lexicon::{syllabize, transliterate_down, transliterate_up, Lexicon, MergeRules};
use crate::models::{Chapters, ComparisonRow, FstComparison, Position, RowStatus, Section, Word};
use crate::reconstruct::{Evidence, Shared};

/// A comparison request: two transducer scripts and the board to chart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    /// Languages in display order; the last one is under study
    pub langs_under_study: Vec<String>,
    pub old_transducer: String,
    pub new_transducer: String,
    pub board: BoardDocument,
}

struct ChartWord {
    doculect: String,
    gloss: String,
    syllables: Vec<String>,
    /// Merged (schema, tokens) per morpheme
    parsed: Vec<Option<(String, String)>>,
}

fn chart_words(lexicon: &Lexicon, rules: &MergeRules) -> Result<HashMap<String, ChartWord>> {
    lexicon.require(&["ID", "DOCULECT", "CONCEPT", "GLOSSID", "IPA", "CROSSIDS", "STRUCTURE", "TOKENS"])?;
    log::info!("Processing {} TSV rows...", lexicon.len());

    let mut words = HashMap::new();
    for row in lexicon.rows() {
        if row.get("CROSSIDS").trim().is_empty() {
            log::warn!("SANITY: empty crossid: {}", row.id());
            continue;
        }
        let parsed = row
            .get("STRUCTURE")
            .split(" + ")
            .zip(row.get("TOKENS").split(" + "))
            .map(|(schema, tokens)| match rules.merge(schema, tokens) {
                Ok(merged) => Some(merged),
                Err(e) => {
                    log::warn!("word-{}: {}", row.id(), e);
                    None
                }
            })
            .collect();
        words.insert(
            Word::id_for_row(row.id()),
            ChartWord {
                doculect: row.doculect().to_string(),
                gloss: row.get("CONCEPT").to_string(),
                syllables: syllabize(row.get("IPA")),
                parsed,
            },
        );
    }
    Ok(words)
}

fn locate<'w>(words: &'w HashMap<String, ChartWord>, syllable_id: &str) -> Result<(&'w ChartWord, usize)> {
    let (word_id, n) = Word::split_syllable_id(syllable_id)
        .ok_or_else(|| CognateError::MalformedSyllableId(syllable_id.to_string()))?;
    let word = words
        .get(word_id)
        .filter(|w| n < w.syllables.len())
        .ok_or_else(|| CognateError::UnknownSyllable(syllable_id.to_string()))?;
    Ok((word, n))
}

/// Most frequent item; ties go to the one seen first
pub fn most_common<'a>(items: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (item, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

fn sorted_unique(forms: impl IntoIterator<Item = String>) -> Vec<String> {
    forms.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// What `fsts` reconstruct for a column's syllables
fn back_reconstruct(syllable_ids: &[String], fsts: &TransducerSet, words: &HashMap<String, ChartWord>) -> Result<Shared> {
    let mut evidence = Evidence::new();
    for syllable_id in syllable_ids {
        let (word, n) = match locate(words, syllable_id) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };
        evidence.observe(&word.syllables[n]);
        if let Some(fst) = fsts.get(&word.doculect) {
            evidence.add(&word.doculect, fst.apply_up(&transliterate_up(&word.syllables[n]))?);
        }
    }
    Ok(evidence.shared())
}

/// Look up every charted syllable up both transducer versions in one batch each
fn prefetch_charted(
    board: &BoardDocument,
    words: &HashMap<String, ChartWord>,
    fsts: [&TransducerSet; 2],
) -> Result<()> {
    let charted: Vec<(&str, String)> = board
        .boards
        .values()
        .flat_map(|b| &b.column_ids)
        .filter_map(|column_id| board.columns.get(column_id))
        .flat_map(|column| &column.syllable_ids)
        .filter_map(|syllable_id| locate(words, syllable_id).ok())
        .map(|(word, n)| (word.doculect.as_str(), transliterate_up(&word.syllables[n])))
        .collect();
    for set in fsts {
        set.prefetch_up(charted.iter().cloned())?;
    }
    Ok(())
}

/// Project the inferred forms of every entry down in one batch
fn prefetch_projections<'e>(
    fst: Option<&dyn Transducer>,
    inferred: impl Iterator<Item = &'e Shared>,
) -> Result<()> {
    let Some(fst) = fst else { return Ok(()) };
    let forms: BTreeSet<String> = inferred.flat_map(|shared| shared.forms.iter().cloned()).collect();
    fst.apply_down_all(&forms.into_iter().collect::<Vec<_>>())?;
    Ok(())
}

/// One sound of one syllable in a column
struct Observation<'w> {
    sound: &'w str,
    ipa: &'w str,
    gloss: &'w str,
}

/// A column as it appears in one position's chart
struct ChartEntry {
    gloss: String,
    ipas: Vec<String>,
    last_present: bool,
    other_present: bool,
    old: Shared,
    new: Shared,
}

/// Observations of a column grouped by position, then doculect
fn observe_column<'w>(
    syllable_ids: &[String],
    words: &'w HashMap<String, ChartWord>,
) -> BTreeMap<Position, HashMap<&'w str, Vec<Observation<'w>>>> {
    let mut observed: BTreeMap<Position, HashMap<&str, Vec<Observation<'_>>>> = BTreeMap::new();
    for syllable_id in syllable_ids {
        let (word, n) = match locate(words, syllable_id) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };
        let Some(Some((schema, tokens))) = word.parsed.get(n) else {
            log::warn!("{} has no parsed structure", syllable_id);
            continue;
        };
        for (slot, sound) in schema.split(' ').zip(tokens.split(' ')) {
            let Some(position) = Position::from_slot(slot) else { continue };
            observed
                .entry(position)
                .or_default()
                .entry(word.doculect.as_str())
                .or_default()
                .push(Observation {
                    sound,
                    ipa: &word.syllables[n],
                    gloss: &word.gloss,
                });
        }
    }
    observed
}

/// Render one transducer version's reconstructions for a row
///
/// Returns the summary, the per-language cells, and whether the language
/// under study reproduced the inferred reconstruction.
fn render_side(
    fsts: &TransducerSet,
    inferred: &Shared,
    langs: &[String],
    ipas: &[String],
) -> Result<(Option<String>, Vec<String>, bool)> {
    let summary = (!inferred.forms.is_empty()).then(|| {
        let mut summary = inferred.starred().join(", ");
        if !inferred.strict {
            summary.push('?');
        }
        summary
    });

    let mut matched = false;
    let mut cells = Vec::with_capacity(langs.len());
    for (i, doculect) in langs.iter().enumerate() {
        let under_study = i + 1 == langs.len();
        let fst = fsts.get(doculect);
        let found = match (fst, ipas.get(i)) {
            (Some(fst), Some(ipa)) if ipa != "--" => sorted_unique(fst.apply_up(&transliterate_up(ipa))?),
            _ => Vec::new(),
        };

        if !found.is_empty() {
            let cell: Vec<String> = found
                .iter()
                .map(|w| {
                    if inferred.forms.contains(w) {
                        matched |= under_study;
                        format!("_*{}_", w)
                    } else {
                        format!("*{}", w)
                    }
                })
                .collect();
            cells.push(cell.join(", "));
            continue;
        }

        let mut cell = String::new();
        if let Some(fst) = fst.filter(|_| under_study && !inferred.forms.is_empty()) {
            let mut projected = BTreeSet::new();
            for proto in &inferred.forms {
                projected.extend(fst.apply_down(proto)?.iter().map(|s| transliterate_down(s)));
            }
            cell = format!("≠ †{}", projected.into_iter().collect::<Vec<_>>().join(", "));
        }
        cells.push(cell);
    }
    Ok((summary, cells, matched))
}

/// Chart `board` under the old and new transducers
pub fn compare(
    langs_under_study: &[String],
    board: &BoardDocument,
    lexicon: &Lexicon,
    old_fsts: &TransducerSet,
    new_fsts: &TransducerSet,
) -> Result<FstComparison> {
    let words = chart_words(lexicon, &MergeRules::burmish())?;
    let Some(last_lang) = langs_under_study.last() else {
        return Ok(FstComparison::default());
    };

    prefetch_charted(board, &words, [old_fsts, new_fsts])?;

    log::info!("Processing boards...");
    let mut index: BTreeMap<Position, BTreeMap<String, Vec<ChartEntry>>> = BTreeMap::new();
    for b in board.boards.values() {
        for column_id in &b.column_ids {
            let Some(column) = board.columns.get(column_id) else {
                log::warn!("{} lists unknown column {}", b.id, column_id);
                continue;
            };
            if column.is_empty() {
                continue;
            }

            let old = back_reconstruct(&column.syllable_ids, old_fsts, &words)?;
            let new = back_reconstruct(&column.syllable_ids, new_fsts, &words)?;

            for (position, by_doculect) in observe_column(&column.syllable_ids, &words) {
                let mut description = Vec::with_capacity(langs_under_study.len());
                let mut ipas = Vec::with_capacity(langs_under_study.len());
                let mut senses = Vec::new();
                let mut last_present = false;
                let mut other_present = false;

                for doculect in langs_under_study {
                    let observations = by_doculect.get(doculect.as_str());
                    let Some(sound) = observations.and_then(|o| most_common(o.iter().map(|o| o.sound))) else {
                        description.push("-");
                        ipas.push("--".to_string());
                        continue;
                    };
                    if doculect == last_lang {
                        last_present = true;
                    } else {
                        other_present = true;
                    }
                    let with_sound: Vec<&Observation<'_>> =
                        observations.into_iter().flatten().filter(|o| o.sound == sound).collect();
                    let ipa = most_common(with_sound.iter().map(|o| o.ipa)).unwrap_or_default();
                    description.push(sound);
                    ipas.push(ipa.to_string());
                    senses.extend(with_sound.iter().map(|o| o.gloss));
                }

                index
                    .entry(position)
                    .or_default()
                    .entry(description.join(":"))
                    .or_default()
                    .push(ChartEntry {
                        gloss: most_common(senses).unwrap_or("?").to_string(),
                        ipas,
                        last_present,
                        other_present,
                        old: old.clone(),
                        new: new.clone(),
                    });
            }
        }
    }

    let entries = || index.values().flat_map(|d| d.values()).flatten();
    prefetch_projections(old_fsts.get(last_lang), entries().map(|e| &e.old))?;
    prefetch_projections(new_fsts.get(last_lang), entries().map(|e| &e.new))?;

    let mut chapters = Chapters::default();
    for (position, descriptions) in index {
        for (description, entries) in descriptions {
            match entries.first() {
                Some(first) if first.last_present && first.other_present => {}
                _ => continue,
            }

            let mut rows = Vec::with_capacity(entries.len());
            for entry in entries {
                let (old_reconstruction, old_reconstructions, old_matched) =
                    render_side(old_fsts, &entry.old, langs_under_study, &entry.ipas)?;
                let (new_reconstruction, new_reconstructions, new_matched) =
                    render_side(new_fsts, &entry.new, langs_under_study, &entry.ipas)?;
                rows.push(ComparisonRow {
                    gloss: entry.gloss,
                    ipas: entry.ipas,
                    old_reconstruction,
                    old_reconstructions,
                    new_reconstruction,
                    new_reconstructions,
                    status: RowStatus::from_matches(old_matched, new_matched),
                });
            }
            chapters.get_mut(position).push(Section {
                title: format!("=== {}: {} ===\n", position.title(), description),
                rows,
            });
        }
    }
    Ok(FstComparison { chapters })
}
