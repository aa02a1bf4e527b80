use std::collections::HashMap;
use std::path::Path;

use crate::error::{CognateError, Result};

/// A tab-separated wordlist as written by the alignment pipeline
///
/// The first kept line is the header. Blank lines and lines starting with
/// `#` are dropped before parsing.
#[derive(Debug, Clone)]
pub struct Lexicon {
    index: HashMap<String, usize>,
    records: Vec<csv::StringRecord>,
}

/// One lexicon row, addressed by column name
#[derive(Debug, Clone, Copy)]
pub struct LexiconRow<'a> {
    lexicon: &'a Lexicon,
    record: &'a csv::StringRecord,
}

impl<'a> LexiconRow<'a> {
    /// Field value, or "" when the column or field is absent
    pub fn get(&self, column: &str) -> &'a str {
        self.lexicon
            .index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    pub fn id(&self) -> &'a str {
        self.get("ID")
    }

    pub fn doculect(&self) -> &'a str {
        self.get("DOCULECT")
    }
}

impl Lexicon {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CognateError::file_read(path, e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let kept: String = text
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
            .flat_map(|line| [line, "\n"])
            .collect();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(kept.as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let index = header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        log::debug!("Loaded lexicon with {} rows and columns {:?}", records.len(), header);
        Ok(Self { index, records })
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Fail with the first of `columns` missing from the header
    pub fn require(&self, columns: &[&str]) -> Result<()> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(CognateError::missing_column(*missing)),
            None => Ok(()),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = LexiconRow<'_>> {
        self.records.iter().map(move |record| LexiconRow { lexicon: self, record })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Pipeline name of a lexicon file: its file name up to the first `-`
///
/// `germanic-data.tsv` → `germanic`, `burmish-aligned-final.tsv` → `burmish`
pub fn pipeline_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or("");
    stem.split('-').next().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# generated by lingpy\n\
ID\tDOCULECT\tCONCEPT\tIPA\n\
\n\
1\tMaru\tfire\tmji⁵⁵\n\
#2\tBola\tfire\tmi⁵⁵\n\
3\tBola\twater\tɣɛ⁵⁵\n";

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let lexicon = Lexicon::parse(SAMPLE).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert!(lexicon.has_column("CONCEPT"));
        assert!(!lexicon.has_column("CROSSIDS"));
        let rows: Vec<_> = lexicon.rows().collect();
        assert_eq!(rows[0].id(), "1");
        assert_eq!(rows[1].doculect(), "Bola");
        assert_eq!(rows[1].get("IPA"), "ɣɛ⁵⁵");
        assert_eq!(rows[1].get("CROSSIDS"), "");
    }

    #[test]
    fn test_require_names_missing_column() {
        let lexicon = Lexicon::parse(SAMPLE).unwrap();
        assert!(lexicon.require(&["ID", "IPA"]).is_ok());
        let err = lexicon.require(&["ID", "CROSSIDS", "TOKENS"]).unwrap_err();
        assert!(matches!(err, CognateError::MissingColumn { ref column } if column == "CROSSIDS"));
    }

    #[test]
    fn test_pipeline_name() {
        assert_eq!(pipeline_name(Path::new("germanic-data.tsv")), "germanic");
        assert_eq!(pipeline_name(Path::new("/data/burmish-aligned-final.tsv")), "burmish");
        assert_eq!(pipeline_name(Path::new("lexicon.tsv")), "lexicon");
    }
}
