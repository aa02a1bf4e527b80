// Syllable segmentation and transducer transliteration

use regex::Regex;
use std::sync::OnceLock;

const MACRON_BELOW: char = '\u{0331}';
const TILDE_ABOVE: char = '\u{0303}';

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[ ◦¹²³⁴⁵˩˨˧˦˥]+").expect("separator pattern is valid"))
}

/// Split a transcription into syllables
///
/// A syllable ends at a run of spaces, `◦`, superscript tone digits or Chao
/// tone letters. The run stays attached to the syllable it closes, minus its
/// spaces and `◦`. A trailing empty piece is dropped.
///
/// `"mi⁵⁵ ma³¹"` → `["mi⁵⁵", "ma³¹"]`, `"a◦b◦"` → `["a", "b"]`
pub fn syllabize(text: &str) -> Vec<String> {
    let mut syllables = Vec::new();
    let mut last = 0;
    for run in separator().find_iter(text) {
        let tone = run.as_str().trim_matches(|c| c == '◦' || c == ' ');
        syllables.push(format!("{}{}", &text[last..run.start()], tone));
        last = run.end();
    }
    if last < text.len() {
        syllables.push(text[last..].to_string());
    }
    syllables
}

/// The `index`-th syllable of a transcription
pub fn fetch_syllable(text: &str, index: usize) -> Option<String> {
    syllabize(text).into_iter().nth(index)
}

/// Join syllables back with the `index`-th one in angle brackets
pub fn emphasize_syllables(syllables: &[String], index: usize) -> String {
    syllables
        .iter()
        .enumerate()
        .map(|(i, s)| if i == index { format!("<{}>", s) } else { s.clone() })
        .collect()
}

/// `emphasize_syllable("mi ma mu", 1)` → `"mi<ma>mu"`
pub fn emphasize_syllable(text: &str, index: usize) -> String {
    emphasize_syllables(&syllabize(text), index)
}

/// Replace combining diacritics with the ASCII stand-ins the transducers read
pub fn transliterate_up(form: &str) -> String {
    form.replace(MACRON_BELOW, "_")
        .replace(TILDE_ABOVE, "~")
        .replace("_~", "~_")
}

/// Inverse of [`transliterate_up`] for transducer output
pub fn transliterate_down(form: &str) -> String {
    form.replace('_', &MACRON_BELOW.to_string())
        .replace('~', &TILDE_ABOVE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllabize_on_separators() {
        assert_eq!(syllabize("mi ma mu"), vec!["mi", "ma", "mu"]);
        assert_eq!(syllabize("a◦b◦"), vec!["a", "b"]);
        assert_eq!(syllabize("a◦b"), vec!["a", "b"]);
    }

    #[test]
    fn test_syllabize_keeps_tones() {
        assert_eq!(syllabize("mi⁵⁵ma³¹"), vec!["mi⁵⁵", "ma³¹"]);
        assert_eq!(syllabize("mi⁵⁵ ma³¹"), vec!["mi⁵⁵", "ma³¹"]);
        assert_eq!(syllabize("ŋa˧˩ tʃi˥"), vec!["ŋa˧˩", "tʃi˥"]);
    }

    #[test]
    fn test_syllabize_edge_cases() {
        assert!(syllabize("").is_empty());
        assert_eq!(syllabize("ka"), vec!["ka"]);
        assert_eq!(syllabize(" ka"), vec!["", "ka"]);
    }

    #[test]
    fn test_fetch_and_emphasize() {
        assert_eq!(fetch_syllable("mi ma mu", 1).as_deref(), Some("ma"));
        assert_eq!(fetch_syllable("mi ma mu", 3), None);
        assert_eq!(emphasize_syllable("mi ma mu", 1), "mi<ma>mu");
        assert_eq!(emphasize_syllable("mi ma mu", 5), "mimamu");
    }

    #[test]
    fn test_transliteration() {
        let creaky_nasal = "a\u{0331}\u{0303}";
        assert_eq!(transliterate_up(creaky_nasal), "a~_");
        assert_eq!(transliterate_up("ka\u{0331}"), "ka_");
        assert_eq!(transliterate_down("ka_"), "ka\u{0331}");
        assert_eq!(transliterate_down("a~"), "a\u{0303}");
    }
}
