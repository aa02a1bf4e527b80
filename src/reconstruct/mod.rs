//! Reconstruction inference for cognate sets.
//!
//! Each daughter form of a cognate set is run up its doculect's transducer.
//! The reconstructions every doculect agrees on are the strict answer; when
//! there are none, any reconstruction two doculects agree on is kept and
//! the answer is marked lenient.

pub mod disjoint;

pub use disjoint::DisjointSet;

use std::collections::{BTreeMap, BTreeSet};

/// Reconstructions shared by a family of candidate sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shared {
    pub forms: Vec<String>,
    pub strict: bool,
}

impl Shared {
    /// Forms prefixed with `*`
    pub fn starred(&self) -> Vec<String> {
        self.forms.iter().map(|f| format!("*{}", f)).collect()
    }
}

/// Intersection of all sets, falling back to the union of pairwise intersections
pub fn shared_reconstructions(sets: &[BTreeSet<String>]) -> Shared {
    let Some((first, rest)) = sets.split_first() else {
        return Shared { forms: Vec::new(), strict: true };
    };

    let all: BTreeSet<String> = rest
        .iter()
        .fold(first.clone(), |acc, set| acc.intersection(set).cloned().collect());
    if !all.is_empty() {
        return Shared {
            forms: all.into_iter().collect(),
            strict: true,
        };
    }

    let mut lenient = BTreeSet::new();
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            lenient.extend(a.intersection(b).cloned());
        }
    }
    Shared {
        forms: lenient.into_iter().collect(),
        strict: false,
    }
}

/// Ordering of columns and boards: reconstructed ones first, by reconstruction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Reconstructed(String),
    Unreconstructed(String),
}

/// Transducer evidence collected for one cognate set
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    per_doculect: BTreeMap<String, BTreeSet<String>>,
    first_form: Option<String>,
}

/// What a cognate set reconstructs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReconstruction {
    /// Starred reconstructions, sorted
    pub forms: Vec<String>,
    pub strict: bool,
    /// Reconstructed, and from more than one doculect
    pub clean: bool,
    pub sort_key: SortKey,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a daughter form, whether or not it reconstructs
    pub fn observe(&mut self, form: &str) {
        if self.first_form.is_none() {
            self.first_form = Some(form.to_string());
        }
    }

    /// Record reconstructions of one form; empty results are ignored
    pub fn add(&mut self, doculect: &str, reconstructions: impl IntoIterator<Item = String>) {
        let mut reconstructions = reconstructions.into_iter().peekable();
        if reconstructions.peek().is_none() {
            return;
        }
        self.per_doculect
            .entry(doculect.to_string())
            .or_default()
            .extend(reconstructions);
    }

    /// Unstarred shared reconstructions
    pub fn shared(&self) -> Shared {
        let sets: Vec<BTreeSet<String>> = self.per_doculect.values().cloned().collect();
        shared_reconstructions(&sets)
    }

    pub fn reconstruct(&self) -> ColumnReconstruction {
        let shared = self.shared();
        let forms = shared.starred();
        let sort_key = match forms.first() {
            Some(first) => SortKey::Reconstructed(first.clone()),
            None => SortKey::Unreconstructed(self.first_form.clone().unwrap_or_default()),
        };
        ColumnReconstruction {
            clean: !forms.is_empty() && self.per_doculect.len() > 1,
            strict: shared.strict,
            forms,
            sort_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(forms: &[&str]) -> BTreeSet<String> {
        forms.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_strict_ancestor() {
        let shared = shared_reconstructions(&[
            set(&["dzit", "dzut"]),
            set(&["dzut", "tsut"]),
            set(&["dzut", "dzud"]),
        ]);
        assert!(shared.strict);
        assert_eq!(shared.forms, vec!["dzut"]);
    }

    #[test]
    fn test_non_strict_ancestor() {
        // dzut isn't a possible reconstruction in the third lect
        let shared = shared_reconstructions(&[
            set(&["dzit", "dzut"]),
            set(&["dzut", "tsut"]),
            set(&["dzud"]),
        ]);
        assert!(!shared.strict);
        assert_eq!(shared.forms, vec!["dzut"]);
        assert_eq!(shared.starred(), vec!["*dzut"]);
    }

    #[test]
    fn test_no_agreement() {
        let shared = shared_reconstructions(&[set(&["a"]), set(&["b"])]);
        assert!(!shared.strict);
        assert!(shared.forms.is_empty());

        let shared = shared_reconstructions(&[]);
        assert!(shared.strict);
        assert!(shared.forms.is_empty());
    }

    #[test]
    fn test_single_doculect_is_strict_but_not_clean() {
        let mut evidence = Evidence::new();
        evidence.observe("mi");
        evidence.add("Maru", vec!["mej".to_string(), "mij".to_string()]);
        let rec = evidence.reconstruct();
        assert_eq!(rec.forms, vec!["*mej", "*mij"]);
        assert!(rec.strict);
        assert!(!rec.clean);
        assert_eq!(rec.sort_key, SortKey::Reconstructed("*mej".to_string()));
    }

    #[test]
    fn test_unreconstructed_sorts_by_first_form() {
        let mut evidence = Evidence::new();
        evidence.observe("ka");
        evidence.observe("ga");
        evidence.add("Bola", Vec::new());
        let rec = evidence.reconstruct();
        assert!(rec.forms.is_empty());
        assert!(!rec.clean);
        assert_eq!(rec.sort_key, SortKey::Unreconstructed("ka".to_string()));
        assert!(SortKey::Reconstructed("*zz".into()) < SortKey::Unreconstructed("a".into()));
    }

    #[test]
    fn test_clean_needs_two_doculects() {
        let mut evidence = Evidence::new();
        evidence.add("Maru", vec!["mij".to_string()]);
        evidence.add("Bola", vec!["mij".to_string(), "mej".to_string()]);
        let rec = evidence.reconstruct();
        assert_eq!(rec.forms, vec!["*mij"]);
        assert!(rec.clean);
    }
}
