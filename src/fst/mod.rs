//! Finite-state transducers mapping daughter-language forms to proto-forms.
//!
//! Transducers are compiled and run by foma, an external tool; this module
//! only drives it. [`Transducer::apply_up`] goes from a surface (daughter)
//! form to candidate reconstructions, [`Transducer::apply_down`] goes back.

pub mod foma;
pub mod relation;

#[cfg(all(test, unix))]
pub(crate) mod fake_tools;

pub use foma::*;
pub use relation::*;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::Result;

/// A two-way mapping between surface forms and proto-forms
pub trait Transducer: Send + Sync {
    /// Proto-forms the surface form can descend from
    fn apply_up(&self, surface: &str) -> Result<Vec<String>>;

    /// Surface forms the proto-form yields
    fn apply_down(&self, proto: &str) -> Result<Vec<String>>;

    /// [`Transducer::apply_up`] over many forms, answers in input order
    fn apply_up_all(&self, surfaces: &[String]) -> Result<Vec<Vec<String>>> {
        surfaces.iter().map(|s| self.apply_up(s)).collect()
    }

    /// [`Transducer::apply_down`] over many forms, answers in input order
    fn apply_down_all(&self, protos: &[String]) -> Result<Vec<Vec<String>>> {
        protos.iter().map(|p| self.apply_down(p)).collect()
    }
}

/// Doculect name to foma stack name, e.g. `Old_Burmese` → `burmese`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstIndex {
    stacks: BTreeMap<String, String>,
}

impl FstIndex {
    pub fn new() -> Self {
        Self { stacks: BTreeMap::new() }
    }

    /// Stacks of the Burmish refishing transducer
    pub fn burmish() -> Self {
        let mut index = Self::new();
        for (doculect, stack) in [
            ("Old_Burmese", "burmese"),
            ("Achang_Longchuan", "ngochang"),
            ("Xiandao", "xiandao"),
            ("Maru", "maru"),
            ("Bola", "bola"),
            ("Atsi", "atsi"),
            ("Lashi", "lashi"),
        ] {
            index.insert(doculect, stack);
        }
        index
    }

    pub fn insert(&mut self, doculect: impl Into<String>, stack: impl Into<String>) {
        self.stacks.insert(doculect.into(), stack.into());
    }

    pub fn stack(&self, doculect: &str) -> Option<&str> {
        self.stacks.get(doculect).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stacks.iter().map(|(d, s)| (d.as_str(), s.as_str()))
    }
}

impl Default for FstIndex {
    fn default() -> Self {
        Self::burmish()
    }
}

/// The transducers available for one run, keyed by doculect
#[derive(Clone, Default)]
pub struct TransducerSet {
    transducers: BTreeMap<String, Arc<dyn Transducer>>,
    // keeps compiled stacks on disk while the set is alive
    _workdir: Option<Arc<tempfile::TempDir>>,
}

impl TransducerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_workdir(workdir: tempfile::TempDir) -> Self {
        Self {
            transducers: BTreeMap::new(),
            _workdir: Some(Arc::new(workdir)),
        }
    }

    pub fn insert(&mut self, doculect: impl Into<String>, transducer: impl Transducer + 'static) {
        self.transducers.insert(doculect.into(), Arc::new(transducer));
    }

    pub fn get(&self, doculect: &str) -> Option<&dyn Transducer> {
        self.transducers.get(doculect).map(|t| t.as_ref())
    }

    pub fn doculects(&self) -> impl Iterator<Item = &str> {
        self.transducers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.transducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transducers.is_empty()
    }

    /// Run each doculect's forms up its transducer in one batch
    ///
    /// Forms of doculects without a transducer are ignored. Transducers
    /// that cache their answers (foma) serve later single lookups from it.
    pub fn prefetch_up<'a>(
        &self,
        forms: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Result<()> {
        for (doculect, batch) in group_by_doculect(forms) {
            if let Some(fst) = self.get(doculect) {
                fst.apply_up_all(&batch)?;
            }
        }
        Ok(())
    }

    /// Run the same proto-forms down every transducer in one batch each
    pub fn prefetch_down(&self, protos: &[String]) -> Result<()> {
        for fst in self.transducers.values() {
            fst.apply_down_all(protos)?;
        }
        Ok(())
    }
}

fn group_by_doculect<'a>(
    forms: impl IntoIterator<Item = (&'a str, String)>,
) -> BTreeMap<&'a str, Vec<String>> {
    let mut grouped: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for (doculect, form) in forms {
        grouped.entry(doculect).or_default().insert(form);
    }
    grouped
        .into_iter()
        .map(|(doculect, set)| (doculect, set.into_iter().collect()))
        .collect()
}

impl std::fmt::Debug for TransducerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.transducers.keys()).finish()
    }
}
