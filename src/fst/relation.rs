use std::collections::HashMap;

use super::Transducer;
use crate::error::Result;

/// A finite transducer given as its list of (surface, proto) pairs
#[derive(Debug, Clone, Default)]
pub struct RelationTransducer {
    up: HashMap<String, Vec<String>>,
    down: HashMap<String, Vec<String>>,
}

impl RelationTransducer {
    pub fn from_pairs<S, P>(pairs: impl IntoIterator<Item = (S, P)>) -> Self
    where
        S: Into<String>,
        P: Into<String>,
    {
        let mut relation = Self::default();
        for (surface, proto) in pairs {
            relation.add(surface, proto);
        }
        relation
    }

    /// Parse `surface<TAB>proto` lines; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Self {
        Self::from_pairs(
            text.lines()
                .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
                .filter_map(|l| l.split_once('\t'))
                .map(|(s, p)| (s.trim(), p.trim())),
        )
    }

    pub fn add(&mut self, surface: impl Into<String>, proto: impl Into<String>) {
        let (surface, proto) = (surface.into(), proto.into());
        let ups = self.up.entry(surface.clone()).or_default();
        if !ups.contains(&proto) {
            ups.push(proto.clone());
        }
        let downs = self.down.entry(proto).or_default();
        if !downs.contains(&surface) {
            downs.push(surface);
        }
    }
}

impl Transducer for RelationTransducer {
    fn apply_up(&self, surface: &str) -> Result<Vec<String>> {
        Ok(self.up.get(surface).cloned().unwrap_or_default())
    }

    fn apply_down(&self, proto: &str) -> Result<Vec<String>> {
        Ok(self.down.get(proto).cloned().unwrap_or_default())
    }
}
