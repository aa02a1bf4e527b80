use std::collections::HashMap;

use crate::error::{CognateError, Result};

/// Merging rules from a maximal schema slot to the fine slots it absorbs
///
/// `"r" => "mnNc"` puts medial, nucleus, nasal coda and coda into the rime.
#[derive(Debug, Clone)]
pub struct MergeRules {
    max_schema: Vec<String>,
    rules: HashMap<String, Vec<String>>,
}

impl MergeRules {
    pub fn new(max_schema: &str, rules: &[(&str, &str)]) -> Self {
        Self {
            max_schema: max_schema.split(' ').map(str::to_string).collect(),
            rules: rules
                .iter()
                .map(|(slot, fine)| (slot.to_string(), fine.chars().map(String::from).collect()))
                .collect(),
        }
    }

    /// Burmish initial / medial / rime / tone layout
    pub fn burmish() -> Self {
        Self::new("i m r t", &[("i", "im"), ("m", "m"), ("r", "mnNc"), ("t", "t")])
    }

    /// Re-segment one syllable into the maximal schema
    ///
    /// `schema` and `tokens` are space-separated and must line up. A token
    /// written `a/b` contributes `b`. Slots that end up empty are dropped.
    /// Returns the merged schema and tokens, both space-separated.
    ///
    /// `("a b c", "A B C")` with `a c` / `{a: ab, c: bc}` → `("a c", "AB BC")`
    pub fn merge(&self, schema: &str, tokens: &str) -> Result<(String, String)> {
        let slots: Vec<&str> = schema.split(' ').collect();
        let segments: Vec<&str> = tokens.split(' ').collect();
        if slots.len() != segments.len() {
            return Err(CognateError::PhonemeMismatch {
                schema: schema.to_string(),
                tokens: tokens.to_string(),
            });
        }
        let by_slot: HashMap<&str, &str> = slots.into_iter().zip(segments).collect();

        let mut merged_slots = Vec::new();
        let mut merged_tokens = Vec::new();
        for slot in &self.max_schema {
            let fine = self
                .rules
                .get(slot)
                .ok_or_else(|| CognateError::UnknownSlot(slot.clone()))?;
            let mut token = String::new();
            for fine_slot in fine {
                if let Some(&letter) = by_slot.get(fine_slot.as_str()) {
                    let letter = letter.split('/').nth(1).unwrap_or(letter);
                    token.push_str(letter);
                }
            }
            if !token.is_empty() {
                merged_slots.push(slot.as_str());
                merged_tokens.push(token);
            }
        }

        Ok((merged_slots.join(" "), merged_tokens.join(" ")))
    }
}
