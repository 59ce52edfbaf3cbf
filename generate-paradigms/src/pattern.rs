//! The inflection pattern registry.
//!
//! A lemma's paradigm is first described by a borrowed [`PatternCandidate`].
//! The registry either merges the candidate into a structurally equal pattern
//! or freezes it into a new owned [`InflectionPattern`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use grammar_utils::{Category, Grammeme, GrammemeSet, Inflection};
use indexmap::IndexSet;
use itertools::Itertools;

use crate::error::RecordError;

/// Index of a pattern in its registry. Stable for the registry's lifetime,
/// unlike the pattern's printed id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(usize);

/// A pattern described by one lemma, used to look up an existing pattern.
#[derive(Debug, Clone, Copy)]
pub struct PatternCandidate<'a> {
    pub lemma_suffix: &'a str,
    pub grammemes: &'a GrammemeSet,
    pub suffixes: &'a [Inflection],
}

impl PatternCandidate<'_> {
    fn is_inflectional(&self) -> bool {
        is_inflectional(self.suffixes)
    }
}

#[derive(Debug, Clone)]
pub struct InflectionPattern {
    id: u32,
    count: u32,
    lemma_suffixes: IndexSet<String>,
    grammeme_variants: IndexSet<GrammemeSet>,
    suffixes: Vec<Inflection>,
    inflectional: bool,
}

/// A pattern carries paradigm information when its suffixes differ in
/// grammemes, or when its only suffix has a grammeme beyond part of speech.
/// Patterns made only of ignorable suffixes never do.
pub fn is_inflectional(suffixes: &[Inflection]) -> bool {
    let Some(first) = suffixes.first() else {
        return false;
    };
    let mut distinct =
        suffixes.len() == 1 && first.grammemes.iter().any(|grammeme| !grammeme.is_control());
    let mut non_ignorable = false;
    for suffix in suffixes {
        non_ignorable |= !suffix.grammemes.is_ignorable();
        distinct |= suffix.grammemes != first.grammemes;
        if non_ignorable && distinct {
            return true;
        }
    }
    false
}

/// Same size, and every inflection of each list appears in the other.
/// Rarity is ignored.
fn same_inflections(existing: &[Inflection], incoming: &[Inflection]) -> bool {
    existing.len() == incoming.len()
        && incoming.iter().all(|inflection| existing.contains(inflection))
        && existing.iter().all(|inflection| incoming.contains(inflection))
}

/// Reconciles the rarity of two suffix lists holding the same inflections.
///
/// An inflection whose rarity disagrees between the lists ends up rare only
/// when another inflection with the same grammemes is non-rare on both sides.
/// Otherwise the non-rare contribution wins. The result does not depend on
/// which list came first.
///
/// Returns `None` when the lists are not the same multiset of inflections.
pub fn merged_suffixes<'a>(
    existing: &'a [Inflection],
    incoming: &[Inflection],
) -> Option<Cow<'a, [Inflection]>> {
    if !existing.iter().sorted().eq(incoming.iter().sorted()) {
        return None;
    }

    let rare_in = |list: &[Inflection], inflection: &Inflection| {
        list.iter().any(|other| other == inflection && other.rare)
    };
    let always_common = |inflection: &Inflection| !rare_in(existing, inflection) && !rare_in(incoming, inflection);

    let mut merged: Vec<Inflection> = existing
        .iter()
        .map(|inflection| {
            let incoming_rare = rare_in(incoming, inflection);
            let rare = if inflection.rare == incoming_rare {
                inflection.rare
            } else {
                existing.iter().any(|other| {
                    other != inflection && other.grammemes == inflection.grammemes && always_common(other)
                })
            };
            Inflection::new(inflection.surface.as_str(), inflection.grammemes.clone(), rare)
        })
        .collect();
    merged.sort_by(Inflection::rarity_order);

    let unchanged = existing
        .iter()
        .map(|inflection| (inflection, inflection.rare))
        .eq(merged.iter().map(|inflection| (inflection, inflection.rare)));
    if unchanged {
        Some(Cow::Borrowed(existing))
    } else {
        Some(Cow::Owned(merged))
    }
}

impl InflectionPattern {
    fn freeze(id: u32, candidate: &PatternCandidate<'_>) -> Self {
        Self {
            id,
            count: 1,
            lemma_suffixes: IndexSet::from([candidate.lemma_suffix.to_string()]),
            grammeme_variants: IndexSet::from([candidate.grammemes.useful()]),
            suffixes: candidate
                .suffixes
                .iter()
                .sorted_by(|a, b| a.rarity_order(b))
                .cloned()
                .collect(),
            inflectional: candidate.is_inflectional(),
        }
    }

    /// The printed id. Reassigned by [`PatternRegistry::finalize`].
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of lemmas sharing this pattern.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_inflectional(&self) -> bool {
        self.inflectional
    }

    pub fn suffixes(&self) -> &[Inflection] {
        &self.suffixes
    }

    pub fn lemma_suffixes(&self) -> impl Iterator<Item = &str> {
        self.lemma_suffixes.iter().map(String::as_str)
    }

    /// Non-inflectional patterns are bags of forms and collapse whenever their
    /// grammemes match. Inflectional ones must also share the lemma suffix and
    /// hold the same inflections.
    fn matches(&self, candidate: &PatternCandidate<'_>) -> bool {
        let grammemes = candidate.grammemes.useful();
        if !self.grammeme_variants.iter().eq([&grammemes]) {
            return false;
        }
        match (self.inflectional, candidate.is_inflectional()) {
            (false, false) => true,
            (true, true) => {
                self.lemma_suffixes.iter().eq([candidate.lemma_suffix])
                    && same_inflections(&self.suffixes, candidate.suffixes)
            }
            _ => false,
        }
    }

    fn merge(&mut self, candidate: &PatternCandidate<'_>) -> Result<(), RecordError> {
        if self.inflectional {
            let reconciled = match merged_suffixes(&self.suffixes, candidate.suffixes) {
                Some(Cow::Owned(merged)) => Some(merged),
                Some(Cow::Borrowed(_)) => None,
                None => return Err(RecordError::IrreconcilableMerge { pattern: self.id }),
            };
            if let Some(merged) = reconciled {
                self.suffixes = merged;
            }
        }
        self.lemma_suffixes.insert(candidate.lemma_suffix.to_string());
        self.grammeme_variants.insert(candidate.grammemes.useful());
        self.count += 1;
        Ok(())
    }

    fn write_pos_lines(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = std::collections::BTreeSet::new();
        for variant in &self.grammeme_variants {
            let (pos, other): (Vec<Grammeme>, Vec<Grammeme>) = variant
                .iter()
                .partition(|grammeme| grammeme.category() == Category::PartOfSpeech);
            let comment = if other.is_empty() {
                String::new()
            } else {
                let attributes: String = other
                    .iter()
                    .filter(|grammeme| !grammeme.is_control() && grammeme.is_useful())
                    .map(|grammeme| grammeme.xml_attribute())
                    .collect();
                format!("<!--{attributes} -->")
            };
            for pos in pos {
                lines.insert(format!("        <pos>{comment}{pos}</pos>"));
            }
        }
        for line in lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Attribute strings for one inflection, one per combination of values when a
/// category holds several.
fn attribute_combinations(grammemes: &GrammemeSet) -> Vec<String> {
    let mut by_category: BTreeMap<Category, Vec<Grammeme>> = BTreeMap::new();
    for grammeme in grammemes.iter() {
        if !grammeme.is_control() && grammeme.is_useful() {
            by_category.entry(grammeme.category()).or_default().push(grammeme);
        }
    }

    let mut attributes = vec![String::new()];
    for values in by_category.values() {
        let existing = attributes.len();
        for _ in 1..values.len() {
            attributes.extend_from_within(..existing);
        }
        for (offset, value) in values.iter().enumerate() {
            let attribute = value.xml_attribute();
            for builder in &mut attributes[offset * existing..(offset + 1) * existing] {
                builder.push_str(&attribute);
            }
        }
    }
    attributes
}

impl fmt::Display for InflectionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    <pattern name=\"{:x}\" words=\"{}\">", self.id, self.count)?;
        self.write_pos_lines(f)?;
        if self.inflectional {
            for suffix in &self.lemma_suffixes {
                if suffix.is_empty() {
                    writeln!(f, "        <suffix/>")?;
                } else {
                    writeln!(f, "        <suffix>{suffix}</suffix>")?;
                }
            }
            writeln!(f, "        <inflections>")?;
            for inflection in self.suffixes.iter().filter(|s| !s.grammemes.is_ignorable()) {
                let surface = inflection.surface.replace("& ", "&amp; ");
                for attributes in attribute_combinations(&inflection.grammemes) {
                    writeln!(
                        f,
                        "            <inflection{attributes}><t><stem/>{surface}</t></inflection>"
                    )?;
                }
            }
            writeln!(f, "        </inflections>")?;
        }
        writeln!(f, "    </pattern>")
    }
}

/// Owns every pattern of a compilation run.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    patterns: Vec<InflectionPattern>,
    by_grammemes: BTreeMap<GrammemeSet, Vec<usize>>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, id: PatternId) -> &InflectionPattern {
        &self.patterns[id.0]
    }

    /// Merges the candidate into the first equal pattern, or registers it.
    pub fn register(&mut self, candidate: PatternCandidate<'_>) -> Result<PatternId, RecordError> {
        let grammemes = candidate.grammemes.useful();
        let existing = self.by_grammemes.get(&grammemes).and_then(|indices| {
            indices
                .iter()
                .copied()
                .find(|&index| self.patterns[index].matches(&candidate))
        });
        if let Some(index) = existing {
            self.patterns[index].merge(&candidate)?;
            return Ok(PatternId(index));
        }

        let index = self.patterns.len();
        let id = u32::try_from(index + 1).unwrap_or(u32::MAX);
        self.patterns.push(InflectionPattern::freeze(id, &candidate));
        self.by_grammemes.entry(grammemes).or_default().push(index);
        Ok(PatternId(index))
    }

    /// Renumbers patterns from 1, most shared first. Ties keep their
    /// registration order.
    pub fn finalize(&mut self) {
        let order: Vec<usize> = (0..self.patterns.len())
            .sorted_by(|&a, &b| {
                let (a, b) = (&self.patterns[a], &self.patterns[b]);
                b.count.cmp(&a.count).then(a.id.cmp(&b.id))
            })
            .collect();
        for (rank, index) in order.into_iter().enumerate() {
            self.patterns[index].id = u32::try_from(rank + 1).unwrap_or(u32::MAX);
        }
    }

    /// Patterns in id order.
    pub fn iter(&self) -> impl Iterator<Item = &InflectionPattern> {
        self.patterns.iter().sorted_by_key(|pattern| pattern.id)
    }
}
