use std::cmp::Reverse;
use std::collections::BTreeSet;

use grammar_utils::GrammemeSet;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::pattern::{PatternId, PatternRegistry};

/// Everything known about one surface form.
///
/// Homographs from different lemmas land in the same entry, so entries only
/// ever grow by merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub phrase: String,
    pub lemmas: BTreeSet<String>,
    pub grammemes: GrammemeSet,
    /// Every pattern this phrase belongs to, rare or not.
    pub patterns: IndexSet<PatternId>,
    /// The subset of `patterns` contributed by rare lemmas.
    pub rare_patterns: IndexSet<PatternId>,
}

impl DictionaryEntry {
    pub fn new(
        phrase: impl Into<String>,
        lemma: impl Into<String>,
        rare: bool,
        grammemes: GrammemeSet,
        pattern: Option<PatternId>,
    ) -> Self {
        let patterns: IndexSet<PatternId> = pattern.into_iter().collect();
        let rare_patterns = if rare { patterns.clone() } else { IndexSet::new() };
        Self {
            phrase: phrase.into(),
            lemmas: BTreeSet::from([lemma.into()]),
            grammemes,
            patterns,
            rare_patterns,
        }
    }

    pub fn merge(&mut self, other: DictionaryEntry) {
        self.grammemes.extend(&other.grammemes);
        self.patterns.extend(other.patterns);
        self.rare_patterns.extend(other.rare_patterns);
        self.lemmas.extend(other.lemmas);
    }

    /// `phrase: grammeme ... inflection=id ...`, with pattern references only
    /// when the document has paradigms. Common patterns come first, and
    /// patterns only reached through rare lemmas come last.
    pub fn render(&self, registry: &PatternRegistry, inflectional: bool) -> String {
        let grammemes: String = self.grammemes.iter().map(|grammeme| format!(" {grammeme}")).collect();
        let mut line = format!("{}:{grammemes}", self.phrase);
        if inflectional {
            let by_count = |ids: &IndexSet<PatternId>| {
                ids.iter()
                    .copied()
                    .sorted_by_key(|&id| Reverse(registry.get(id).count()))
                    .collect::<Vec<_>>()
            };
            let rare = by_count(&self.rare_patterns);
            let common = by_count(&self.patterns)
                .into_iter()
                .filter(|id| !self.rare_patterns.contains(id));
            line.extend(
                common
                    .chain(rare)
                    .map(|id| format!(" inflection={:x}", registry.get(id).id())),
            );
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternCandidate;
    use grammar_utils::grammeme::{Number, PartOfSpeech};
    use grammar_utils::{Grammeme, Inflection};

    fn set(grammemes: &[Grammeme]) -> GrammemeSet {
        grammemes.iter().copied().collect()
    }

    fn registry_with_two_patterns() -> (PatternRegistry, PatternId, PatternId) {
        let mut registry = PatternRegistry::new();
        let noun = set(&[PartOfSpeech::Noun.into()]);
        let single = vec![Inflection::new("", set(&[Number::Singular.into()]), false)];
        let pair = vec![
            Inflection::new("", set(&[Number::Singular.into()]), false),
            Inflection::new("s", set(&[Number::Plural.into()]), false),
        ];
        let first = registry
            .register(PatternCandidate { lemma_suffix: "", grammemes: &noun, suffixes: &single })
            .unwrap();
        let second = registry
            .register(PatternCandidate { lemma_suffix: "", grammemes: &noun, suffixes: &pair })
            .unwrap();
        registry
            .register(PatternCandidate { lemma_suffix: "", grammemes: &noun, suffixes: &pair })
            .unwrap();
        (registry, first, second)
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (_, pattern, _) = registry_with_two_patterns();
        let grammemes = set(&[Number::Plural.into(), PartOfSpeech::Noun.into()]);
        let entry = DictionaryEntry::new("cats", "cat", false, grammemes, Some(pattern));
        let mut merged = entry.clone();
        merged.merge(entry.clone());
        assert_eq!(merged, entry);
    }

    #[test]
    fn test_merge_unions_homographs() {
        let (_, first, second) = registry_with_two_patterns();
        let mut entry = DictionaryEntry::new(
            "lead",
            "lead",
            false,
            set(&[PartOfSpeech::Noun.into()]),
            Some(first),
        );
        entry.merge(DictionaryEntry::new(
            "lead",
            "leaden",
            true,
            set(&[PartOfSpeech::Verb.into()]),
            Some(second),
        ));
        assert_eq!(entry.lemmas.len(), 2);
        assert_eq!(entry.grammemes.len(), 2);
        assert_eq!(entry.patterns.len(), 2);
        assert_eq!(entry.rare_patterns.len(), 1);
    }

    #[test]
    fn test_render_orders_common_then_rare() {
        let (mut registry, first, second) = registry_with_two_patterns();
        registry.finalize();
        let mut entry = DictionaryEntry::new(
            "cat",
            "cat",
            true,
            set(&[Number::Singular.into(), PartOfSpeech::Noun.into()]),
            Some(second),
        );
        entry.merge(DictionaryEntry::new(
            "cat",
            "cat",
            false,
            set(&[Number::Singular.into(), PartOfSpeech::Noun.into()]),
            Some(first),
        ));
        assert_eq!(
            entry.render(&registry, true),
            "cat: singular noun inflection=2 inflection=1"
        );
        assert_eq!(entry.render(&registry, false), "cat: singular noun");
    }

    #[test]
    fn test_render_without_grammemes_or_patterns() {
        let (registry, _, _) = registry_with_two_patterns();
        let entry = DictionaryEntry::new("hmm", "hmm", false, GrammemeSet::new(), None);
        assert_eq!(entry.render(&registry, true), "hmm:");
    }
}
