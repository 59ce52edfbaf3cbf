use std::collections::BTreeMap;

use grammar_utils::{GrammemeSet, Inflection};

use crate::analysis::{Paradigm, contains_inflection_type, expand_combinations};
use crate::dictionary::DictionaryEntry;
use crate::error::RecordError;
use crate::options::CompileOptions;
use crate::pattern::{PatternCandidate, PatternId, PatternRegistry};

/// One lemma and its usable forms, ready for analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lemma {
    pub headword: String,
    pub grammemes: GrammemeSet,
    pub rare: bool,
    pub inflections: Vec<Inflection>,
}

/// The dictionary, the pattern registry, and running statistics for one
/// compilation run.
#[derive(Debug, Default)]
pub struct DocumentState {
    pub lemma_count: usize,
    pub unusable_lemma_count: usize,
    pub unusable_surface_form_count: usize,
    /// Entries folded into an existing phrase.
    pub merged_count: usize,
    pub incoming_surface_forms: usize,
    pub dictionary: BTreeMap<String, DictionaryEntry>,
    pub patterns: PatternRegistry,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: DictionaryEntry) {
        match self.dictionary.get_mut(&entry.phrase) {
            Some(existing) => {
                self.merged_count += 1;
                existing.merge(entry);
            }
            None => {
                self.dictionary.insert(entry.phrase.clone(), entry);
            }
        }
    }

    /// True once the patterns say more than "these words exist": several
    /// patterns, or one shared by several lemmas.
    pub fn is_inflectional(&self) -> bool {
        self.patterns.len() > 1
            || (self.patterns.len() == 1 && self.patterns.iter().all(|pattern| pattern.count() > 1))
    }

    /// Registers the lemma's paradigm and adds its forms to the dictionary.
    ///
    /// On error nothing about the lemma has been recorded.
    pub fn analyze_lemma(&mut self, lemma: &Lemma, options: &CompileOptions) -> Result<(), RecordError> {
        let mut inflections: Vec<Inflection> =
            lemma.inflections.iter().flat_map(expand_combinations).collect();

        let mut in_pattern = vec![false; inflections.len()];
        for (inflection, member) in inflections.iter_mut().zip(in_pattern.iter_mut()) {
            *member = !inflection.grammemes.is_empty() && !inflection.grammemes.is_ignorable();
            inflection.grammemes.extend(&lemma.grammemes);
        }
        if !in_pattern.contains(&true) {
            for (inflection, member) in inflections.iter().zip(in_pattern.iter_mut()) {
                *member = !inflection.grammemes.is_ignorable();
            }
        }

        let pattern = if contains_inflection_type(&inflections, &options.inflection_types) {
            Some(self.register_pattern(lemma, &inflections, &in_pattern)?)
        } else {
            None
        };

        for (inflection, member) in inflections.into_iter().zip(in_pattern) {
            let pattern = pattern.filter(|_| member);
            if options.add_normalized_entry && !lemma.rare {
                let normalized = options.lowercase(&inflection.surface);
                if normalized != inflection.surface {
                    self.add_entry(DictionaryEntry::new(
                        normalized,
                        lemma.headword.as_str(),
                        false,
                        inflection.grammemes.clone(),
                        pattern,
                    ));
                }
            }
            self.add_entry(DictionaryEntry::new(
                inflection.surface,
                lemma.headword.as_str(),
                lemma.rare,
                inflection.grammemes,
                pattern,
            ));
        }

        if options.include_lemmas_without_words {
            self.dictionary
                .entry(lemma.headword.clone())
                .or_insert_with(|| {
                    DictionaryEntry::new(
                        lemma.headword.as_str(),
                        lemma.headword.as_str(),
                        lemma.rare,
                        lemma.grammemes.clone(),
                        None,
                    )
                });
        }
        Ok(())
    }

    fn register_pattern(
        &mut self,
        lemma: &Lemma,
        inflections: &[Inflection],
        in_pattern: &[bool],
    ) -> Result<PatternId, RecordError> {
        let members: Vec<Inflection> = inflections
            .iter()
            .zip(in_pattern)
            .filter(|(_, member)| **member)
            .map(|(inflection, _)| inflection.clone())
            .collect();
        let paradigm = Paradigm::induce(&lemma.headword, &members)?;
        self.patterns.register(PatternCandidate {
            lemma_suffix: &paradigm.lemma_suffix,
            grammemes: &lemma.grammemes,
            suffixes: &paradigm.suffixes,
        })
    }

    /// Adds grammemes to existing phrases, or creates pattern-less entries.
    pub fn add_extra_grammemes(&mut self, extra: &BTreeMap<String, GrammemeSet>) {
        for (phrase, grammemes) in extra {
            self.dictionary
                .entry(phrase.clone())
                .and_modify(|entry| entry.grammemes.extend(grammemes))
                .or_insert_with(|| {
                    DictionaryEntry::new(phrase.as_str(), phrase.as_str(), false, grammemes.clone(), None)
                });
        }
    }

    /// Renumbers patterns once every source has been read.
    pub fn finalize(&mut self) {
        self.patterns.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammar_utils::Grammeme;
    use grammar_utils::grammeme::{Gender, Number, PartOfSpeech};

    fn set(grammemes: &[Grammeme]) -> GrammemeSet {
        grammemes.iter().copied().collect()
    }

    fn noun(headword: &str, singular: &str, plural: &str) -> Lemma {
        Lemma {
            headword: headword.to_string(),
            grammemes: set(&[PartOfSpeech::Noun.into()]),
            rare: false,
            inflections: vec![
                Inflection::new(singular, set(&[Number::Singular.into()]), false),
                Inflection::new(plural, set(&[Number::Plural.into()]), false),
            ],
        }
    }

    #[test]
    fn test_city_and_party_merge() {
        let options = CompileOptions::default();
        let mut document = DocumentState::new();
        document.analyze_lemma(&noun("city", "city", "cities"), &options).unwrap();
        assert!(!document.is_inflectional());
        document.analyze_lemma(&noun("party", "party", "parties"), &options).unwrap();

        assert_eq!(document.patterns.len(), 1);
        assert!(document.is_inflectional());
        let pattern = document.patterns.iter().next().unwrap();
        assert_eq!(pattern.count(), 2);
        assert_eq!(pattern.lemma_suffixes().collect::<Vec<_>>(), vec!["y"]);

        let cities = &document.dictionary["cities"];
        assert_eq!(cities.grammemes, set(&[Number::Plural.into(), PartOfSpeech::Noun.into()]));
        assert_eq!(cities.patterns.len(), 1);
        assert_eq!(document.dictionary.len(), 4);
        assert_eq!(document.merged_count, 0);
    }

    #[test]
    fn test_grande_expands_into_both_genders() {
        let options = CompileOptions {
            inflection_types: set(&[PartOfSpeech::Adjective.into()]),
            ..CompileOptions::default()
        };
        let lemma = Lemma {
            headword: "grande".to_string(),
            grammemes: set(&[PartOfSpeech::Adjective.into()]),
            rare: false,
            inflections: vec![
                Inflection::new(
                    "grande",
                    set(&[Gender::Masculine.into(), Gender::Feminine.into(), Number::Singular.into()]),
                    false,
                ),
                Inflection::new(
                    "grandes",
                    set(&[Gender::Masculine.into(), Gender::Feminine.into(), Number::Plural.into()]),
                    false,
                ),
            ],
        };
        let mut document = DocumentState::new();
        document.analyze_lemma(&lemma, &options).unwrap();

        let pattern = document.patterns.iter().next().unwrap();
        assert_eq!(pattern.suffixes().len(), 4);
        assert_eq!(document.merged_count, 2);
        let grande = &document.dictionary["grande"];
        assert!(grande.grammemes.contains(Gender::Masculine));
        assert!(grande.grammemes.contains(Gender::Feminine));
    }

    #[test]
    fn test_other_parts_of_speech_get_no_pattern() {
        let options = CompileOptions::default();
        let mut lemma = noun("run", "run", "runs");
        lemma.grammemes = set(&[PartOfSpeech::Verb.into()]);
        let mut document = DocumentState::new();
        document.analyze_lemma(&lemma, &options).unwrap();
        assert!(document.patterns.is_empty());
        assert!(document.dictionary["runs"].patterns.is_empty());
    }

    #[test]
    fn test_abbreviations_stay_out_of_patterns() {
        let options = CompileOptions::default();
        let mut lemma = noun("doctor", "doctor", "doctors");
        lemma
            .inflections
            .push(Inflection::new("Dr", set(&[PartOfSpeech::Abbreviation.into()]), false));
        let mut document = DocumentState::new();
        document.analyze_lemma(&lemma, &options).unwrap();
        let pattern = document.patterns.iter().next().unwrap();
        assert_eq!(pattern.suffixes().len(), 2);
        assert!(document.dictionary["Dr"].patterns.is_empty());
        assert_eq!(document.dictionary["doctors"].patterns.len(), 1);
    }

    #[test]
    fn test_lemma_without_words_and_normalized_entries() {
        let options = CompileOptions {
            include_lemmas_without_words: true,
            add_normalized_entry: true,
            ..CompileOptions::default()
        };
        let lemma = noun("Paris", "Parises", "Parisen");
        let mut document = DocumentState::new();
        document.analyze_lemma(&lemma, &options).unwrap();
        assert!(document.dictionary.contains_key("Paris"));
        assert!(document.dictionary["Paris"].patterns.is_empty());
        assert!(document.dictionary.contains_key("parises"));
        assert!(!document.dictionary.contains_key("paris"));
    }

    #[test]
    fn test_extra_grammemes() {
        let options = CompileOptions::default();
        let mut document = DocumentState::new();
        document.analyze_lemma(&noun("cat", "cat", "cats"), &options).unwrap();
        let extra = BTreeMap::from([
            ("cat".to_string(), set(&[Gender::Common.into()])),
            ("dog".to_string(), set(&[PartOfSpeech::Noun.into()])),
        ]);
        document.add_extra_grammemes(&extra);
        assert!(document.dictionary["cat"].grammemes.contains(Gender::Common));
        assert_eq!(document.dictionary["cat"].patterns.len(), 1);
        assert!(document.dictionary["dog"].patterns.is_empty());
    }
}
