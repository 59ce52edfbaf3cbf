//! Paradigm induction: splitting ambiguous forms, finding the stem, and turning
//! surface forms into suffixes.

use std::collections::BTreeMap;

use grammar_utils::{Category, Grammeme, GrammemeSet, Inflection};
use itertools::Itertools;

use crate::error::RecordError;

/// Splits a form that carries several values of one category into one form per
/// combination of values.
pub fn expand_combinations(inflection: &Inflection) -> Vec<Inflection> {
    let mut by_category: BTreeMap<Category, Vec<Grammeme>> = BTreeMap::new();
    for grammeme in inflection.grammemes.iter() {
        by_category.entry(grammeme.category()).or_default().push(grammeme);
    }
    if by_category.values().all(|values| values.len() == 1) {
        return vec![inflection.clone()];
    }

    by_category
        .into_values()
        .multi_cartesian_product()
        .map(|combination| {
            Inflection::new(
                inflection.surface.clone(),
                combination.into_iter().collect(),
                inflection.rare,
            )
        })
        .collect()
}

/// Index of the first character where the words disagree, or `None` when they
/// are all identical.
fn first_difference(words: &[Vec<char>]) -> Option<usize> {
    let first = words.first()?;
    let shortest = words.iter().map(Vec::len).min().unwrap_or(0);
    for i in 0..shortest {
        if words.iter().any(|word| word[i] != first[i]) {
            return Some(i);
        }
    }
    if words.iter().all(|word| word.len() == first.len()) {
        None
    } else {
        Some(shortest)
    }
}

/// A stem length is invalid when some form's suffix is also the tail of
/// another form whose stem would then be shorter.
fn is_valid_stem_length(forms: &[Vec<char>], stem_length: usize) -> bool {
    forms.iter().all(|outer| {
        let Some(suffix) = outer.get(stem_length..) else {
            return false;
        };
        !forms
            .iter()
            .any(|inner| inner.ends_with(suffix) && inner.len() - suffix.len() < stem_length)
    })
}

/// Length in characters of the stem shared by the headword and its forms.
pub fn stem_length(headword: &str, inflections: &[Inflection]) -> Result<usize, RecordError> {
    let headword_chars: Vec<char> = headword.chars().collect();
    let forms: Vec<Vec<char>> = inflections
        .iter()
        .map(|inflection| inflection.surface.chars().collect())
        .collect();

    let mut words = forms.clone();
    words.push(headword_chars.clone());
    let mut length = first_difference(&words).unwrap_or(headword_chars.len());

    while !is_valid_stem_length(&forms, length) {
        length = length
            .checked_sub(1)
            .ok_or_else(|| RecordError::AmbiguousStem {
                headword: headword.to_string(),
            })?;
    }
    Ok(length)
}

fn strip_stem(word: &str, stem_length: usize) -> String {
    word.chars().skip(stem_length).collect()
}

/// Turns forms into suffixes after the stem, without duplicates, with the
/// non-rare suffixes first.
///
/// When the same suffix and grammemes occur both rare and non-rare, only the
/// non-rare one is kept.
pub fn generate_suffixes(stem_length: usize, inflections: &[Inflection]) -> Vec<Inflection> {
    let mut suffixes: BTreeMap<Inflection, Inflection> = BTreeMap::new();
    for inflection in inflections {
        let suffix = Inflection::new(
            strip_stem(&inflection.surface, stem_length),
            inflection.grammemes.clone(),
            inflection.rare,
        );
        if !suffix.rare || !suffixes.contains_key(&suffix) {
            suffixes.insert(suffix.clone(), suffix);
        }
    }

    let mut result: Vec<Inflection> = suffixes.into_values().collect();
    result.sort_by(Inflection::rarity_order);
    result
}

/// The lemma's suffix and its forms' suffixes relative to the shared stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paradigm {
    pub lemma_suffix: String,
    pub suffixes: Vec<Inflection>,
}

impl Paradigm {
    pub fn induce(headword: &str, inflections: &[Inflection]) -> Result<Self, RecordError> {
        let length = stem_length(headword, inflections)?;
        Ok(Self {
            lemma_suffix: strip_stem(headword, length),
            suffixes: generate_suffixes(length, inflections),
        })
    }
}

/// Whether any form carries one of the given parts of speech.
pub fn contains_inflection_type(inflections: &[Inflection], types: &GrammemeSet) -> bool {
    inflections
        .iter()
        .any(|inflection| !inflection.grammemes.is_disjoint(types))
}
