use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::grammeme::{Category, Grammeme};

/// A set of grammemes with the canonical ordering used for pattern identity
/// and serialization: larger sets sort first, then element by element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GrammemeSet(BTreeSet<Grammeme>);

impl GrammemeSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, grammeme: impl Into<Grammeme>) -> bool {
        self.0.insert(grammeme.into())
    }

    pub fn remove(&mut self, grammeme: impl Into<Grammeme>) -> bool {
        self.0.remove(&grammeme.into())
    }

    pub fn contains(&self, grammeme: impl Into<Grammeme>) -> bool {
        self.0.contains(&grammeme.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = Grammeme> + '_ {
        self.0.iter().copied()
    }

    pub fn is_disjoint(&self, other: &GrammemeSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn count_category(&self, category: Category) -> usize {
        self.iter().filter(|g| g.category() == category).count()
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.iter().any(|g| g.category() == category)
    }

    pub fn remove_category(&mut self, category: Category) {
        self.0.retain(|g| g.category() != category);
    }

    pub fn without_category(&self, category: Category) -> Self {
        let mut copy = self.clone();
        copy.remove_category(category);
        copy
    }

    /// Drops grammemes that never appear in paradigm output.
    pub fn useful(&self) -> Self {
        self.iter().filter(|g| g.is_useful()).collect()
    }

    /// Abbreviations are recorded in the dictionary but never inflected.
    pub fn is_ignorable(&self) -> bool {
        self.contains(Grammeme::ABBREVIATION)
    }
}

impl Ord for GrammemeSet {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .len()
            .cmp(&self.0.len())
            .then_with(|| self.0.iter().cmp(other.0.iter()))
    }
}

impl PartialOrd for GrammemeSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Grammeme> for GrammemeSet {
    fn from(grammeme: Grammeme) -> Self {
        Self(BTreeSet::from([grammeme]))
    }
}

impl FromIterator<Grammeme> for GrammemeSet {
    fn from_iter<T: IntoIterator<Item = Grammeme>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Grammeme> for GrammemeSet {
    fn extend<T: IntoIterator<Item = Grammeme>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl<'a> Extend<&'a Grammeme> for GrammemeSet {
    fn extend<T: IntoIterator<Item = &'a Grammeme>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a GrammemeSet {
    type Item = &'a Grammeme;
    type IntoIter = std::collections::btree_set::Iter<'a, Grammeme>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for GrammemeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, grammeme) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{grammeme}")?;
        }
        Ok(())
    }
}

/// A surface form together with its grammemes.
///
/// Equality and ordering ignore the rarity flag: two inflections are the same
/// when they spell the same and carry the same grammemes.
#[derive(Debug, Clone)]
pub struct Inflection {
    pub surface: String,
    pub grammemes: GrammemeSet,
    pub rare: bool,
}

impl Inflection {
    pub fn new(surface: impl Into<String>, grammemes: GrammemeSet, rare: bool) -> Self {
        Self {
            surface: surface.into(),
            grammemes,
            rare,
        }
    }

    /// Non-rare inflections first, then the regular inflection order.
    pub fn rarity_order(&self, other: &Self) -> Ordering {
        self.rare.cmp(&other.rare).then_with(|| self.cmp(other))
    }
}

impl PartialEq for Inflection {
    fn eq(&self, other: &Self) -> bool {
        self.surface == other.surface && self.grammemes == other.grammemes
    }
}

impl Eq for Inflection {}

impl std::hash::Hash for Inflection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.surface.hash(state);
        self.grammemes.hash(state);
    }
}

impl Ord for Inflection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.grammemes
            .cmp(&other.grammemes)
            .then_with(|| self.surface.cmp(&other.surface))
    }
}

impl PartialOrd for Inflection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Inflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.surface)?;
        for grammeme in &self.grammemes {
            write!(f, " {grammeme}")?;
        }
        Ok(())
    }
}
