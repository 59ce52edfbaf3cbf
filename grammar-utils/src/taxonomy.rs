//! Mapping from raw source tags to grammeme sets.
//!
//! A [`TaxonomyBuilder`] starts from the built-in Wikidata table, takes the
//! operator's remaps and ignorable markers, and is then frozen into a
//! [`Taxonomy`] that is only read while records are compiled.

use rustc_hash::FxHashMap;

use crate::grammeme::*;
use crate::inflection::GrammemeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    #[error("{0} is not a known grammatical tag")]
    UnknownTag(String),

    #[error("{0} is not a known grammeme")]
    UnknownGrammeme(String),
}

macro_rules! tag_table {
    ($($tag:literal => [$($category:ident::$value:ident),+ $(,)?]),* $(,)?) => {
        &[$(($tag, &[$(Grammeme::$category($category::$value)),+])),*]
    };
}

/// Wikidata lexical categories and grammatical features, plus a few plain
/// string tags used by lexicon sources.
const DEFAULT_TAGS: &[(&str, &[Grammeme])] = tag_table! {
    // parts of speech
    "Q103184" => [PartOfSpeech::Article],
    "Q102786" => [PartOfSpeech::Abbreviation],
    "Q101244" => [PartOfSpeech::Abbreviation],
    "Q918270" => [PartOfSpeech::Abbreviation],
    "Q126473" => [PartOfSpeech::Abbreviation],
    "Q1130279" => [PartOfSpeech::Abbreviation],
    "Q34698" => [PartOfSpeech::Adjective],
    "Q12259986" => [PartOfSpeech::Adjective],
    "Q7233569" => [PartOfSpeech::Adjective],
    "Q7250170" => [PartOfSpeech::Adjective],
    "Q332375" => [PartOfSpeech::Adjective],
    "Q380057" => [PartOfSpeech::Adverb],
    "Q1668170" => [PartOfSpeech::Interrogative, PartOfSpeech::Adverb],
    "Q1522423" => [PartOfSpeech::Adverb],
    "Q1941737" => [PartOfSpeech::Adverb],
    "Q65807752" => [PartOfSpeech::Adverb],
    "Q63153" => [PartOfSpeech::Classifier],
    "Q36484" => [PartOfSpeech::Conjunction],
    "Q11655558" => [PartOfSpeech::Conjunction],
    "Q28833099" => [PartOfSpeech::Conjunction],
    "Q576271" => [PartOfSpeech::Determiner],
    "Q5051" => [Case::Genitive, PartOfSpeech::Determiner],
    "Q2824480" => [PartOfSpeech::Determiner],
    "Q83034" => [PartOfSpeech::Interjection],
    "Q2304610" => [PartOfSpeech::Interrogative],
    "Q54310231" => [PartOfSpeech::Interrogative, PartOfSpeech::Pronoun],
    "Q9788" => [Ignorable::IgnorableLemma],
    "Q3241972" => [Ignorable::IgnorableInflection],
    "Q1084" => [PartOfSpeech::Noun],
    "Q1787727" => [PartOfSpeech::Noun],
    "Q2428747" => [PartOfSpeech::Noun],
    "Q1350145" => [PartOfSpeech::Verb, PartOfSpeech::Noun],
    "Q63116" => [PartOfSpeech::Numeral],
    "Q1329258" => [PartOfSpeech::Numeral],
    "Q191780" => [PartOfSpeech::Numeral],
    "Q55951821" => [PartOfSpeech::Numeral],
    "Q184943" => [PartOfSpeech::Particle],
    "Q1480213" => [PartOfSpeech::Particle],
    "Q113198319" => [PartOfSpeech::Adverb, PartOfSpeech::Particle],
    "Q134316" => [PartOfSpeech::Adposition],
    "Q161873" => [PartOfSpeech::Adposition],
    "Q4833830" => [PartOfSpeech::Adposition],
    "Q36224" => [PartOfSpeech::Pronoun],
    "Q2006180" => [PartOfSpeech::Pronoun],
    "Q468801" => [PartOfSpeech::Pronoun],
    "Q1502460" => [PartOfSpeech::Pronoun],
    "Q953129" => [PartOfSpeech::Pronoun],
    "Q147276" => [PartOfSpeech::ProperNoun],
    "Q7884789" => [PartOfSpeech::ProperNoun],
    "Q43229" => [PartOfSpeech::ProperNoun],
    "Q24905" => [PartOfSpeech::Verb],
    "Q11399805" => [PartOfSpeech::Verb],
    "Q3254028" => [PartOfSpeech::Verb],
    // form type, polarity, comparison, declension
    "Q4239848" => [FormType::ShortForm, PartOfSpeech::Adjective],
    "Q96406487" => [FormType::ShortForm],
    "Q112154" => [FormType::ShortForm],
    "Q96406455" => [FormType::LongForm],
    "Q109267112" => [Polarity::Affirmative],
    "Q1478451" => [Polarity::Negative],
    "Q3745428" => [Polarity::Affirmative, Polarity::Negative],
    "Q64012400" => [Mood::Imperative, Polarity::Affirmative],
    "Q64004115" => [Mood::Imperative, Polarity::Negative],
    "Q3482678" => [ComparisonDegree::Positive],
    "Q5384239" => [ComparisonDegree::Equative],
    "plain" => [ComparisonDegree::Plain],
    "Q14169499" => [ComparisonDegree::Comparative],
    "Q65248385" => [PartOfSpeech::Adverb, ComparisonDegree::Comparative],
    "Q1817208" => [ComparisonDegree::Superlative],
    "Q65248545" => [PartOfSpeech::Adverb, ComparisonDegree::Superlative],
    "Q7977953" => [DeclensionClass::Weak],
    "Q96407524" => [DeclensionClass::Mixed],
    "Q3481903" => [DeclensionClass::Strong],
    // number and count
    "Q110786" => [Number::Singular],
    "Q604984" => [Number::Singular],
    "Q146786" => [Number::Plural],
    "Q138246" => [Number::Plural],
    "Q20386151" => [Number::Plural],
    "Q1098772" => [Usage::Rare, Number::Plural],
    "Q126002589" => [Usage::Rare, Number::Plural],
    "Q110022" => [Number::Dual],
    "Q1520033" => [Count::Countable],
    "Q489168" => [Count::Uncountable],
    "Q53998049" => [Count::Uncountable],
    "stressed" => [Emphasis::Stressed],
    "Q55464002" => [Emphasis::Stressed],
    "unstressed" => [Emphasis::Unstressed],
    "Q55464014" => [Emphasis::Unstressed],
    // gender and animacy
    "Q499327" => [Gender::Masculine],
    "Q54020116" => [Gender::Masculine, Animacy::Animate],
    "Q52943434" => [Gender::Masculine, Animacy::Inanimate],
    "Q27918551" => [Gender::Masculine, Animacy::Human],
    "Q18478758" => [Gender::Masculine, Gender::Feminine],
    "Q100919075" => [Gender::Masculine, Gender::Feminine],
    "Q132672407" => [Gender::Masculine, Gender::Neuter],
    "Q133259189" => [Gender::Masculine, Gender::Feminine, Gender::Neuter],
    "Q1775415" => [Gender::Feminine],
    "Q1775461" => [Gender::Neuter],
    "Q1305037" => [Gender::Common],
    "Q54152717" => [Gender::Nonvirile],
    "Q51927507" => [Animacy::Animate],
    "Q67372736" => [Animacy::Human],
    "Q67372837" => [Animacy::Nonhuman],
    "Q51927539" => [Animacy::Inanimate],
    // case
    "Q319822" => [Case::Abessive],
    "Q156986" => [Case::Ablative],
    "Q332734" => [Case::Absolutive],
    "Q146078" => [Case::Accusative],
    "Q281954" => [Case::Adessive],
    "Q655020" => [Case::Allative],
    "Q664905" => [Case::Benefactive],
    "Q113330743" => [Case::Causative],
    "Q838581" => [Case::Comitative],
    "Q145599" => [Case::Dative],
    "Q1183901" => [Case::Delative],
    "Q55862897" => [Case::Destinative, Case::Allative],
    "Q1751855" => [Case::Direct],
    "Q55862884" => [Case::Directive, Case::Allative],
    "Q394253" => [Case::Elative],
    "Q324305" => [Case::Ergative],
    "Q148465" => [Case::Essive],
    "Q146233" => [Case::Genitive],
    "Q474668" => [Case::Illative],
    "Q282031" => [Case::Inessive],
    "Q1665275" => [Case::Instructive],
    "Q192997" => [Case::Instrumental],
    "Q202142" => [Case::Locative],
    "Q1949687" => [Case::Motivative],
    "Q131105" => [Case::Nominative],
    "Q1233197" => [Case::Oblique],
    "Q857325" => [Case::Partitive],
    "Q2114906" => [Case::Prepositional],
    "Q952933" => [Case::Prolative],
    "Q3773161" => [Case::Sociative],
    "Q222355" => [Case::Superessive],
    "Q2120615" => [Case::Sublative],
    "Q747019" => [Case::Terminative],
    "Q950170" => [Case::Translative],
    "Q185077" => [Case::Vocative],
    // definiteness
    "Q53997851" => [Definiteness::Definite],
    "Q2865743" => [Definiteness::Definite, PartOfSpeech::Article],
    "Q1641446" => [Definiteness::Construct],
    "Q53997857" => [Definiteness::Indefinite],
    "Q3813849" => [Definiteness::Indefinite, PartOfSpeech::Article],
    "Q10265745" => [Definiteness::Demonstrative, PartOfSpeech::Determiner],
    // verb forms, tense, person, voice
    "Q10345583" => [Tense::Present, VerbType::Participle],
    "Q1230649" => [Tense::Past, VerbType::Participle],
    "Q72249355" => [Voice::Active, VerbType::Participle],
    "Q72249544" => [Voice::Passive, VerbType::Participle],
    "Q814722" => [VerbType::Participle],
    "Q192613" => [Tense::Present],
    "Q3910936" => [Aspect::Simple, Tense::Present],
    "Q1994301" => [Tense::Past],
    "Q1392475" => [Aspect::Simple, Tense::Past],
    "Q113326099" => [Tense::DistantPast],
    "Q501405" => [Tense::Future],
    "Q1475560" => [Aspect::Simple, Tense::Future],
    "Q21714344" => [Person::First],
    "Q51929049" => [Person::Second],
    "Q51929074" => [Person::Third],
    "Q179230" => [VerbType::Infinitive],
    "Q1923028" => [VerbType::Gerund],
    "Q1050494" => [VerbType::Nonfinite],
    "Q731298" => [VerbType::Gerundive],
    "Q65540125" => [Tense::Present, VerbType::Transgressive],
    "Q548470" => [VerbType::Supine],
    "Q4818723" => [AdjectiveType::Attributive],
    "Q1931259" => [AdjectiveType::Predicative],
    "Q1774805" => [Transitivity::Transitive],
    "Q113330736" => [Transitivity::Intransitive],
    "Q1317831" => [Voice::Active],
    "Q1194697" => [Voice::Passive],
    // mood and aspect
    "Q625581" => [Mood::Conditional],
    "Q7272884" => [Mood::Quotative],
    "Q22716" => [Mood::Imperative],
    "Q682111" => [Mood::Indicative],
    "Q462367" => [Mood::Jussive],
    "Q473746" => [Mood::Subjunctive],
    "Q3502553" => [Tense::Present, Mood::Subjunctive],
    "Q3502544" => [Tense::Past, Mood::Subjunctive],
    "Q113289507" => [Mood::Emphatic],
    "Q2532941" => [Mood::Volitive],
    "Q134489509" => [WordOrder::SubjectVerb],
    "Q134489487" => [WordOrder::VerbSubject],
    "Q5636904" => [Aspect::Habitual],
    "Q3517796" => [Aspect::Simple],
    "Q1424306" => [Aspect::Perfective],
    "Q625420" => [Aspect::Perfect],
    "Q1240211" => [Tense::Present, Aspect::Perfect],
    "Q371427" => [Aspect::Imperfective],
    "Q108524486" => [Aspect::Imperfect],
    "Q623742" => [Aspect::Pluperfect],
    // derivation, register, size, sound
    "patronymic" => [DerivationType::Patronymic],
    "Q77768943" => [Register::Informal],
    "Q77768790" => [Register::Formal],
    "Q56650487" => [Person::Second, Register::Familiar],
    "Q56650485" => [Person::Second, Register::Informal],
    "Q66664394" => [Register::Intimate],
    "high" => [Register::High],
    "Q545779" => [Register::Pejorative],
    "Q75242466" => [Register::Conversational],
    "Q20613396" => [Register::Literary],
    "Q1358239" => [Sizeness::Augmentative],
    "Q108709" => [Sizeness::Diminutive],
    "consonant-end" => [Sound::ConsonantEnd],
    "consonant-start" => [Sound::ConsonantStart],
    "rieul-end" => [Sound::RieulEnd],
    "vowel-end" => [Sound::VowelEnd],
    "vowel-start" => [Sound::VowelStart],
    // features that say nothing about inflection
    "Q88778575" => [Ignorable::IgnorableProperty],
    "Q115223950" => [Ignorable::IgnorableProperty],
    "Q228503" => [Ignorable::IgnorableProperty],
    "Q11073520" => [Ignorable::IgnorableProperty],
};

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// `Q` followed by digits: a Wikidata item rather than a grammeme name.
fn is_entity_id(tag: &str) -> bool {
    tag.strip_prefix(['Q', 'q'])
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_digit()))
}

const COMPOSITE_SEPARATOR: &str = "|";

fn composite_key<I: IntoIterator<Item = String>>(tags: I) -> String {
    let mut tags: Vec<String> = tags.into_iter().collect();
    tags.sort();
    tags.dedup();
    tags.join(COMPOSITE_SEPARATOR)
}

/// The frozen tag table.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    tags: FxHashMap<String, GrammemeSet>,
    remaps: FxHashMap<String, String>,
}

impl Taxonomy {
    /// A builder seeded with the built-in tag table.
    pub fn builder() -> TaxonomyBuilder {
        TaxonomyBuilder::default()
    }

    fn canonical(&self, tag: &str) -> String {
        let tag = normalize_tag(tag);
        match self.remaps.get(&tag) {
            Some(remapped) => remapped.clone(),
            None => tag,
        }
    }

    /// Resolves one raw tag. Tags absent from the table fall back to the
    /// printable grammeme names.
    pub fn resolve(&self, tag: &str) -> Result<GrammemeSet, TaxonomyError> {
        let key = self.canonical(tag);
        if let Some(grammemes) = self.tags.get(&key) {
            return Ok(grammemes.clone());
        }
        key.parse::<Grammeme>()
            .map(GrammemeSet::from)
            .map_err(|_| TaxonomyError::UnknownTag(tag.to_string()))
    }

    /// Resolves several simultaneous raw tags that only carry meaning jointly.
    pub fn resolve_composite<S: AsRef<str>>(&self, tags: &[S]) -> Result<GrammemeSet, TaxonomyError> {
        let key = composite_key(tags.iter().map(|tag| self.canonical(tag.as_ref())));
        self.tags
            .get(&key)
            .cloned()
            .ok_or(TaxonomyError::UnknownTag(key))
    }

    pub fn has_composite<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.len() > 1
            && self
                .tags
                .contains_key(&composite_key(tags.iter().map(|tag| self.canonical(tag.as_ref()))))
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyBuilder {
    tags: FxHashMap<String, GrammemeSet>,
    remaps: FxHashMap<String, String>,
}

impl Default for TaxonomyBuilder {
    fn default() -> Self {
        let mut builder = Self::empty();
        for (tag, grammemes) in DEFAULT_TAGS {
            builder.map(tag, grammemes.iter().copied().collect());
        }
        builder
    }
}

impl TaxonomyBuilder {
    /// A builder without the built-in table.
    pub fn empty() -> Self {
        Self {
            tags: FxHashMap::default(),
            remaps: FxHashMap::default(),
        }
    }

    /// Rewrites `from` to `to` before any lookup.
    pub fn remap(&mut self, from: &str, to: &str) -> &mut Self {
        self.remaps.insert(normalize_tag(from), normalize_tag(to));
        self
    }

    pub fn map(&mut self, tag: &str, grammemes: GrammemeSet) -> &mut Self {
        self.tags.insert(normalize_tag(tag), grammemes);
        self
    }

    /// Maps several simultaneous tags. The tags go through the same remapping
    /// as lookups, whichever order `remap` and `map_composite` are called in.
    pub fn map_composite<S: AsRef<str>>(&mut self, tags: &[S], grammemes: GrammemeSet) -> &mut Self {
        let key = composite_key(tags.iter().map(|tag| normalize_tag(tag.as_ref())));
        self.tags.insert(key, grammemes);
        self
    }

    /// Marks a tag as ignorable.
    ///
    /// Entity ids map straight to the marker. A grammeme name swaps that
    /// grammeme for the marker in every table entry that contains it. Any
    /// other tag maps to the marker like an entity id.
    pub fn ignore(&mut self, tag: &str, marker: Ignorable) -> &mut Self {
        let marker = Grammeme::Ignorable(marker);
        let grammeme = match tag.parse::<Grammeme>() {
            Ok(grammeme) if !is_entity_id(tag) => grammeme,
            _ => {
                self.tags.insert(normalize_tag(tag), GrammemeSet::from(marker));
                return self;
            }
        };

        let mut replaced = 0;
        for grammemes in self.tags.values_mut() {
            if grammemes.remove(grammeme) {
                grammemes.insert(marker);
                replaced += 1;
            }
        }
        self.tags
            .insert(normalize_tag(&grammeme.to_string()), GrammemeSet::from(marker));
        log::debug!("{grammeme} is now {marker} in {replaced} tag mappings");
        self
    }

    pub fn build(self) -> Taxonomy {
        let remaps = self.remaps;
        let tags = self
            .tags
            .into_iter()
            .map(|(key, grammemes)| {
                if !key.contains(COMPOSITE_SEPARATOR) {
                    return (key, grammemes);
                }
                let remapped = composite_key(
                    key.split(COMPOSITE_SEPARATOR)
                        .map(|tag| remaps.get(tag).cloned().unwrap_or_else(|| tag.to_string())),
                );
                (remapped, grammemes)
            })
            .collect();
        Taxonomy { tags, remaps }
    }
}
