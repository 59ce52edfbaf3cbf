//! The closed grammeme taxonomy.
//!
//! Every grammatical dimension is its own enum, and [`Grammeme`] is the tagged
//! union over all of them. The order in which the categories are declared below
//! is their sort priority: Number first, the other linguistic categories
//! alphabetically, and the control categories (Ignorable, PartOfSpeech) last.
//! Within a category, values sort by declaration order.

use std::fmt;
use std::str::FromStr;

use crate::taxonomy::TaxonomyError;

macro_rules! categories {
    ($(
        $(#[$meta:meta])*
        $category:ident ($attribute:expr) { $($value:ident),+ $(,)? }
    )+) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug,
                Clone,
                Copy,
                PartialEq,
                Eq,
                Hash,
                PartialOrd,
                Ord,
                parse_display::Display,
                parse_display::FromStr,
            )]
            #[display(style = "kebab-case")]
            pub enum $category {
                $($value),+
            }

            impl From<$category> for Grammeme {
                fn from(value: $category) -> Self {
                    Grammeme::$category(value)
                }
            }
        )+

        /// A grammatical dimension, such as case or number.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, parse_display::Display)]
        pub enum Category {
            $($category),+
        }

        impl Category {
            /// The XML attribute a grammeme of this category is written as, if any.
            pub fn attribute_name(self) -> Option<&'static str> {
                match self {
                    $(Category::$category => $attribute),+
                }
            }
        }

        /// A single grammatical feature value, tagged with its category.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Grammeme {
            $($category($category)),+
        }

        impl Grammeme {
            pub fn category(self) -> Category {
                match self {
                    $(Grammeme::$category(_) => Category::$category),+
                }
            }
        }

        impl fmt::Display for Grammeme {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Grammeme::$category(value) => value.fmt(f)),+
                }
            }
        }

        impl FromStr for Grammeme {
            type Err = TaxonomyError;

            /// Parses a printable grammeme name. ASCII case is ignored and `_`
            /// is accepted in place of `-`.
            fn from_str(name: &str) -> Result<Self, Self::Err> {
                let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
                $(
                    if let Ok(value) = normalized.parse::<$category>() {
                        return Ok(Grammeme::$category(value));
                    }
                )+
                Err(TaxonomyError::UnknownGrammeme(name.to_string()))
            }
        }
    };
}

categories! {
    /// Grammatical number. Sorted ahead of every other category.
    Number(Some("number")) { Singular, Plural, Dual, Unnumbered }

    AdjectiveType(Some("adjective-type")) { Attributive, Predicative, Possessive }

    /// Spelling variants. Never written into paradigm patterns.
    Alternate(None) { Spelling }

    Animacy(Some("animacy")) { Animate, Human, Nonhuman, Inanimate }

    Aspect(Some("aspect")) {
        Habitual,
        Imperfective,
        Imperfect,
        Perfect,
        Perfective,
        Pluperfect,
        Simple,
    }

    Case(Some("case")) {
        Abessive,
        Ablative,
        Absolutive,
        Accusative,
        Adessive,
        Allative,
        Benefactive,
        Causative,
        Comitative,
        Dative,
        Delative,
        Destinative,
        Direct,
        Directive,
        Elative,
        Ergative,
        Essive,
        Genitive,
        Illative,
        Inessive,
        Instructive,
        Instrumental,
        Locative,
        Motivative,
        Nominative,
        Oblique,
        Partitive,
        Prepositional,
        Prolative,
        Sociative,
        Sublative,
        Superessive,
        Terminative,
        Translative,
        Vocative,
    }

    ComparisonDegree(Some("comparison-degree")) { Positive, Plain, Comparative, Superlative, Equative }

    Count(Some("count")) { Countable, Uncountable }

    DeclensionClass(Some("declension")) { Weak, Mixed, Strong }

    Definiteness(Some("definiteness")) { Definite, Indefinite, Demonstrative, Construct }

    DerivationType(Some("derivation-type")) { Patronymic }

    Emphasis(Some("emphasis")) { Stressed, Unstressed }

    FormType(Some("form-type")) { ShortForm, LongForm }

    Gender(Some("gender")) { Masculine, Feminine, Neuter, Common, Nonvirile }

    Mood(Some("mood")) {
        Conditional,
        Emphatic,
        Imperative,
        Indicative,
        Jussive,
        Quotative,
        Subjunctive,
        Volitive,
    }

    Person(Some("person")) { First, Second, Third }

    Polarity(Some("polarity")) { Affirmative, Negative }

    PronounType(Some("pronoun-type")) { Personal, Reflexive }

    Register(Some("register")) {
        Conversational,
        Familiar,
        Formal,
        High,
        Pejorative,
        Informal,
        Intimate,
        Literary,
    }

    Sizeness(Some("sizeness")) { Augmentative, Diminutive }

    /// Phonological shape of the word, like vowel-start or consonant-end.
    Sound(None) {
        ConsonantStart,
        ConsonantEnd,
        RieulEnd,
        VowelStart,
        VowelEnd,
        BackRound,
        BackUnround,
        FrontRound,
        FrontUnround,
        HardConsonant,
        SoftConsonant,
    }

    Tense(Some("tense")) { Past, DistantPast, Present, Future }

    Transitivity(Some("transitivity")) { Intransitive, Transitive }

    /// Rare usage is turned into a flag on the lemma or form before analysis.
    Usage(None) { Standard, Rare }

    VerbType(Some("verb-type")) {
        Infinitive,
        Nonfinite,
        Gerund,
        Gerundive,
        Participle,
        Supine,
        Transgressive,
    }

    Voice(Some("voice")) { Active, Passive }

    WordOrder(Some("word-order")) { SubjectVerb, VerbSubject }

    /// Control markers: drop the lemma, drop the surface form, or drop the attribute.
    Ignorable(None) { IgnorableLemma, IgnorableInflection, IgnorableProperty }

    PartOfSpeech(None) {
        Article,
        Abbreviation,
        Adjective,
        Adverb,
        Classifier,
        Conjunction,
        Determiner,
        Ignorable,
        Interjection,
        Interrogative,
        Noun,
        Numeral,
        Particle,
        Preposition,
        Adposition,
        ProperNoun,
        Pronoun,
        Verb,
    }
}

impl Category {
    /// Part of speech and the ignorable markers carry control meaning rather
    /// than inflectional meaning.
    pub fn is_control(self) -> bool {
        matches!(self, Category::PartOfSpeech | Category::Ignorable)
    }
}

impl Grammeme {
    pub const ABBREVIATION: Grammeme = Grammeme::PartOfSpeech(PartOfSpeech::Abbreviation);
    pub const RARE: Grammeme = Grammeme::Usage(Usage::Rare);
    pub const IGNORABLE_LEMMA: Grammeme = Grammeme::Ignorable(Ignorable::IgnorableLemma);
    pub const IGNORABLE_INFLECTION: Grammeme = Grammeme::Ignorable(Ignorable::IgnorableInflection);
    pub const IGNORABLE_PROPERTY: Grammeme = Grammeme::Ignorable(Ignorable::IgnorableProperty);

    pub fn is_control(self) -> bool {
        self.category().is_control()
    }

    /// Spelling alternates say nothing about how a paradigm inflects.
    pub fn is_useful(self) -> bool {
        self.category() != Category::Alternate
    }

    /// ` name="value"` for the XML paradigm file, or an empty string for
    /// categories that are recognized but not written.
    pub fn xml_attribute(self) -> String {
        match self.category().attribute_name() {
            Some(name) => format!(" {name}=\"{self}\""),
            None => String::new(),
        }
    }
}
