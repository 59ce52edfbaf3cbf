//! Settings that shape a compilation run, and parsers for the text formats the
//! command line accepts.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, bail};
use grammar_utils::grammeme::PartOfSpeech;
use grammar_utils::{Category, Grammeme, GrammemeSet, TaxonomyError};

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Parts of speech whose lemmas get an inflection pattern.
    pub inflection_types: GrammemeSet,
    /// A form whose grammemes equal a key is replaced by one copy per value,
    /// each extended with that value's grammemes.
    pub expand_grammemes: BTreeMap<GrammemeSet, Vec<GrammemeSet>>,
    pub include_lemmas_without_words: bool,
    pub add_normalized_entry: bool,
    /// Language code used for case folding.
    pub language: String,
    /// Grammemes added to dictionary entries after every source is read.
    pub extra_grammemes: BTreeMap<String, GrammemeSet>,
    pub lemma_filter: LemmaFilter,
    /// The options echoed into the dictionary footer.
    pub invoked_with: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            inflection_types: GrammemeSet::from(Grammeme::PartOfSpeech(PartOfSpeech::Noun)),
            expand_grammemes: BTreeMap::new(),
            include_lemmas_without_words: false,
            add_normalized_entry: false,
            language: "en".to_string(),
            extra_grammemes: BTreeMap::new(),
            lemma_filter: LemmaFilter::default(),
            invoked_with: Vec::new(),
        }
    }
}

impl CompileOptions {
    pub fn add_expansion(&mut self, from: GrammemeSet, to: GrammemeSet) {
        self.expand_grammemes.entry(from).or_default().push(to);
    }

    /// Lowercases a phrase the way the configured language does.
    pub fn lowercase(&self, phrase: &str) -> String {
        match self.language.as_str() {
            "tr" | "az" => phrase
                .chars()
                .flat_map(|c| match c {
                    'I' => vec!['ı'],
                    'İ' => vec!['i'],
                    c => c.to_lowercase().collect(),
                })
                .collect(),
            _ => phrase.to_lowercase(),
        }
    }
}

/// Parses `a,b,c` into a grammeme set.
pub fn parse_grammeme_list(list: &str) -> Result<GrammemeSet, TaxonomyError> {
    list.split(',')
        .filter(|name| !name.trim().is_empty())
        .map(str::parse::<Grammeme>)
        .collect()
}

/// Parses `--inflection-types noun,proper-noun`.
pub fn parse_inflection_types(list: &str) -> anyhow::Result<GrammemeSet> {
    let grammemes = parse_grammeme_list(list)?;
    if let Some(other) = grammemes
        .iter()
        .find(|grammeme| grammeme.category() != Category::PartOfSpeech)
    {
        bail!("{other} is not a part of speech");
    }
    Ok(grammemes)
}

/// Parses `--expand-grammemes a,b:c,d`.
pub fn parse_expansion(arg: &str) -> anyhow::Result<(GrammemeSet, GrammemeSet)> {
    let Some((from, to)) = arg.split_once(':') else {
        bail!("expected grammeme1,grammeme2:grammeme3,grammeme4 but got {arg}");
    };
    Ok((parse_grammeme_list(from)?, parse_grammeme_list(to)?))
}

/// Parses `--map-grammeme tag,g1,g2` into the tag and its grammemes.
pub fn parse_tag_mapping(arg: &str) -> anyhow::Result<(String, GrammemeSet)> {
    let Some((tag, grammemes)) = arg.split_once(',') else {
        bail!("expected tag,grammeme1[,grammeme2...] but got {arg}");
    };
    Ok((tag.to_string(), parse_grammeme_list(grammemes)?))
}

/// Parses an extra grammeme file: `phrase: grammeme grammeme ...` per line.
pub fn parse_extra_grammemes(text: &str) -> anyhow::Result<BTreeMap<String, GrammemeSet>> {
    let mut extra: BTreeMap<String, GrammemeSet> = BTreeMap::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (phrase, names) = line
            .split_once(':')
            .with_context(|| format!("line {}: missing ':' after the phrase", index + 1))?;
        let grammemes = extra.entry(phrase.to_string()).or_default();
        for name in names.split_whitespace() {
            let grammeme = name
                .parse::<Grammeme>()
                .with_context(|| format!("line {}", index + 1))?;
            if grammeme != Grammeme::IGNORABLE_PROPERTY {
                grammemes.insert(grammeme);
            }
        }
    }
    Ok(extra)
}

/// Per-lemma overrides keyed by source id.
#[derive(Debug, Clone, Default)]
pub struct LemmaFilter {
    pub rare: BTreeSet<String>,
    pub omit: BTreeSet<String>,
    /// Group head to the ids whose forms are folded into it.
    pub merge_groups: BTreeMap<String, Vec<String>>,
}

impl LemmaFilter {
    /// Parses `id=rare`, `id=omit` and `id=id2,id3` lines. `#` starts a comment.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut filter = Self::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((id, value)) = line.split_once('=') else {
                bail!("line {}: expected id=value but got {line}", index + 1);
            };
            let (id, value) = (id.trim(), value.trim());
            match value {
                "rare" => {
                    filter.rare.insert(id.to_string());
                }
                "omit" => {
                    filter.omit.insert(id.to_string());
                }
                _ if value.split(',').all(is_lemma_id) => {
                    filter
                        .merge_groups
                        .entry(id.to_string())
                        .or_default()
                        .extend(value.split(',').map(str::to_string));
                }
                _ => bail!("{id}: unknown lemma filter value {value}"),
            }
        }
        Ok(filter)
    }

    /// Whether the id heads or belongs to a merge group.
    pub fn is_deferred(&self, id: &str) -> bool {
        self.merge_groups.contains_key(id)
            || self
                .merge_groups
                .values()
                .any(|members| members.iter().any(|member| member == id))
    }
}

/// Letters followed by digits, like `L1234`.
fn is_lemma_id(id: &str) -> bool {
    let digits = id.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.len() < id.len() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammar_utils::grammeme::{Case, Gender, Number};

    #[test]
    fn test_parse_grammeme_list() {
        let grammemes = parse_grammeme_list("plural,GENITIVE").unwrap();
        assert!(grammemes.contains(Number::Plural));
        assert!(grammemes.contains(Case::Genitive));
        assert_eq!(
            parse_grammeme_list("plural,bogus"),
            Err(TaxonomyError::UnknownGrammeme("bogus".to_string()))
        );
    }

    #[test]
    fn test_inflection_types_must_be_parts_of_speech() {
        let types = parse_inflection_types("noun,proper-noun").unwrap();
        assert_eq!(types.len(), 2);
        assert!(parse_inflection_types("noun,plural").is_err());
    }

    #[test]
    fn test_parse_expansion() {
        let (from, to) = parse_expansion("singular,masculine:nominative").unwrap();
        assert!(from.contains(Gender::Masculine));
        assert!(to.contains(Case::Nominative));
        assert!(parse_expansion("singular").is_err());
    }

    #[test]
    fn test_parse_tag_mapping() {
        let (tag, grammemes) = parse_tag_mapping("Q999,plural,dative").unwrap();
        assert_eq!(tag, "Q999");
        assert_eq!(grammemes.len(), 2);
    }

    #[test]
    fn test_parse_extra_grammemes() {
        let extra = parse_extra_grammemes("cats: plural ignorable-property\n\ndog: singular\n").unwrap();
        assert_eq!(extra["cats"], GrammemeSet::from(Grammeme::from(Number::Plural)));
        assert_eq!(extra["dog"], GrammemeSet::from(Grammeme::from(Number::Singular)));
        assert!(parse_extra_grammemes("cats plural").is_err());
        assert!(parse_extra_grammemes("cats: nonsense").is_err());
    }

    #[test]
    fn test_lemma_filter() {
        let filter = LemmaFilter::parse("# comment\nL1=rare\nL2 = omit\nL3=L4,L5\n\n").unwrap();
        assert!(filter.rare.contains("L1"));
        assert!(filter.omit.contains("L2"));
        assert_eq!(filter.merge_groups["L3"], vec!["L4", "L5"]);
        assert!(filter.is_deferred("L3"));
        assert!(filter.is_deferred("L5"));
        assert!(!filter.is_deferred("L1"));
        assert!(LemmaFilter::parse("L1=sometimes").is_err());
    }

    #[test]
    fn test_lowercase_turkish_dotted_i() {
        let mut options = CompileOptions::default();
        assert_eq!(options.lowercase("Istanbul"), "istanbul");
        options.language = "tr".to_string();
        assert_eq!(options.lowercase("Istanbul"), "ıstanbul");
        assert_eq!(options.lowercase("İzmir"), "izmir");
    }
}
