//! Turns lemma records into lemmas and feeds them to the document.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use grammar_utils::{Category, Grammeme, GrammemeSet, Inflection, Taxonomy};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::document::{DocumentState, Lemma};
use crate::error::RecordError;
use crate::options::CompileOptions;
use crate::records::LemmaRecord;

pub struct Compiler {
    taxonomy: Taxonomy,
    options: CompileOptions,
    document: DocumentState,
    /// Lemmas held back until their merge group can be assembled.
    deferred: BTreeMap<String, Lemma>,
    merged_groups: BTreeSet<String>,
}

impl Compiler {
    pub fn new(taxonomy: Taxonomy, options: CompileOptions) -> Self {
        Self {
            taxonomy,
            options,
            document: DocumentState::new(),
            deferred: BTreeMap::new(),
            merged_groups: BTreeSet::new(),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    /// Reads one JSON Lines source to the end, then assembles its merge groups.
    pub fn compile_source(&mut self, path: &Path) -> anyhow::Result<()> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} records from {msg} ({per_sec})")?,
        );
        pb.set_message(path.display().to_string());

        let unusable_before = self.document.unusable_lemma_count;
        let records = self
            .compile_reader(BufReader::new(file), &pb)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pb.finish_and_clear();

        info!(
            "{}: {records} records, {} unusable lemmas",
            path.display(),
            self.document.unusable_lemma_count - unusable_before
        );
        Ok(())
    }

    /// Compiles every line of `reader` and returns the number of lines read.
    pub fn compile_reader<R: BufRead>(&mut self, reader: R, pb: &ProgressBar) -> std::io::Result<usize> {
        let mut lines = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            lines += 1;
            pb.inc(1);
            if let Err(error) = self.compile_line(index + 1, &line) {
                warn!("{error}");
                self.document.unusable_lemma_count += 1;
            }
        }
        self.merge_deferred_lemmas();
        Ok(lines)
    }

    fn compile_line(&mut self, line_number: usize, line: &str) -> Result<(), RecordError> {
        match LemmaRecord::from_line(line_number, line)? {
            Some(record) => self.compile_record(&record),
            None => Ok(()),
        }
    }

    /// Compiles one record. Records that turn out unusable are counted here;
    /// errors are left for the caller to count.
    pub fn compile_record(&mut self, record: &LemmaRecord) -> Result<(), RecordError> {
        let id = record.id.as_deref();
        if id.is_some_and(|id| self.options.lemma_filter.omit.contains(id)) {
            return Ok(());
        }
        self.document.lemma_count += 1;

        let Some(lemma) = self.build_lemma(record)? else {
            self.document.unusable_lemma_count += 1;
            return Ok(());
        };

        match id.filter(|id| self.options.lemma_filter.is_deferred(id)) {
            Some(id) => {
                if self.deferred.insert(id.to_string(), lemma).is_some() {
                    warn!("{id}: duplicate lemma in a merge group, keeping the last one");
                    self.document.unusable_lemma_count += 1;
                }
                Ok(())
            }
            None => self.document.analyze_lemma(&lemma, &self.options),
        }
    }

    fn resolve_features(&self, tags: &[String], label: &str) -> Result<GrammemeSet, RecordError> {
        if self.taxonomy.has_composite(tags) {
            return self
                .taxonomy
                .resolve_composite(tags)
                .map_err(|error| RecordError::unknown_tag(error, label));
        }
        let mut grammemes = GrammemeSet::new();
        for tag in tags {
            let resolved = self
                .taxonomy
                .resolve(tag)
                .map_err(|error| RecordError::unknown_tag(error, label))?;
            grammemes.extend(&resolved);
        }
        Ok(grammemes)
    }

    /// Resolves a record's tags into a lemma. `None` means the lemma is
    /// unusable: it is ignorable, or none of its forms survived.
    fn build_lemma(&mut self, record: &LemmaRecord) -> Result<Option<Lemma>, RecordError> {
        let label = record.label();
        let mut grammemes = self
            .taxonomy
            .resolve(&record.part_of_speech_source_tag)
            .map_err(|error| RecordError::unknown_tag(error, label))?;

        let filtered_rare = record
            .id
            .as_deref()
            .is_some_and(|id| self.options.lemma_filter.rare.contains(id));
        if record.rare || filtered_rare {
            grammemes.insert(Grammeme::RARE);
        }

        let mut gender_tags = 0;
        for tag in &record.raw_attribute_tags {
            match self.taxonomy.resolve(tag) {
                Ok(resolved) => {
                    if resolved.has_category(Category::Gender) {
                        gender_tags += 1;
                    }
                    grammemes.extend(&resolved);
                }
                Err(_) => debug!("{tag} is not a known grammeme for {label}"),
            }
        }
        if grammemes.contains(Grammeme::IGNORABLE_LEMMA) || grammemes.contains(Grammeme::IGNORABLE_INFLECTION) {
            return Ok(None);
        }
        grammemes.remove(Grammeme::IGNORABLE_PROPERTY);
        // Several gender tags on a lemma rank genders rather than apply to every form.
        if gender_tags > 1 && grammemes.count_category(Category::Gender) > 1 {
            grammemes.remove_category(Category::Gender);
        }
        let genderless = grammemes.without_category(Category::Gender);

        let mut inflections = Vec::with_capacity(record.forms.len());
        for form in &record.forms {
            let mut form_grammemes = self.resolve_features(&form.raw_feature_tags, label)?;
            if form_grammemes.has_category(Category::Gender) {
                form_grammemes.extend(&genderless);
            } else {
                form_grammemes.extend(&grammemes);
            }
            if form_grammemes.contains(Grammeme::IGNORABLE_LEMMA) {
                return Ok(None);
            }
            if form_grammemes.contains(Grammeme::IGNORABLE_INFLECTION) {
                self.document.unusable_surface_form_count += 1;
                continue;
            }
            let rare = form_grammemes.remove(Grammeme::RARE);
            form_grammemes.remove(Grammeme::IGNORABLE_PROPERTY);

            match self.options.expand_grammemes.get(&form_grammemes) {
                Some(expansions) => {
                    for expansion in expansions {
                        let mut expanded = form_grammemes.clone();
                        expanded.extend(expansion);
                        inflections.push(Inflection::new(form.surface_form.as_str(), expanded, rare));
                    }
                }
                None => inflections.push(Inflection::new(form.surface_form.as_str(), form_grammemes, rare)),
            }
        }
        self.document.incoming_surface_forms += inflections.len();

        let rare = grammemes.remove(Grammeme::RARE);
        if inflections.is_empty() {
            return Ok(None);
        }
        grammemes.remove_category(Category::Gender);

        Ok(Some(Lemma {
            headword: record.headword.clone(),
            grammemes,
            rare,
            inflections,
        }))
    }

    /// Folds each held-back group into its head lemma and analyses it.
    fn merge_deferred_lemmas(&mut self) {
        for (head, members) in &self.options.lemma_filter.merge_groups {
            let Some(mut lemma) = self.deferred.remove(head) else {
                continue;
            };
            self.merged_groups.insert(head.clone());
            for member in members {
                match self.deferred.remove(member) {
                    Some(other) => {
                        lemma.inflections.extend(other.inflections);
                        lemma.rare |= other.rare;
                    }
                    None => {
                        warn!("{member}: id not found for the merge into {head}");
                        self.document.unusable_lemma_count += 1;
                    }
                }
            }
            if let Err(error) = self.document.analyze_lemma(&lemma, &self.options) {
                warn!("{head}: {error}");
                self.document.unusable_lemma_count += 1;
            }
        }
    }

    /// Applies the extra grammemes and renumbers patterns.
    pub fn finish(mut self) -> (DocumentState, CompileOptions) {
        for head in self.options.lemma_filter.merge_groups.keys() {
            if !self.merged_groups.contains(head) {
                warn!("{head}: id not found for its merge group");
                self.document.unusable_lemma_count += 1;
            }
        }
        for id in std::mem::take(&mut self.deferred).into_keys() {
            warn!("{id}: merge group was never assembled, dropping the lemma");
            self.document.unusable_lemma_count += 1;
        }
        self.document.add_extra_grammemes(&self.options.extra_grammemes);
        self.document.finalize();
        (self.document, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LemmaFilter;
    use crate::records::FormRecord;
    use grammar_utils::grammeme::{Case, Gender, Number, PartOfSpeech};

    fn record(id: &str, headword: &str, pos: &str, forms: &[(&str, &[&str])]) -> LemmaRecord {
        LemmaRecord {
            id: Some(id.to_string()),
            headword: headword.to_string(),
            part_of_speech_source_tag: pos.to_string(),
            rare: false,
            raw_attribute_tags: Vec::new(),
            forms: forms
                .iter()
                .map(|(surface, tags)| FormRecord {
                    surface_form: surface.to_string(),
                    raw_feature_tags: tags.iter().map(|tag| tag.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn compiler(options: CompileOptions) -> Compiler {
        Compiler::new(Taxonomy::builder().build(), options)
    }

    #[test]
    fn test_unknown_part_of_speech_is_rejected() {
        let mut compiler = compiler(CompileOptions::default());
        let error = compiler
            .compile_record(&record("L1", "x", "Q0", &[("x", &[])]))
            .unwrap_err();
        assert!(matches!(error, RecordError::UnknownTag { ref tag, .. } if tag == "Q0"));
        assert_eq!(compiler.document().lemma_count, 1);
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let mut compiler = compiler(CompileOptions::default());
        let error = compiler
            .compile_record(&record("L1", "x", "Q1084", &[("x", &["Q0"])]))
            .unwrap_err();
        assert!(matches!(error, RecordError::UnknownTag { .. }));
        assert!(compiler.document().dictionary.is_empty());
    }

    #[test]
    fn test_unknown_attribute_is_skipped() {
        let mut compiler = compiler(CompileOptions::default());
        let mut cat = record("L1", "cat", "Q1084", &[("cat", &["Q110786"]), ("cats", &["Q146786"])]);
        cat.raw_attribute_tags = vec!["Q0".to_string()];
        compiler.compile_record(&cat).unwrap();
        assert_eq!(compiler.document().dictionary.len(), 2);
    }

    #[test]
    fn test_lemma_gender_yields_to_form_gender() {
        let mut compiler = compiler(CompileOptions::default());
        let mut actor = record(
            "L1",
            "actor",
            "Q1084",
            &[("actor", &["Q110786"]), ("actress", &["Q110786", "Q1775415"])],
        );
        actor.raw_attribute_tags = vec!["Q499327".to_string()];
        compiler.compile_record(&actor).unwrap();

        let dictionary = &compiler.document().dictionary;
        assert!(dictionary["actor"].grammemes.contains(Gender::Masculine));
        assert!(dictionary["actress"].grammemes.contains(Gender::Feminine));
        assert!(!dictionary["actress"].grammemes.contains(Gender::Masculine));
    }

    #[test]
    fn test_ranked_lemma_genders_are_dropped() {
        let mut compiler = compiler(CompileOptions::default());
        let mut word = record("L1", "word", "Q1084", &[("word", &["Q110786"])]);
        word.raw_attribute_tags = vec!["Q499327".to_string(), "Q1775415".to_string()];
        compiler.compile_record(&word).unwrap();
        assert!(!compiler.document().dictionary["word"].grammemes.has_category(Category::Gender));
    }

    #[test]
    fn test_ignorable_lemma_and_inflection() {
        let mut compiler = compiler(CompileOptions::default());
        compiler
            .compile_record(&record("L1", "suffix", "Q9788", &[("suffix", &[])]))
            .unwrap();
        assert_eq!(compiler.document().unusable_lemma_count, 1);

        compiler
            .compile_record(&record(
                "L2",
                "cat",
                "Q1084",
                &[("cat", &["Q110786"]), ("catz", &["Q3241972"])],
            ))
            .unwrap();
        assert_eq!(compiler.document().unusable_surface_form_count, 1);
        assert!(!compiler.document().dictionary.contains_key("catz"));
    }

    #[test]
    fn test_rare_feature_marks_form_rare() {
        let mut compiler = compiler(CompileOptions::default());
        compiler
            .compile_record(&record(
                "L1",
                "ox",
                "Q1084",
                &[("ox", &["Q110786"]), ("oxen", &["Q146786"]), ("oxes", &["Q1098772"])],
            ))
            .unwrap();
        let document = compiler.document();
        let pattern = document.patterns.iter().next().unwrap();
        let last = pattern.suffixes().last().unwrap();
        assert_eq!(last.surface, "es");
        assert!(last.rare);
        assert!(!document.dictionary["oxes"].grammemes.contains(Grammeme::RARE));
    }

    #[test]
    fn test_rare_lemma() {
        let mut options = CompileOptions::default();
        options.lemma_filter.rare.insert("L1".to_string());
        let mut compiler = compiler(options);
        compiler
            .compile_record(&record("L1", "ox", "Q1084", &[("ox", &["Q110786"]), ("oxen", &["Q146786"])]))
            .unwrap();
        let entry = &compiler.document().dictionary["oxen"];
        assert_eq!(entry.rare_patterns.len(), 1);
    }

    #[test]
    fn test_omitted_lemma_is_not_counted() {
        let mut options = CompileOptions::default();
        options.lemma_filter.omit.insert("L1".to_string());
        let mut compiler = compiler(options);
        compiler
            .compile_record(&record("L1", "junk", "Q1084", &[("junk", &[])]))
            .unwrap();
        assert_eq!(compiler.document().lemma_count, 0);
        assert!(compiler.document().dictionary.is_empty());
    }

    #[test]
    fn test_grammeme_expansion() {
        let mut options = CompileOptions::default();
        let singular: GrammemeSet = [Grammeme::from(Number::Singular), PartOfSpeech::Noun.into()]
            .into_iter()
            .collect();
        options.add_expansion(singular.clone(), GrammemeSet::from(Grammeme::from(Case::Nominative)));
        options.add_expansion(singular, GrammemeSet::from(Grammeme::from(Case::Accusative)));
        let mut compiler = compiler(options);
        compiler
            .compile_record(&record("L1", "cat", "Q1084", &[("cat", &["Q110786"]), ("cats", &["Q146786"])]))
            .unwrap();
        let cat = &compiler.document().dictionary["cat"];
        assert!(cat.grammemes.contains(Case::Nominative));
        assert!(cat.grammemes.contains(Case::Accusative));
        assert_eq!(compiler.document().incoming_surface_forms, 3);
    }

    #[test]
    fn test_composite_feature_tags() {
        let mut builder = Taxonomy::builder();
        builder.map_composite(
            &["pl", "gen"],
            [Grammeme::from(Number::Plural), Case::Genitive.into()].into_iter().collect(),
        );
        let mut compiler = Compiler::new(builder.build(), CompileOptions::default());
        compiler
            .compile_record(&record("L1", "cat", "Q1084", &[("cats'", &["gen", "pl"])]))
            .unwrap();
        assert!(compiler.document().dictionary["cats'"].grammemes.contains(Case::Genitive));
    }

    #[test]
    fn test_merge_groups_fold_into_head() {
        let mut options = CompileOptions::default();
        options.lemma_filter = LemmaFilter::parse("L1=L2").unwrap();
        let mut compiler = compiler(options);
        let lines = [
            r#"{"id":"L1","headword":"ox","partOfSpeechSourceTag":"Q1084","forms":[{"surfaceForm":"ox","rawFeatureTags":["Q110786"]}]}"#,
            r#"{"id":"L2","headword":"oxen","partOfSpeechSourceTag":"Q1084","forms":[{"surfaceForm":"oxen","rawFeatureTags":["Q146786"]}]}"#,
        ]
        .join("\n");
        compiler
            .compile_reader(lines.as_bytes(), &ProgressBar::hidden())
            .unwrap();
        let (document, _) = compiler.finish();
        assert_eq!(document.patterns.len(), 1);
        let pattern = document.patterns.iter().next().unwrap();
        assert_eq!(pattern.suffixes().len(), 2);
        assert_eq!(document.unusable_lemma_count, 0);
    }

    #[test]
    fn test_members_of_a_missing_head_are_counted() {
        let mut options = CompileOptions::default();
        options.lemma_filter = LemmaFilter::parse("L1=L2,L3").unwrap();
        let mut compiler = compiler(options);
        let lines = [
            r#"{"id":"L2","headword":"oxen","partOfSpeechSourceTag":"Q1084","forms":[{"surfaceForm":"oxen","rawFeatureTags":["Q146786"]}]}"#,
            r#"{"id":"L3","headword":"oxes","partOfSpeechSourceTag":"Q1084","forms":[{"surfaceForm":"oxes","rawFeatureTags":["Q146786"]}]}"#,
        ]
        .join("\n");
        compiler
            .compile_reader(lines.as_bytes(), &ProgressBar::hidden())
            .unwrap();
        let (document, _) = compiler.finish();
        // The missing head and both of its members.
        assert_eq!(document.unusable_lemma_count, 3);
        assert!(document.dictionary.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_counted() {
        let mut compiler = compiler(CompileOptions::default());
        let lines = "{\"headword\":\n\n{\"headword\":\"a\",\"partOfSpeechSourceTag\":\"noun\"}\n";
        let read = compiler
            .compile_reader(lines.as_bytes(), &ProgressBar::hidden())
            .unwrap();
        assert_eq!(read, 3);
        let (document, _) = compiler.finish();
        assert_eq!(document.lemma_count, 1);
        assert_eq!(document.unusable_lemma_count, 2);
    }
}
