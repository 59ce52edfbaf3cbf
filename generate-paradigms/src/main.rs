use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use generate_paradigms::options::{
    LemmaFilter, parse_expansion, parse_extra_grammemes, parse_inflection_types, parse_tag_mapping,
};
use generate_paradigms::output::write_artifacts;
use generate_paradigms::records::record_schema;
use generate_paradigms::{CompileOptions, Compiler};
use grammar_utils::Taxonomy;
use grammar_utils::grammeme::Ignorable;
use log::{info, warn};

/// Compiles lemma records into inflection patterns and a dictionary listing.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON Lines files with one lemma record per line
    #[arg(required_unless_present = "record_schema")]
    sources: Vec<PathBuf>,

    /// The inflection pattern file to generate
    #[arg(long, default_value = "inflectional.xml")]
    inflections: PathBuf,

    /// The dictionary listing to generate
    #[arg(long, default_value = "dictionary.lst")]
    dictionary: PathBuf,

    /// Map a source tag to grammemes: tag,grammeme1[,grammeme2...]
    #[arg(long)]
    map_grammeme: Vec<String>,

    /// Rewrite a source tag before lookup: from,to
    #[arg(long)]
    remap_tag: Vec<String>,

    /// Replace forms matching the first grammemes with one copy per expansion: g1,g2:g3,g4
    #[arg(long)]
    expand_grammemes: Vec<String>,

    /// Parts of speech that get inflection patterns
    #[arg(long, default_value = "noun")]
    inflection_types: String,

    /// Tags or grammemes dropped wherever they appear
    #[arg(long, value_delimiter = ',')]
    ignore_property: Vec<String>,

    /// Tags or grammemes whose forms are dropped
    #[arg(long, value_delimiter = ',')]
    ignore_entries_with_grammemes: Vec<String>,

    /// Add the headword of every lemma even when no form spells it
    #[arg(long)]
    include_lemmas_without_words: bool,

    /// Also add the lowercased form of every word
    #[arg(long)]
    add_normalized_entry: bool,

    /// Language used for lowercasing
    #[arg(long, default_value = "en")]
    language: String,

    /// Timestamp of the newest source, echoed into the dictionary footer
    #[arg(long)]
    timestamp: Option<String>,

    /// File of `phrase: grammeme ...` lines added after all sources are read
    #[arg(long)]
    add_extra_grammemes: Option<PathBuf>,

    /// File of `id=rare`, `id=omit` and `id=id2,id3` lines
    #[arg(long)]
    lemma_filter: Option<PathBuf>,

    /// Print the JSON schema of a lemma record and exit
    #[arg(long)]
    record_schema: bool,
}

impl Args {
    fn taxonomy(&self) -> anyhow::Result<Taxonomy> {
        let mut builder = Taxonomy::builder();
        for remap in &self.remap_tag {
            let (from, to) = remap
                .split_once(',')
                .with_context(|| format!("expected from,to but got {remap}"))?;
            builder.remap(from, to);
        }
        for mapping in &self.map_grammeme {
            let (tag, grammemes) = parse_tag_mapping(mapping)?;
            builder.map(&tag, grammemes);
        }
        for tag in &self.ignore_property {
            builder.ignore(tag, Ignorable::IgnorableProperty);
        }
        for tag in &self.ignore_entries_with_grammemes {
            builder.ignore(tag, Ignorable::IgnorableInflection);
        }
        Ok(builder.build())
    }

    fn options(&self) -> anyhow::Result<CompileOptions> {
        let mut options = CompileOptions {
            inflection_types: parse_inflection_types(&self.inflection_types)?,
            include_lemmas_without_words: self.include_lemmas_without_words,
            add_normalized_entry: self.add_normalized_entry,
            language: self.language.clone(),
            ..CompileOptions::default()
        };
        for expansion in &self.expand_grammemes {
            let (from, to) = parse_expansion(expansion)?;
            options.add_expansion(from, to);
        }
        if let Some(path) = &self.add_extra_grammemes {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            options.extra_grammemes =
                parse_extra_grammemes(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        }
        if let Some(path) = &self.lemma_filter {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            options.lemma_filter =
                LemmaFilter::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        }
        options.invoked_with = self.invoked_with();
        Ok(options)
    }

    /// The options that shaped the output, in a fixed order.
    fn invoked_with(&self) -> Vec<String> {
        let mut invoked = Vec::new();
        let mut push = |flag: &str, value: Option<String>| {
            invoked.push(flag.to_string());
            invoked.extend(value);
        };
        if let Some(path) = &self.add_extra_grammemes {
            push("--add-extra-grammemes", Some(path.display().to_string()));
        }
        for mapping in &self.map_grammeme {
            push("--map-grammeme", Some(mapping.clone()));
        }
        for remap in &self.remap_tag {
            push("--remap-tag", Some(remap.clone()));
        }
        if !self.ignore_property.is_empty() {
            push("--ignore-property", Some(self.ignore_property.join(",")));
        }
        for expansion in &self.expand_grammemes {
            push("--expand-grammemes", Some(expansion.clone()));
        }
        push("--inflection-types", Some(self.inflection_types.clone()));
        if self.include_lemmas_without_words {
            push("--include-lemmas-without-words", None);
        }
        if !self.ignore_entries_with_grammemes.is_empty() {
            push(
                "--ignore-entries-with-grammemes",
                Some(self.ignore_entries_with_grammemes.join(",")),
            );
        }
        if let Some(timestamp) = &self.timestamp {
            push("--timestamp", Some(timestamp.clone()));
        }
        if self.add_normalized_entry {
            push("--add-normalized-entry", None);
        }
        push("--language", Some(self.language.clone()));
        if let Some(path) = &self.lemma_filter {
            push("--lemma-filter", Some(path.display().to_string()));
        }
        invoked
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.record_schema {
        println!("{}", record_schema()?);
        return Ok(());
    }

    let start = Instant::now();
    let mut compiler = Compiler::new(args.taxonomy()?, args.options()?);
    for source in &args.sources {
        compiler.compile_source(source)?;
    }
    let (document, options) = compiler.finish();

    write_artifacts(&document, &options, &args.sources, &args.inflections, &args.dictionary)?;

    info!(
        "Compiled {} lemmas into {} patterns and {} surface forms in {:.2?}",
        document.lemma_count,
        document.patterns.len(),
        document.dictionary.len(),
        start.elapsed()
    );

    if document.unusable_lemma_count > 0 {
        warn!("{} unusable lemmas", document.unusable_lemma_count);
        std::process::exit(document.unusable_lemma_count.clamp(1, 255) as i32);
    }
    Ok(())
}
