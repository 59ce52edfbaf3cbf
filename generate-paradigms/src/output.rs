//! Writers for the paradigm XML and the dictionary listing.
//!
//! Both expect a document whose patterns have been finalized.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use grammar_utils::Grammeme;

use crate::document::DocumentState;
use crate::options::CompileOptions;

const RULE: &str = "==============================================";
const LICENSE: &str =
    "License: Creative Commons CC0 License (https://creativecommons.org/publicdomain/zero/1.0/)";

pub fn write_paradigms<W: Write>(document: &DocumentState, mut out: W) -> std::io::Result<()> {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(out, "<patterns>")?;
    for pattern in document.patterns.iter() {
        write!(out, "{pattern}")?;
    }
    writeln!(out, "</patterns>")?;
    out.flush()
}

/// A ratio as a percentage with at most one fractional digit.
fn percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        return "0%".to_string();
    }
    let value = format!("{:.1}", numerator as f64 * 100.0 / denominator as f64);
    let value = value.strip_suffix(".0").unwrap_or(&value);
    format!("{value}%")
}

fn source_names(sources: &[PathBuf]) -> String {
    sources
        .iter()
        .map(|source| {
            let name = source
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_else(|| source.to_string_lossy());
            format!("{name} ")
        })
        .collect()
}

pub fn write_dictionary<W: Write>(
    document: &DocumentState,
    options: &CompileOptions,
    sources: &[PathBuf],
    mut out: W,
) -> std::io::Result<()> {
    let inflectional = document.is_inflectional();
    let mut grammeme_counts: BTreeMap<Grammeme, usize> = BTreeMap::new();
    let mut unclassified = 0;

    for entry in document.dictionary.values() {
        if entry.grammemes.is_empty() {
            unclassified += 1;
            continue;
        }
        writeln!(out, "{}", entry.render(&document.patterns, inflectional))?;
        for grammeme in entry.grammemes.iter() {
            *grammeme_counts.entry(grammeme).or_default() += 1;
        }
    }

    let size = document.dictionary.len();
    let usable = size - unclassified;
    let with_percent = |count: usize, total: usize| format!("({})", percent(count, total));

    writeln!(out, "{RULE}")?;
    writeln!(out, "{:>30} {:>7}", "Source:", source_names(sources))?;
    writeln!(out, "{:>30} {:>7}", "Lemma terms:", document.lemma_count)?;
    writeln!(out, "{:>30} {:>7}", "Unusable lemma terms:", document.unusable_lemma_count)?;
    writeln!(out, "{:>30} {:>7}", "Incoming surface forms:", document.incoming_surface_forms)?;
    writeln!(out, "{:>30} {:>7}", "Surface forms:", size)?;
    writeln!(
        out,
        "{:>30} {:>7} {:>7}",
        "Collapsed surface forms:",
        document.merged_count,
        with_percent(document.merged_count, document.incoming_surface_forms)
    )?;
    writeln!(
        out,
        "{:>30} {:>7}",
        "Unusable surface forms:", document.unusable_surface_form_count
    )?;
    writeln!(out, "{:>30} {:>7} {:>7}", "Usable terms:", usable, with_percent(usable, size))?;
    writeln!(
        out,
        "{:>30} {:>7} {:>7}",
        "Unclassified terms:",
        unclassified,
        with_percent(unclassified, size)
    )?;
    writeln!(out, "{RULE}")?;

    let mut categories: BTreeMap<String, Vec<(usize, Grammeme)>> = BTreeMap::new();
    for (&grammeme, &count) in &grammeme_counts {
        categories
            .entry(grammeme.category().to_string())
            .or_default()
            .push((count, grammeme));
    }
    for (category, mut values) in categories {
        writeln!(out, "{category}:")?;
        values.sort();
        for (count, grammeme) in values.into_iter().rev() {
            writeln!(
                out,
                "    {:<20} {:>7} {:>7}",
                format!("{grammeme}:"),
                count,
                with_percent(count, size)
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{LICENSE}")?;
    writeln!(out, "generated with options: {}", options.invoked_with.join(" "))?;
    out.flush()
}

/// Writes the dictionary, and the paradigm file when the document has
/// paradigms worth writing.
pub fn write_artifacts(
    document: &DocumentState,
    options: &CompileOptions,
    sources: &[PathBuf],
    inflections_path: &Path,
    dictionary_path: &Path,
) -> anyhow::Result<()> {
    if document.is_inflectional() {
        let file = File::create(inflections_path)
            .with_context(|| format!("Failed to create {}", inflections_path.display()))?;
        write_paradigms(document, BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", inflections_path.display()))?;
    }
    let file = File::create(dictionary_path)
        .with_context(|| format!("Failed to create {}", dictionary_path.display()))?;
    write_dictionary(document, options, sources, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", dictionary_path.display()))?;
    Ok(())
}
