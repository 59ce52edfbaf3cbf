use grammar_utils::TaxonomyError;

/// Why a single lemma record could not be compiled.
///
/// None of these stop a run. The compiler logs them with the record's id or
/// headword and counts the lemma as unusable.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{tag} is not a known grammeme for {lemma}")]
    UnknownTag { tag: String, lemma: String },

    #[error("no valid stem length for {headword}")]
    AmbiguousStem { headword: String },

    #[error("disjoint inflection suffixes were merged into pattern {pattern:x}")]
    IrreconcilableMerge { pattern: u32 },

    #[error("line {line}: malformed lemma record")]
    MalformedSource {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl RecordError {
    pub(crate) fn unknown_tag(error: TaxonomyError, lemma: &str) -> Self {
        let tag = match error {
            TaxonomyError::UnknownTag(tag) | TaxonomyError::UnknownGrammeme(tag) => tag,
        };
        RecordError::UnknownTag {
            tag,
            lemma: lemma.to_string(),
        }
    }
}
