//! The normalized lemma records that source readers hand to the compiler.
//!
//! Records are stored one JSON object per line.

use unicode_normalization::UnicodeNormalization;

use crate::error::RecordError;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LemmaRecord {
    /// Stable source identifier, such as a Wikidata lexeme id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub headword: String,
    pub part_of_speech_source_tag: String,
    #[serde(default)]
    pub rare: bool,
    #[serde(default)]
    pub raw_attribute_tags: Vec<String>,
    #[serde(default)]
    pub forms: Vec<FormRecord>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    pub surface_form: String,
    #[serde(default)]
    pub raw_feature_tags: Vec<String>,
}

impl LemmaRecord {
    /// Parses one line of a record file. Blank lines yield `None`.
    pub fn from_line(line_number: usize, line: &str) -> Result<Option<Self>, RecordError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let mut record: LemmaRecord =
            serde_json::from_str(line).map_err(|source| RecordError::MalformedSource {
                line: line_number,
                source,
            })?;
        record.normalize();
        Ok(Some(record))
    }

    fn normalize(&mut self) {
        self.headword = self.headword.nfc().collect();
        for form in &mut self.forms {
            form.surface_form = form.surface_form.nfc().collect();
        }
    }

    /// The id if there is one, otherwise the headword.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.headword)
    }
}

/// JSON schema describing one record line.
pub fn record_schema() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&schemars::schema_for!(LemmaRecord))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_line() {
        let line = r#"{"id":"L1","headword":"city","partOfSpeechSourceTag":"Q1084","forms":[{"surfaceForm":"cities","rawFeatureTags":["Q146786"]}]}"#;
        let record = LemmaRecord::from_line(1, line).unwrap().unwrap();
        assert_eq!(record.label(), "L1");
        assert_eq!(record.part_of_speech_source_tag, "Q1084");
        assert!(!record.rare);
        assert!(record.raw_attribute_tags.is_empty());
        assert_eq!(
            record.forms,
            vec![FormRecord {
                surface_form: "cities".to_string(),
                raw_feature_tags: vec!["Q146786".to_string()],
            }]
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert!(LemmaRecord::from_line(3, "   ").unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let error = LemmaRecord::from_line(7, "{\"headword\":").unwrap_err();
        assert!(matches!(error, RecordError::MalformedSource { line: 7, .. }));
    }

    #[test]
    fn test_surface_forms_are_nfc() {
        let line = "{\"headword\":\"cafe\\u0301\",\"partOfSpeechSourceTag\":\"noun\",\"forms\":[{\"surfaceForm\":\"cafe\\u0301s\"}]}";
        let record = LemmaRecord::from_line(1, line).unwrap().unwrap();
        assert_eq!(record.headword, "caf\u{e9}");
        assert_eq!(record.forms[0].surface_form, "caf\u{e9}s");
        assert_eq!(record.label(), "caf\u{e9}");
    }

    #[test]
    fn test_schema_names_camel_case_fields() {
        let schema = record_schema().unwrap();
        assert!(schema.contains("partOfSpeechSourceTag"));
        assert!(schema.contains("rawFeatureTags"));
    }
}
