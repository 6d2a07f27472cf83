use serde_json::Value;

/// JSON Schema draft version.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Draft {
    /// JSON Schema Draft 6
    Draft6,
    /// JSON Schema Draft 7
    Draft7,
    /// JSON Schema Draft 2019-09
    Draft201909,
    /// JSON Schema Draft 2020-12
    Draft202012,
    /// The next, in-progress JSON Schema draft
    DraftNext,
}

impl Default for Draft {
    fn default() -> Self {
        Draft::Draft202012
    }
}

impl Draft {
    /// Get the `Draft` from a `$schema` URL.
    pub(crate) fn from_url(url: &str) -> Option<Draft> {
        match url.trim_end_matches('#') {
            "https://json-schema.org/draft/next/schema" => Some(Draft::DraftNext),
            "https://json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
            "https://json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            "http://json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            "http://json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            _ => None,
        }
    }

    /// Detect the draft from the `$schema` property of a schema document.
    pub(crate) fn detect(schema: &Value) -> Option<Draft> {
        schema
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Draft::from_url)
    }

    /// The meta-schema URI for this draft.
    pub(crate) const fn meta_schema_url(self) -> &'static str {
        match self {
            Draft::Draft6 => "http://json-schema.org/draft-06/schema",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
            Draft::DraftNext => "https://json-schema.org/draft/next/schema",
        }
    }

    /// Identifier of a schema resource, if any.
    ///
    /// In drafts 6 and 7 an `$id` of the form `#name` declares a
    /// location-independent anchor, not a resource identifier.
    pub(crate) fn id_of(self, schema: &Value) -> Option<&str> {
        let id = schema.get("$id").and_then(Value::as_str)?;
        if matches!(self, Draft::Draft6 | Draft::Draft7) && id.starts_with('#') {
            None
        } else {
            Some(id)
        }
    }

    /// Location-independent anchor declared on a schema object, if any.
    pub(crate) fn anchor_of(self, schema: &Value) -> Option<&str> {
        match self {
            Draft::Draft6 | Draft::Draft7 => schema
                .get("$id")
                .and_then(Value::as_str)
                .and_then(|id| id.strip_prefix('#'))
                .filter(|name| !name.is_empty()),
            _ => schema.get("$anchor").and_then(Value::as_str),
        }
    }

    /// Whether `$ref` may be evaluated alongside sibling keywords.
    pub(crate) const fn supports_adjacent_validation(self) -> bool {
        !matches!(self, Draft::Draft6 | Draft::Draft7)
    }

    pub(crate) const fn validates_formats_by_default(self) -> bool {
        matches!(self, Draft::Draft6 | Draft::Draft7)
    }

    const fn to_bit(self) -> u8 {
        match self {
            Draft::Draft6 => 1,
            Draft::Draft7 => 2,
            Draft::Draft201909 => 4,
            Draft::Draft202012 => 8,
            Draft::DraftNext => 16,
        }
    }
}

/// Compact set of drafts a keyword is defined in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct DraftSet(u8);

impl DraftSet {
    pub(crate) const ALL: DraftSet = DraftSet(0b11111);
    pub(crate) const LEGACY: DraftSet = DraftSet(0b00011);
    pub(crate) const DRAFT7_ON: DraftSet = DraftSet(0b11110);
    pub(crate) const DRAFT201909_ON: DraftSet = DraftSet(0b11100);
    pub(crate) const DRAFT201909_ONLY: DraftSet = DraftSet(0b00100);
    pub(crate) const DRAFT202012_ON: DraftSet = DraftSet(0b11000);
    pub(crate) const UNTIL_DRAFT201909: DraftSet = DraftSet(0b00111);

    pub(crate) const fn contains(self, draft: Draft) -> bool {
        self.0 & draft.to_bit() != 0
    }
}

/// A named bundle of keywords that a meta-schema may require or support.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Vocabulary {
    /// `$ref`, anchors, identifiers.
    Core,
    /// Keywords applying sub-schemas to the instance.
    Applicator,
    /// Assertion keywords.
    Validation,
    /// `unevaluatedProperties` / `unevaluatedItems`.
    Unevaluated,
    /// `format`.
    Format,
    /// Annotation-only metadata keywords.
    Metadata,
    /// `contentEncoding` / `contentMediaType` / `contentSchema`.
    Content,
}

const fn vocabulary_bit(vocabulary: Vocabulary) -> u8 {
    match vocabulary {
        Vocabulary::Core => 1,
        Vocabulary::Applicator => 2,
        Vocabulary::Validation => 4,
        Vocabulary::Unevaluated => 8,
        Vocabulary::Format => 16,
        Vocabulary::Metadata => 32,
        Vocabulary::Content => 64,
    }
}

/// Set of active vocabularies.
///
/// All standard vocabularies of a draft are active by default; evaluating
/// `$vocabulary` declarations of caller-supplied meta-schemas is the schema
/// loader's concern.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct VocabularySet(u8);

impl VocabularySet {
    pub(crate) const fn standard() -> Self {
        VocabularySet(0b1111111)
    }

    pub(crate) const fn contains(self, vocabulary: Vocabulary) -> bool {
        self.0 & vocabulary_bit(vocabulary) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!({"$schema": "https://json-schema.org/draft/2020-12/schema"}), Some(Draft::Draft202012))]
    #[test_case(&json!({"$schema": "https://json-schema.org/draft/2019-09/schema#"}), Some(Draft::Draft201909))]
    #[test_case(&json!({"$schema": "http://json-schema.org/draft-07/schema#"}), Some(Draft::Draft7))]
    #[test_case(&json!({"$schema": "http://json-schema.org/draft-06/schema#"}), Some(Draft::Draft6))]
    #[test_case(&json!({"$schema": "https://json-schema.org/draft/next/schema"}), Some(Draft::DraftNext))]
    #[test_case(&json!({"$schema": "http://example.com/custom/schema#"}), None)]
    #[test_case(&json!({}), None)]
    fn draft_detection(schema: &Value, expected: Option<Draft>) {
        assert_eq!(Draft::detect(schema), expected);
    }

    #[test]
    fn legacy_anchor_form() {
        let schema = json!({"$id": "#foo"});
        assert_eq!(Draft::Draft7.id_of(&schema), None);
        assert_eq!(Draft::Draft7.anchor_of(&schema), Some("foo"));
        // In 2020-12 the same `$id` is a (malformed) resource identifier
        assert_eq!(Draft::Draft202012.id_of(&schema), Some("#foo"));
        assert_eq!(Draft::Draft202012.anchor_of(&schema), None);
    }

    #[test]
    fn draft_sets() {
        assert!(DraftSet::ALL.contains(Draft::Draft6));
        assert!(DraftSet::DRAFT201909_ON.contains(Draft::DraftNext));
        assert!(!DraftSet::DRAFT201909_ON.contains(Draft::Draft7));
        assert!(DraftSet::UNTIL_DRAFT201909.contains(Draft::Draft201909));
        assert!(!DraftSet::UNTIL_DRAFT201909.contains(Draft::Draft202012));
    }

    #[test]
    fn default_is_latest_stable() {
        assert_eq!(Draft::default(), Draft::Draft202012);
    }
}
