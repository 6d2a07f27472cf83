use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::KeywordEvaluation,
    keywords::Keyword,
};
use serde_json::{Map, Value};

/// A keyword that only contributes its raw value as an annotation: metadata
/// keywords (`title`, `default`, ...), content keywords, and keywords unknown
/// to the active draft.
#[derive(Debug)]
pub(crate) struct Annotation {
    value: Value,
}

impl Annotation {
    pub(crate) fn new(value: Value) -> Annotation {
        Annotation { value }
    }

    pub(crate) fn evaluate(
        &self,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        evaluation.annotate(self.value.clone());
        Ok(())
    }
}

pub(crate) fn compile(
    _: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::Annotation(Annotation::new(value.clone()))))
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;

    #[test]
    fn metadata_keywords_annotate() {
        let results = tests_util::evaluate(
            &json!({"title": "A title", "deprecated": true}),
            &json!(null),
        );
        assert!(results.is_valid());
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("title", &json!("A title"))));
        assert!(annotations.contains(&("deprecated", &json!(true))));
    }

    #[test]
    fn unknown_keywords_annotate_their_raw_value() {
        let results = tests_util::evaluate(&json!({"x-vendor": {"a": 1}}), &json!(null));
        assert!(results.is_valid());
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("x-vendor", &json!({"a": 1}))));
    }
}
