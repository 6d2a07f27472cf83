use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};

pub(crate) type FormatCheck = dyn Fn(&str) -> bool + Send + Sync;

/// The `format` keyword.
///
/// Always produces its name as an annotation. Asserts only when format
/// validation is enabled and a checker for the named format is registered;
/// checkers themselves are caller plugins.
pub(crate) struct Format {
    format: Box<str>,
    checker: Option<Arc<FormatCheck>>,
    assert: bool,
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("format", &self.format)
            .field("assert", &self.assert)
            .finish_non_exhaustive()
    }
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(format) = value else {
        return Err(SchemaError::invalid_form(
            "format",
            ctx.location(),
            "expected a string",
        ));
    };
    let assert = ctx
        .options
        .validate_formats()
        .unwrap_or_else(|| ctx.draft.validates_formats_by_default());
    Ok(Some(Keyword::Format(Format {
        format: format.clone().into_boxed_str(),
        checker: ctx.options.format_checker(format),
        assert,
    })))
}

impl Format {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let (true, Some(checker), Value::String(item)) =
            (self.assert, &self.checker, scope.instance)
        {
            if !checker(item) {
                scope.fail(
                    evaluation,
                    "format",
                    params([
                        ("value", scope.instance.clone()),
                        ("format", Value::String(self.format.to_string())),
                    ]),
                );
                return Ok(());
            }
        }
        evaluation.annotate(Value::String(self.format.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;

    fn even_length(value: &str) -> bool {
        value.len() % 2 == 0
    }

    #[test]
    fn annotation_only_without_checker() {
        let validator = crate::options()
            .build(&json!({"format": "unknown-format"}))
            .expect("Valid schema");
        assert!(validator.is_valid(&json!("anything")));
    }

    #[test]
    fn assertional_with_registered_checker() {
        let validator = crate::options()
            .with_format("even", even_length)
            .with_format_validation(true)
            .build(&json!({"format": "even"}))
            .expect("Valid schema");
        assert!(validator.is_valid(&json!("ab")));
        assert!(!validator.is_valid(&json!("abc")));
        // Non-strings are out of scope for formats
        assert!(validator.is_valid(&json!(1)));
    }

    #[test]
    fn checker_is_ignored_when_validation_is_off() {
        let validator = crate::options()
            .with_format("even", even_length)
            .with_format_validation(false)
            .build(&json!({"format": "even"}))
            .expect("Valid schema");
        assert!(validator.is_valid(&json!("abc")));
    }

    #[test]
    fn annotation_is_produced() {
        let results = tests_util::evaluate(&json!({"format": "email"}), &json!("x"));
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("format", &json!("email"))));
    }
}
