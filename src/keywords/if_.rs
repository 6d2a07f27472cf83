//! `if` / `then` / `else`.
//!
//! The branches are separate keyword constraints: `if` always succeeds and
//! annotates whether its sub-schema matched; `then` and `else` consume that
//! annotation through their sibling dependency and skip when their branch was
//! not taken. The schema's validity therefore ignores the outcome of `if`
//! itself and inherits the chosen branch's validity.
use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Siblings, Target},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct If {
    child: Arc<SchemaConstraint>,
}

#[derive(Debug)]
pub(crate) struct Then {
    child: Arc<SchemaConstraint>,
}

#[derive(Debug)]
pub(crate) struct Else {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::If(If {
        child: compiler::compile(&ctx.push("if"), value)?,
    })))
}

pub(crate) fn compile_then(
    ctx: &Context<'_>,
    parent: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    if !parent.contains_key("if") {
        // Without `if` the branch can never be taken
        return Ok(None);
    }
    Ok(Some(Keyword::Then(Then {
        child: compiler::compile(&ctx.push("then"), value)?,
    })))
}

pub(crate) fn compile_else(
    ctx: &Context<'_>,
    parent: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    if !parent.contains_key("if") {
        return Ok(None);
    }
    Ok(Some(Keyword::Else(Else {
        child: compiler::compile(&ctx.push("else"), value)?,
    })))
}

impl If {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let results = scope.apply(&self.child, None, Target::Current)?;
        let matched = evaluation.push_child(results);
        evaluation.annotate(Value::Bool(matched));
        Ok(())
    }
}

impl Then {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        match siblings.annotation("if") {
            Some(Value::Bool(true)) => {
                let results = scope.apply(&self.child, None, Target::Current)?;
                if !evaluation.push_child(results) {
                    scope.fail(
                        evaluation,
                        "then",
                        params([("value", scope.instance.clone())]),
                    );
                }
            }
            _ => evaluation.skip(),
        }
        Ok(())
    }
}

impl Else {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        match siblings.annotation("if") {
            Some(Value::Bool(false)) => {
                let results = scope.apply(&self.child, None, Target::Current)?;
                if !evaluation.push_child(results) {
                    scope.fail(
                        evaluation,
                        "else",
                        params([("value", scope.instance.clone())]),
                    );
                }
            }
            _ => evaluation.skip(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}}), &json!(4))]
    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}}), &json!(-3); "if fails then is skipped")]
    #[test_case(&json!({"if": {"minimum": 0}, "else": {"multipleOf": 2}}), &json!(3); "if passes else is skipped")]
    #[test_case(&json!({"if": {"minimum": 0}, "else": {"multipleOf": 2}}), &json!(-4))]
    #[test_case(&json!({"then": {"multipleOf": 2}}), &json!(3); "then without if is inert")]
    #[test_case(&json!({"else": false}), &json!(3); "else without if is inert")]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}}), &json!(3))]
    #[test_case(&json!({"if": {"minimum": 0}, "else": {"multipleOf": 2}}), &json!(-3))]
    #[test_case(&json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}, "else": {"multipleOf": 3}}), &json!(-4))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn untaken_branch_is_skipped() {
        let results = tests_util::evaluate(
            &json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}, "else": {"multipleOf": 3}}),
            &json!(4),
        );
        assert!(results.is_valid());
        let skipped: Vec<_> = results
            .nested()
            .iter()
            .filter(|node| node.is_skipped())
            .collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].evaluation_path().to_string(), "/else");
    }
}
