use crate::{
    compiler::{Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{
        helpers::{compile_subschemas, params},
        Keyword,
    },
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct AnyOf {
    children: Vec<Arc<SchemaConstraint>>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::AnyOf(AnyOf {
        children: compile_subschemas(ctx, "anyOf", value)?,
    })))
}

impl AnyOf {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let mut valid = false;
        // Every branch evaluates, even in short-circuit mode: skipping a
        // valid branch would drop annotations that `unevaluated*` consumes
        for (index, child) in self.children.iter().enumerate() {
            let results = scope.apply(child, Some(index.into()), Target::Current)?;
            if evaluation.push_child(results) {
                valid = true;
            }
        }
        if !valid {
            scope.fail(
                evaluation,
                "anyOf",
                params([("value", scope.instance.clone())]),
            );
        }
        Ok(())
    }
}
