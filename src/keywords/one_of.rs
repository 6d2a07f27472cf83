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
pub(crate) struct OneOf {
    children: Vec<Arc<SchemaConstraint>>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::OneOf(OneOf {
        children: compile_subschemas(ctx, "oneOf", value)?,
    })))
}

impl OneOf {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let mut matched = 0_usize;
        for (index, child) in self.children.iter().enumerate() {
            let results = scope.apply(child, Some(index.into()), Target::Current)?;
            if evaluation.push_child(results) {
                matched += 1;
                if matched > 1 && scope.short_circuit() {
                    break;
                }
            }
        }
        match matched {
            1 => {}
            0 => scope.fail(
                evaluation,
                "oneOf",
                params([("value", scope.instance.clone())]),
            ),
            _ => scope.fail(
                evaluation,
                "oneOf.multiple",
                params([("value", scope.instance.clone())]),
            ),
        }
        Ok(())
    }
}
