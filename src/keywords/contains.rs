use crate::{
    compiler::{self, Context, SchemaConstraint},
    drafts::Draft,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{
        helpers::{non_negative_integer, params},
        Keyword,
    },
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// `contains`, with `minContains` / `maxContains` absorbed at compile time
/// (they only modify how many matches `contains` needs).
#[derive(Debug)]
pub(crate) struct Contains {
    child: Arc<SchemaConstraint>,
    min: u64,
    max: Option<u64>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    parent: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let (min, max) = if matches!(ctx.draft, Draft::Draft6 | Draft::Draft7) {
        (1, None)
    } else {
        let min = match parent.get("minContains") {
            Some(min) => non_negative_integer(ctx, "minContains", min)?,
            None => 1,
        };
        let max = parent
            .get("maxContains")
            .map(|max| non_negative_integer(ctx, "maxContains", max))
            .transpose()?;
        (min, max)
    };
    Ok(Some(Keyword::Contains(Contains {
        child: compiler::compile(&ctx.push("contains"), value)?,
        min,
        max,
    })))
}

/// Consumed by `contains`; alone it asserts nothing.
pub(crate) fn compile_min_contains(
    _: &Context<'_>,
    _: &Map<String, Value>,
    _: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(None)
}

pub(crate) fn compile_max_contains(
    _: &Context<'_>,
    _: &Map<String, Value>,
    _: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(None)
}

impl Contains {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let Value::Array(items) = scope.instance else {
            return Ok(());
        };
        // Every index evaluates: the annotation must list all matches, and
        // `unevaluatedItems` consumes it
        let mut matched = Vec::new();
        for index in 0..items.len() {
            let results = scope.apply(&self.child, None, Target::Index(index))?;
            if evaluation.push_child(results) {
                matched.push(index);
            }
        }
        let count = matched.len() as u64;
        if count == 0 && self.min > 0 {
            scope.fail(
                evaluation,
                "contains",
                params([("value", scope.instance.clone())]),
            );
        } else if count < self.min {
            scope.fail(
                evaluation,
                "minContains",
                params([("matched", json!(count)), ("limit", json!(self.min))]),
            );
        } else if self.max.map_or(false, |max| count > max) {
            scope.fail(
                evaluation,
                "maxContains",
                params([
                    ("matched", json!(count)),
                    ("limit", json!(self.max.expect("Just checked"))),
                ]),
            );
        } else if count as usize == items.len() {
            // Everything matched
            evaluation.annotate(Value::Bool(true));
        } else {
            evaluation.annotate(Value::Array(
                matched.into_iter().map(|index| json!(index)).collect(),
            ));
        }
        Ok(())
    }
}
