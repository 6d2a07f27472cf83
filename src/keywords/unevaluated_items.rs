use crate::{
    compiler::{self, Context, SchemaConstraint},
    drafts::Draft,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Siblings, Target},
    keywords::{helpers::params, Keyword},
};
use ahash::AHashSet;
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct UnevaluatedItems {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::UnevaluatedItems(UnevaluatedItems {
        child: compiler::compile(&ctx.push("unevaluatedItems"), value)?,
    })))
}

impl UnevaluatedItems {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        let Value::Array(items) = scope.instance else {
            return Ok(());
        };
        // `contains` annotations only count from 2020-12 on
        let sources: &[&str] = if scope.draft == Draft::Draft201909 {
            &["prefixItems", "items", "additionalItems", "unevaluatedItems"]
        } else {
            &[
                "prefixItems",
                "items",
                "additionalItems",
                "contains",
                "unevaluatedItems",
            ]
        };
        let mut start = 0_usize;
        let mut covered: AHashSet<usize> = AHashSet::new();
        for annotation in siblings.gather(sources, scope.instance_location) {
            match annotation {
                Value::Bool(true) => {
                    evaluation.skip();
                    return Ok(());
                }
                Value::Number(last) => {
                    if let Some(last) = last.as_u64() {
                        start = start.max(last as usize + 1);
                    }
                }
                Value::Array(indices) => {
                    covered.extend(
                        indices
                            .iter()
                            .filter_map(Value::as_u64)
                            .map(|index| index as usize),
                    );
                }
                _ => {}
            }
        }
        let mut unexpected = Vec::new();
        for index in start..items.len() {
            if covered.contains(&index) {
                continue;
            }
            let results = scope.apply(&self.child, None, Target::Index(index))?;
            if !evaluation.push_child(results) {
                unexpected.push(json!(index));
                if scope.short_circuit() {
                    break;
                }
            }
        }
        if unexpected.is_empty() {
            evaluation.annotate(Value::Bool(true));
        } else {
            scope.fail(
                evaluation,
                "unevaluatedItems",
                params([("unexpected", Value::Array(unexpected))]),
            );
        }
        Ok(())
    }
}
