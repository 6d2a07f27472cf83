use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct Not {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::Not(Not {
        child: compiler::compile(&ctx.push("not"), value)?,
    })))
}

impl Not {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let results = scope.apply(&self.child, None, Target::Current)?;
        if evaluation.push_child(results) {
            scope.fail(
                evaluation,
                "not",
                params([("value", scope.instance.clone())]),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"not": {"type": "integer"}}), &json!("a"))]
    #[test_case(&json!({"not": false}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"not": {"type": "integer"}}), &json!(1))]
    #[test_case(&json!({"not": true}), &json!(null))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }
}
