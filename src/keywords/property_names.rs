use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct PropertyNames {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::PropertyNames(PropertyNames {
        child: compiler::compile(&ctx.push("propertyNames"), value)?,
    })))
}

impl PropertyNames {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let Value::Object(object) = scope.instance else {
            return Ok(());
        };
        for key in object.keys() {
            // Each key is validated as a string instance of its own
            let name = Value::String(key.clone());
            let results = scope.apply(&self.child, None, Target::Value(&name))?;
            if !evaluation.push_child(results) {
                scope.fail(
                    evaluation,
                    "propertyNames",
                    params([("property", name.clone())]),
                );
                if scope.short_circuit() {
                    break;
                }
            }
        }
        Ok(())
    }
}
