use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct Type {
    types: PrimitiveTypesBitMap,
    /// The keyword value as written, for error parameters.
    expected: Value,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let mut types = PrimitiveTypesBitMap::new();
    match value {
        Value::String(name) => {
            types |= parse_type(ctx, name)?;
        }
        Value::Array(names) => {
            for name in names {
                let Value::String(name) = name else {
                    return Err(SchemaError::invalid_form(
                        "type",
                        ctx.location(),
                        "type names must be strings",
                    ));
                };
                types |= parse_type(ctx, name)?;
            }
        }
        _ => {
            return Err(SchemaError::invalid_form(
                "type",
                ctx.location(),
                "expected a string or an array of strings",
            ))
        }
    }
    Ok(Some(Keyword::Type(Type {
        types,
        expected: value.clone(),
    })))
}

fn parse_type(ctx: &Context<'_>, name: &str) -> Result<PrimitiveType, SchemaError> {
    PrimitiveType::try_from(name).map_err(|()| {
        SchemaError::invalid_form("type", ctx.location(), format!("unknown type `{name}`"))
    })
}

impl Type {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if !self.types.is_valid(scope.instance) {
            scope.fail(
                evaluation,
                "type",
                params([
                    (
                        "received",
                        Value::String(PrimitiveType::of(scope.instance).to_string()),
                    ),
                    ("expected", self.expected.clone()),
                ]),
            );
        }
        Ok(())
    }
}
