use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
};
use fraction::{BigFraction, BigUint};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct MultipleOf {
    multiple_of: f64,
    original: Value,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Number(multiple_of) = value else {
        return Err(SchemaError::invalid_form(
            "multipleOf",
            ctx.location(),
            "expected a number",
        ));
    };
    let multiple_of = multiple_of.as_f64().expect("Always valid");
    if multiple_of <= 0. {
        return Err(SchemaError::invalid_form(
            "multipleOf",
            ctx.location(),
            "expected a strictly positive number",
        ));
    }
    Ok(Some(Keyword::MultipleOf(MultipleOf {
        multiple_of,
        original: value.clone(),
    })))
}

impl MultipleOf {
    fn is_multiple(&self, item: f64) -> bool {
        if item.fract() == 0. && self.multiple_of.fract() == 0. {
            return (item % self.multiple_of) == 0.;
        }
        // `%` keeps the dividend's sign; work with the magnitude
        let quotient = (item / self.multiple_of).abs();
        let remainder = quotient % 1.;
        // The division error scales with the quotient, so the band around
        // the nearest integer must too. A genuine multiple may land just
        // below 1 instead of just above 0.
        let tolerance = 4. * f64::EPSILON * quotient.max(1.);
        if remainder > tolerance && remainder < 1. - tolerance {
            return false;
        }
        // Near-integer quotients (and NaN from overflow) are decided
        // exactly. Involves heap allocations via the underlying `BigUint`
        // type
        let fraction = BigFraction::from(item) / BigFraction::from(self.multiple_of);
        if let Some(denom) = fraction.denom() {
            return denom == &BigUint::from(1_u8);
        }
        false
    }

    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Number(item) = scope.instance {
            let item = item.as_f64().expect("Always valid");
            if !self.is_multiple(item) {
                scope.fail(
                    evaluation,
                    "multipleOf",
                    params([
                        ("value", scope.instance.clone()),
                        ("multipleOf", self.original.clone()),
                    ]),
                );
            }
        }
        Ok(())
    }
}
