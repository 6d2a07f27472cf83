//! The plugin surface for caller-defined keywords.
use crate::{
    error::EvaluationError,
    evaluation::{KeywordEvaluation, Scope},
};
use serde_json::{Map, Value};
use std::fmt;

/// A compiled caller-defined keyword.
///
/// Returned by a [`CustomKeywordFactory`] during constraint compilation, then
/// invoked by the driver like any builtin keyword.
pub trait CustomKeyword: Send + Sync {
    /// Evaluate `instance`.
    ///
    /// `Ok(Some(value))` records `value` as the keyword's annotation,
    /// `Ok(None)` passes silently, and `Err(message)` fails the assertion
    /// with `message`.
    fn evaluate(&self, instance: &Value) -> Result<Option<Value>, String>;
}

/// Builds a [`CustomKeyword`] from its value within a schema object.
pub trait CustomKeywordFactory: Send + Sync {
    /// Compile the keyword. `parent` is the full schema object, `value` the
    /// keyword's own value. An `Err` fails schema compilation.
    fn init(
        &self,
        parent: &Map<String, Value>,
        value: &Value,
    ) -> Result<Box<dyn CustomKeyword>, String>;
}

impl<F> CustomKeywordFactory for F
where
    F: Fn(&Map<String, Value>, &Value) -> Result<Box<dyn CustomKeyword>, String> + Send + Sync,
{
    fn init(
        &self,
        parent: &Map<String, Value>,
        value: &Value,
    ) -> Result<Box<dyn CustomKeyword>, String> {
        self(parent, value)
    }
}

pub(crate) struct CustomConstraint {
    inner: Box<dyn CustomKeyword>,
}

impl fmt::Debug for CustomConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomConstraint").finish_non_exhaustive()
    }
}

impl CustomConstraint {
    pub(crate) fn new(inner: Box<dyn CustomKeyword>) -> CustomConstraint {
        CustomConstraint { inner }
    }

    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        match self.inner.evaluate(scope.instance) {
            Ok(Some(annotation)) => evaluation.annotate(annotation),
            Ok(None) => {}
            Err(message) => evaluation.fail_raw(message, Map::new()),
        }
        Ok(())
    }
}
