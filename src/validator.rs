//! The compiled validator: the public entry point for evaluation.
use crate::{
    compiler::{ConstraintCache, SchemaConstraint},
    drafts::Draft,
    error::EvaluationError,
    evaluation::{self, EvalContext, EvaluationResults},
    options::{EvaluationOptions, OutputFormat},
    output::Output,
    paths::JsonPointer,
    registry::KeywordRegistry,
    resolver::DocumentStore,
};
use serde_json::Value;
use std::sync::Arc;

/// A schema compiled into a constraint graph, ready to evaluate instances.
///
/// Compilation happens once; concurrent evaluations of different instances
/// share the immutable constraint cache behind a read-mostly lock.
#[derive(Debug)]
pub struct Validator {
    pub(crate) root: Arc<SchemaConstraint>,
    pub(crate) draft: Draft,
    pub(crate) config: Arc<EvaluationOptions>,
    pub(crate) store: Arc<DocumentStore>,
    pub(crate) registry: Arc<KeywordRegistry>,
    pub(crate) cache: Arc<ConstraintCache>,
}

impl Validator {
    /// Evaluate `instance` and return the full results tree.
    ///
    /// A failed validation is a `valid: false` results tree, not an `Err`;
    /// errors cover cancellation, the reference depth limit and lazily
    /// discovered malformed schema resources.
    pub fn evaluate(&self, instance: &Value) -> Result<EvaluationResults, EvaluationError> {
        self.evaluate_with(instance, false)
    }

    pub(crate) fn evaluate_with(
        &self,
        instance: &Value,
        short_circuit: bool,
    ) -> Result<EvaluationResults, EvaluationError> {
        let mut ctx = EvalContext::new(
            &self.config,
            &self.store,
            &self.registry,
            &self.cache,
            short_circuit,
        );
        evaluation::evaluate_schema(
            &mut ctx,
            &self.root,
            instance,
            JsonPointer::default(),
            JsonPointer::default(),
        )
    }

    /// Whether `instance` conforms. Short-circuits at the first failure and
    /// treats evaluation-time infrastructure errors as invalid.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.evaluate_with(instance, true)
            .map(|results| results.is_valid())
            .unwrap_or(false)
    }

    /// Apply the schema and defer the choice of output format.
    #[must_use]
    pub const fn apply<'a, 'b>(&'a self, instance: &'b Value) -> Output<'a, 'b> {
        Output::new(self, instance)
    }

    /// Produce the output format configured via
    /// [`with_output_format`](EvaluationOptions::with_output_format).
    pub fn evaluate_output(&self, instance: &Value) -> Result<Value, EvaluationError> {
        let output = self.apply(instance);
        let value = match self.config.output_format() {
            OutputFormat::Flag => serde_json::to_value(output.flag()?),
            OutputFormat::Basic => serde_json::to_value(output.basic()?),
            OutputFormat::Detailed => serde_json::to_value(output.detailed()?),
            OutputFormat::Verbose => serde_json::to_value(output.verbose()?),
        };
        value.map_err(|error| EvaluationError::Internal {
            detail: format!("output serialization failed: {error}"),
        })
    }

    /// The draft this validator was built against.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// The options this validator was built with.
    #[must_use]
    pub fn config(&self) -> Arc<EvaluationOptions> {
        Arc::clone(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    #[test]
    fn validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<super::Validator>();
    }

    #[test]
    fn evaluation_is_deterministic() {
        let schema = json!({
            "properties": {"a": {"type": "string"}},
            "additionalProperties": false,
            "title": "test"
        });
        let instance = json!({"a": 1, "b": 2});
        let validator = crate::validator_for(&schema).expect("Valid schema");
        let first = validator.evaluate(&instance).expect("No infra errors");
        let second = validator.evaluate(&instance).expect("No infra errors");
        assert_eq!(first, second);
        let first = serde_json::to_value(validator.apply(&instance).basic().unwrap()).unwrap();
        let second = serde_json::to_value(validator.apply(&instance).basic().unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cancellation_token() {
        let token = Arc::new(AtomicBool::new(false));
        let validator = crate::options()
            .with_cancellation(token.clone())
            .build(&json!({"type": "integer"}))
            .expect("Valid schema");
        assert!(validator.evaluate(&json!(1)).is_ok());
        token.store(true, Ordering::Relaxed);
        let error = validator.evaluate(&json!(1)).expect_err("Cancelled");
        assert!(matches!(error, crate::EvaluationError::Cancelled));
        // A cancelled evaluation reports invalid through the boolean API
        assert!(!validator.is_valid(&json!(1)));
    }

    #[test]
    fn recursion_limit() {
        // An infinitely recursive schema over an infinitely matching
        // instance location is cut by the visited set, but dissimilar
        // instance positions keep expanding and hit the depth limit
        let schema = json!({
            "$defs": {
                "node": {
                    "properties": {
                        "next": {"$ref": "#/$defs/node"}
                    }
                }
            },
            "$ref": "#/$defs/node"
        });
        let validator = crate::options()
            .with_max_ref_depth(3)
            .build(&schema)
            .expect("Valid schema");
        let deep = json!({"next": {"next": {"next": {"next": {"next": {}}}}}});
        let error = validator.evaluate(&deep).expect_err("Too deep");
        assert!(matches!(
            error,
            crate::EvaluationError::RecursionLimitExceeded { limit: 3, .. }
        ));
        let shallow = json!({"next": {}});
        assert!(validator.evaluate(&shallow).expect("Within limit").is_valid());
    }

    #[test]
    fn cyclic_visits_short_circuit() {
        // `allOf` with two identical `$ref`s at the same instance position:
        // the second visit is sequential, not re-entrant, and must evaluate
        let schema = json!({
            "$defs": {"n": {"type": "integer"}},
            "allOf": [{"$ref": "#/$defs/n"}, {"$ref": "#/$defs/n"}]
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        assert!(validator.is_valid(&json!(1)));
        assert!(!validator.is_valid(&json!("a")));
    }
}
