//! `$ref`, `$recursiveRef` and `$dynamicRef`.
//!
//! Static references resolve and compile eagerly in their lexical scope; a
//! reference into a compilation already in progress is stored by canonical
//! URI and resolved through the constraint cache on first evaluation, which
//! is what makes cyclic schemas terminate. Dynamic and recursive references
//! defer resolution entirely to evaluation time, where the driver's scope
//! stack is walked outermost-first.
use crate::{
    compiler::{Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) enum RefTarget {
    Compiled(Arc<SchemaConstraint>),
    /// The target was being compiled when this reference was reached.
    Lazy(Box<str>),
}

#[derive(Debug)]
pub(crate) struct Ref {
    target: RefTarget,
}

#[derive(Debug)]
pub(crate) struct RecursiveRef;

#[derive(Debug)]
pub(crate) struct DynamicRef {
    reference: Box<str>,
    /// The anchor name, when the reference uses a plain-name fragment.
    anchor: Option<Box<str>>,
}

fn reference_value<'a>(
    ctx: &Context<'_>,
    keyword: &'static str,
    value: &'a Value,
) -> Result<&'a str, SchemaError> {
    value.as_str().ok_or_else(|| {
        SchemaError::invalid_form(keyword, ctx.location(), "expected a URI reference string")
    })
}

pub(crate) fn compile_ref(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let reference = reference_value(ctx, "$ref", value)?;
    let resolved = ctx.resolve_reference(reference)?;
    let canonical = resolved.canonical();
    let target = if let Some(constraint) = ctx.cache.get(&canonical) {
        RefTarget::Compiled(constraint)
    } else if ctx.cache.is_building(&canonical) {
        RefTarget::Lazy(canonical.into_boxed_str())
    } else {
        RefTarget::Compiled(crate::compiler::compile_resolved(
            ctx.options,
            ctx.store,
            ctx.registry,
            ctx.cache,
            &resolved,
        )?)
    };
    Ok(Some(Keyword::Ref(Ref { target })))
}

pub(crate) fn compile_recursive_ref(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let reference = reference_value(ctx, "$recursiveRef", value)?;
    if reference != "#" {
        return Err(SchemaError::invalid_form(
            "$recursiveRef",
            ctx.location(),
            "the only valid value is `#`",
        ));
    }
    Ok(Some(Keyword::RecursiveRef(RecursiveRef)))
}

pub(crate) fn compile_dynamic_ref(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let reference = reference_value(ctx, "$dynamicRef", value)?;
    // Verify the static fallback target upfront
    ctx.resolve_reference(reference)?;
    let anchor = reference
        .split_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty() && !fragment.starts_with('/'))
        .map(Box::from);
    Ok(Some(Keyword::DynamicRef(DynamicRef {
        reference: Box::from(reference),
        anchor,
    })))
}

fn apply_referenced(
    scope: &mut Scope<'_, '_>,
    evaluation: &mut KeywordEvaluation,
    template: &str,
    constraint: &Arc<SchemaConstraint>,
) -> Result<(), EvaluationError> {
    let results = scope.apply_ref(constraint)?;
    if !evaluation.push_child(results) {
        scope.fail(
            evaluation,
            template,
            params([("value", scope.instance.clone())]),
        );
    }
    Ok(())
}

impl Ref {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let constraint = match &self.target {
            RefTarget::Compiled(constraint) => constraint.clone(),
            RefTarget::Lazy(canonical) => scope.resolve_lazy(canonical)?,
        };
        apply_referenced(scope, evaluation, "$ref", &constraint)
    }
}

impl RecursiveRef {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let current = scope.current_resource();
        let target = if scope.ctx.store.has_recursive_anchor(&current) {
            // The outermost dynamic scope with `$recursiveAnchor: true` wins
            scope
                .dynamic_scopes()
                .iter()
                .find(|resource| scope.ctx.store.has_recursive_anchor(resource))
                .cloned()
                .unwrap_or(current)
        } else {
            current
        };
        let resolved = scope
            .ctx
            .store
            .resource_root(&target)
            .map_err(EvaluationError::from)?;
        let constraint = scope.constraint_for(&resolved)?;
        apply_referenced(scope, evaluation, "$recursiveRef", &constraint)
    }
}

impl DynamicRef {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let base = scope.current_resource();
        let static_target = scope
            .ctx
            .store
            .resolve(&base, &self.reference)
            .map_err(EvaluationError::from)?;
        let resolved = match &self.anchor {
            // Bookending: the dynamic walk only happens when the static
            // target itself is declared with `$dynamicAnchor`
            Some(anchor)
                if scope
                    .ctx
                    .store
                    .has_dynamic_anchor(&static_target.resource, anchor) =>
            {
                let mut target = None;
                for resource in scope.dynamic_scopes() {
                    if let Some(resolved) = scope.ctx.store.dynamic_anchor(resource, anchor) {
                        target = Some(resolved);
                        break;
                    }
                }
                target.unwrap_or(static_target)
            }
            _ => static_target,
        };
        let constraint = scope.constraint_for(&resolved)?;
        apply_referenced(scope, evaluation, "$dynamicRef", &constraint)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(
        &json!({"$defs": {"n": {"type": "integer"}}, "$ref": "#/$defs/n"}),
        &json!(1)
    )]
    #[test_case(
        &json!({"$defs": {"n": {"$anchor": "num", "type": "integer"}}, "$ref": "#num"}),
        &json!(1);
        "anchor reference"
    )]
    #[test_case(
        &json!({"$ref": "#/$defs/n", "$defs": {"n": {"type": "integer"}}, "maximum": 2}),
        &json!(1);
        "adjacent keywords evaluate in 2020-12"
    )]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(
        &json!({"$defs": {"n": {"type": "integer"}}, "$ref": "#/$defs/n"}),
        &json!([1, 2])
    )]
    #[test_case(
        &json!({"$ref": "#/$defs/n", "$defs": {"n": {"type": "integer"}}, "maximum": 2}),
        &json!(3)
    )]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn recursive_schema_terminates() {
        let schema = json!({
            "properties": {
                "child": {"$ref": "#"},
                "name": {"type": "string"}
            }
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        assert!(validator.is_valid(&json!({"name": "a", "child": {"name": "b", "child": {}}})));
        assert!(!validator.is_valid(&json!({"child": {"child": {"name": 1}}})));
    }

    #[test]
    fn unresolvable_reference_fails_at_build() {
        let error =
            crate::validator_for(&json!({"$ref": "#/nope"})).expect_err("Unknown location");
        assert!(matches!(
            error,
            crate::SchemaError::InvalidReference { .. }
        ));
    }

    #[test]
    fn ref_in_draft7_ignores_siblings() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"n": {"type": "integer"}},
            "$ref": "#/definitions/n",
            "maximum": 2
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        // `maximum` sits next to `$ref` and is therefore ignored
        assert!(validator.is_valid(&json!(5)));
        assert!(!validator.is_valid(&json!("a")));
    }

    #[test]
    fn recursive_ref_without_anchor_behaves_like_ref() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "properties": {
                "child": {"$recursiveRef": "#"}
            },
            "type": "object"
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        assert!(validator.is_valid(&json!({"child": {"child": {}}})));
        assert!(!validator.is_valid(&json!({"child": 1})));
    }

    #[test]
    fn recursive_anchor_extends_to_outer_scope() {
        // The outer schema re-declares `$recursiveAnchor`, so recursion inside
        // the referenced schema lands on the outer root
        let outer = json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "$id": "https://example.com/outer",
            "$recursiveAnchor": true,
            "anyOf": [
                {"type": "string"},
                {"type": "object", "additionalProperties": {"$recursiveRef": "#"}},
                {"$ref": "https://example.com/inner"}
            ]
        });
        let inner = json!({
            "$schema": "https://json-schema.org/draft/2019-09/schema",
            "$id": "https://example.com/inner",
            "$recursiveAnchor": true,
            "type": "array",
            "items": {"$recursiveRef": "#"}
        });
        let validator = crate::options()
            .with_resource("https://example.com/inner", inner)
            .build(&outer)
            .expect("Valid schema");
        // The array items recurse to the *outer* root, so objects are allowed
        assert!(validator.is_valid(&json!([{"a": "x"}])));
        assert!(!validator.is_valid(&json!([{"a": 1}])));
    }

    #[test]
    fn dynamic_ref_follows_the_dynamic_scope() {
        // The classic 2020-12 example: a generic list whose item schema is
        // overridden by the referencing resource's `$dynamicAnchor`
        let list = json!({
            "$id": "https://example.com/list",
            "type": "array",
            "items": {"$dynamicRef": "#item"},
            "$defs": {
                "item": {"$dynamicAnchor": "item"}
            }
        });
        let numbers = json!({
            "$id": "https://example.com/numbers",
            "$ref": "https://example.com/list",
            "$defs": {
                "item": {"$dynamicAnchor": "item", "type": "number"}
            }
        });
        let validator = crate::options()
            .with_resource("https://example.com/list", list.clone())
            .build(&numbers)
            .expect("Valid schema");
        // The outermost scope declares the anchor, so items must be numbers
        // (or arrays, which the anchor target also allows)
        assert!(validator.is_valid(&json!([1, 2])));
        assert!(!validator.is_valid(&json!([1, "a"])));

        // Evaluated on its own, the list accepts any item
        let validator = crate::validator_for(&list).expect("Valid schema");
        assert!(validator.is_valid(&json!([1, "a"])));
    }

    #[test]
    fn dynamic_ref_with_pointer_fragment_is_static() {
        let schema = json!({
            "$defs": {"n": {"type": "integer"}},
            "$dynamicRef": "#/$defs/n"
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        assert!(validator.is_valid(&json!(1)));
        assert!(!validator.is_valid(&json!("a")));
    }

    #[test]
    fn malformed_reference_value() {
        tests_util::expect_schema_error(&json!({"$ref": 1}));
    }
}
