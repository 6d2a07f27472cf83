//! The evaluation driver.
//!
//! The second phase of the engine: an instance is bound to a compiled
//! [`SchemaConstraint`] and driven through its keyword constraints in their
//! compiled order. Every keyword evaluation ends in exactly one terminal
//! state: valid (possibly annotated), invalid (with errors), or skipped.
//! Skipped evaluations produce no annotation and never affect the validity
//! of the containing schema.
//!
//! The driver also maintains the dynamic scope stack used by `$dynamicRef` /
//! `$recursiveRef`, the visited set that terminates cyclic references, the
//! reference depth limit, and the cancellation check between keyword
//! evaluations.
use crate::{
    compiler::{self, ConstraintCache, ConstraintNode, KeywordConstraint, SchemaConstraint},
    drafts::Draft,
    error::{ErrorEntry, EvaluationError},
    options::EvaluationOptions,
    paths::{JsonPointer, PathChunk},
    registry::KeywordRegistry,
    resolver::{DocumentStore, ResolvedSchema},
};
use ahash::AHashSet;
use serde_json::{Map, Value};
use std::sync::{atomic::Ordering, Arc};

/// Results of evaluating one schema or keyword against an instance location.
///
/// Forms a tree: a schema node nests its keyword nodes, a keyword node nests
/// the schema nodes of its sub-schema applications. Annotations survive only
/// in valid nodes, errors only in invalid ones.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResults {
    pub(crate) valid: bool,
    pub(crate) evaluation_path: JsonPointer,
    pub(crate) schema_location: Option<Arc<str>>,
    pub(crate) instance_location: JsonPointer,
    pub(crate) annotations: Vec<(Box<str>, Value)>,
    pub(crate) errors: Vec<ErrorEntry>,
    pub(crate) nested: Vec<EvaluationResults>,
    pub(crate) skipped: bool,
}

impl EvaluationResults {
    pub(crate) fn new(
        evaluation_path: JsonPointer,
        instance_location: JsonPointer,
        schema_location: Option<Arc<str>>,
    ) -> EvaluationResults {
        EvaluationResults {
            valid: true,
            evaluation_path,
            schema_location,
            instance_location,
            annotations: Vec::new(),
            errors: Vec::new(),
            nested: Vec::new(),
            skipped: false,
        }
    }

    /// Whether the instance conforms.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The dynamic path from the schema root to this evaluation.
    #[must_use]
    pub fn evaluation_path(&self) -> &JsonPointer {
        &self.evaluation_path
    }

    /// The absolute location of the schema node, if it has a real identifier.
    #[must_use]
    pub fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }

    /// The location within the validated instance.
    #[must_use]
    pub fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }

    /// Annotations produced at this node.
    pub fn annotations(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.annotations
            .iter()
            .map(|(keyword, value)| (keyword.as_ref(), value))
    }

    /// Failed assertions recorded at this node.
    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Child evaluations.
    #[must_use]
    pub fn nested(&self) -> &[EvaluationResults] {
        &self.nested
    }

    /// Whether this evaluation was skipped entirely.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }
}

/// The in-flight evaluation of one keyword constraint.
#[derive(Debug)]
pub(crate) struct KeywordEvaluation {
    pub(crate) keyword: Box<str>,
    pub(crate) results: EvaluationResults,
    pub(crate) skipped: bool,
}

impl KeywordEvaluation {
    fn new(
        keyword: Box<str>,
        evaluation_path: JsonPointer,
        instance_location: JsonPointer,
        schema_location: Option<Arc<str>>,
    ) -> KeywordEvaluation {
        KeywordEvaluation {
            keyword,
            results: EvaluationResults::new(evaluation_path, instance_location, schema_location),
            skipped: false,
        }
    }

    /// Record an annotation. Only valid evaluations may annotate.
    pub(crate) fn annotate(&mut self, value: Value) {
        debug_assert!(self.results.valid, "Annotations survive only valid evaluations");
        self.results.annotations.push((self.keyword.clone(), value));
    }

    /// Record a failed assertion with a pre-rendered message.
    pub(crate) fn fail_raw(&mut self, message: String, params: Map<String, Value>) {
        self.results.valid = false;
        self.results.annotations.clear();
        self.results.errors.push(ErrorEntry {
            keyword: self.keyword.clone(),
            message,
            params,
        });
    }

    /// Mark this evaluation as skipped; it produces nothing.
    pub(crate) fn skip(&mut self) {
        debug_assert!(self.results.annotations.is_empty() && self.results.errors.is_empty());
        self.skipped = true;
    }

    /// Attach a child schema evaluation, returning whether it was valid.
    pub(crate) fn push_child(&mut self, child: EvaluationResults) -> bool {
        let valid = child.valid;
        self.results.nested.push(child);
        valid
    }

    fn into_results(self) -> EvaluationResults {
        let mut results = self.results;
        results.skipped = self.skipped;
        results
    }
}

/// Read-only view of the already-completed sibling keyword evaluations.
pub(crate) struct Siblings<'a> {
    evaluations: &'a [KeywordEvaluation],
}

impl<'a> Siblings<'a> {
    /// The annotation a sibling keyword produced directly at this schema node.
    pub(crate) fn annotation(&self, keyword: &str) -> Option<&'a Value> {
        self.evaluations
            .iter()
            .filter(|evaluation| !evaluation.skipped && evaluation.results.valid)
            .find(|evaluation| evaluation.keyword.as_ref() == keyword)
            .and_then(|evaluation| {
                evaluation
                    .results
                    .annotations
                    .iter()
                    .find(|(name, _)| name.as_ref() == keyword)
                    .map(|(_, value)| value)
            })
    }

    /// Collect every annotation named in `keywords` produced at
    /// `instance_location` by any completed evaluation in this schema scope.
    ///
    /// The walk descends through valid result nodes only: annotations of
    /// failed sub-schemas are dropped, as are subtrees bound to other
    /// instance locations.
    pub(crate) fn gather(
        &self,
        keywords: &[&str],
        instance_location: &JsonPointer,
    ) -> Vec<&'a Value> {
        let mut collected = Vec::new();
        for evaluation in self.evaluations {
            if evaluation.skipped || !evaluation.results.valid {
                continue;
            }
            collect_annotations(&evaluation.results, keywords, instance_location, &mut collected);
        }
        collected
    }
}

fn collect_annotations<'a>(
    node: &'a EvaluationResults,
    keywords: &[&str],
    instance_location: &JsonPointer,
    collected: &mut Vec<&'a Value>,
) {
    if !node.valid || node.skipped || node.instance_location != *instance_location {
        return;
    }
    for (name, value) in &node.annotations {
        if keywords.contains(&name.as_ref()) {
            collected.push(value);
        }
    }
    for child in &node.nested {
        collect_annotations(child, keywords, instance_location, collected);
    }
}

/// Where a keyword applies a child constraint.
pub(crate) enum Target<'a> {
    /// The current instance (in-place applicators).
    Current,
    /// An object member.
    Key(&'a str),
    /// An array element.
    Index(usize),
    /// A synthetic value, e.g. a property name.
    Value(&'a Value),
}

/// Mutable evaluation state shared across one `evaluate` call.
pub(crate) struct EvalContext<'v> {
    pub(crate) options: &'v EvaluationOptions,
    pub(crate) store: &'v DocumentStore,
    pub(crate) registry: &'v KeywordRegistry,
    pub(crate) cache: &'v ConstraintCache,
    /// Dynamic scope: resources on the evaluation stack, outermost first.
    scopes: Vec<Arc<str>>,
    /// `(constraint id, instance location)` pairs currently on the stack.
    visited: AHashSet<(usize, String)>,
    ref_depth: usize,
    short_circuit: bool,
}

impl<'v> EvalContext<'v> {
    pub(crate) fn new(
        options: &'v EvaluationOptions,
        store: &'v DocumentStore,
        registry: &'v KeywordRegistry,
        cache: &'v ConstraintCache,
        short_circuit: bool,
    ) -> EvalContext<'v> {
        EvalContext {
            options,
            store,
            registry,
            cache,
            scopes: Vec::new(),
            visited: AHashSet::new(),
            ref_depth: 0,
            short_circuit,
        }
    }

    fn check_cancelled(&self) -> Result<(), EvaluationError> {
        match self.options.cancellation() {
            Some(token) if token.load(Ordering::Relaxed) => Err(EvaluationError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// The driver's interface handed to keyword evaluators.
///
/// A keyword locates the sub-instances its children apply to, asks the scope
/// to evaluate them (each application is recorded on the keyword evaluation
/// before the keyword aggregates), and reports its own outcome.
pub(crate) struct Scope<'e, 'v> {
    pub(crate) ctx: &'e mut EvalContext<'v>,
    pub(crate) instance: &'e Value,
    pub(crate) instance_location: &'e JsonPointer,
    pub(crate) keyword_path: &'e JsonPointer,
    pub(crate) draft: Draft,
}

impl<'e, 'v> Scope<'e, 'v> {
    /// Evaluate `constraint` against a sub-instance.
    ///
    /// `segment` extends the evaluation path (e.g. the index of an `allOf`
    /// branch); `target` selects the sub-instance.
    pub(crate) fn apply(
        &mut self,
        constraint: &Arc<SchemaConstraint>,
        segment: Option<PathChunk>,
        target: Target<'_>,
    ) -> Result<EvaluationResults, EvaluationError> {
        let evaluation_path = match segment {
            Some(chunk) => self.keyword_path.append(chunk),
            None => self.keyword_path.clone(),
        };
        let (instance, instance_location) = match target {
            Target::Current => (self.instance, self.instance_location.clone()),
            Target::Key(key) => {
                let child = self
                    .instance
                    .as_object()
                    .and_then(|object| object.get(key))
                    .ok_or_else(|| EvaluationError::Internal {
                        detail: format!("located property `{key}` is absent"),
                    })?;
                (child, self.instance_location.append(key.to_string()))
            }
            Target::Index(index) => {
                let child = self
                    .instance
                    .as_array()
                    .and_then(|array| array.get(index))
                    .ok_or_else(|| EvaluationError::Internal {
                        detail: format!("located index `{index}` is absent"),
                    })?;
                (child, self.instance_location.append(index))
            }
            Target::Value(value) => (value, self.instance_location.clone()),
        };
        evaluate_schema(self.ctx, constraint, instance, instance_location, evaluation_path)
    }

    /// Evaluate a referenced constraint in place, guarding the depth limit.
    pub(crate) fn apply_ref(
        &mut self,
        constraint: &Arc<SchemaConstraint>,
    ) -> Result<EvaluationResults, EvaluationError> {
        let limit = self.ctx.options.max_ref_depth();
        if self.ctx.ref_depth >= limit {
            return Err(EvaluationError::RecursionLimitExceeded {
                limit,
                location: self.instance_location.clone(),
            });
        }
        self.ctx.ref_depth += 1;
        let outcome = evaluate_schema(
            self.ctx,
            constraint,
            self.instance,
            self.instance_location.clone(),
            self.keyword_path.clone(),
        );
        self.ctx.ref_depth -= 1;
        outcome
    }

    /// Record a failed assertion rendered from the message templates.
    pub(crate) fn fail(
        &self,
        evaluation: &mut KeywordEvaluation,
        template: &str,
        params: Map<String, Value>,
    ) {
        let message = self.ctx.options.messages().render(template, &params);
        evaluation.fail_raw(message, params);
    }

    /// The resource of the schema currently being evaluated.
    pub(crate) fn current_resource(&self) -> Arc<str> {
        self.ctx
            .scopes
            .last()
            .expect("Keywords always run inside a schema scope")
            .clone()
    }

    /// Dynamic scope frames, outermost first.
    pub(crate) fn dynamic_scopes(&self) -> &[Arc<str>] {
        &self.ctx.scopes
    }

    pub(crate) fn short_circuit(&self) -> bool {
        self.ctx.short_circuit
    }

    /// The compiled constraint for a resolved schema node, compiling on first
    /// use.
    pub(crate) fn constraint_for(
        &mut self,
        resolved: &ResolvedSchema,
    ) -> Result<Arc<SchemaConstraint>, EvaluationError> {
        let canonical = resolved.canonical();
        if let Some(constraint) = self.ctx.cache.get(&canonical) {
            return Ok(constraint);
        }
        compiler::compile_resolved(
            self.ctx.options,
            self.ctx.store,
            self.ctx.registry,
            self.ctx.cache,
            resolved,
        )
        .map_err(EvaluationError::from)
    }

    /// Resolve a reference target that was in progress during compilation.
    pub(crate) fn resolve_lazy(
        &mut self,
        canonical: &str,
    ) -> Result<Arc<SchemaConstraint>, EvaluationError> {
        if let Some(constraint) = self.ctx.cache.get(canonical) {
            return Ok(constraint);
        }
        let resolved = self
            .ctx
            .store
            .resolve(canonical, canonical)
            .map_err(EvaluationError::from)?;
        self.constraint_for(&resolved)
    }
}

/// Bind `constraint` to `instance` and drive the evaluation.
pub(crate) fn evaluate_schema(
    ctx: &mut EvalContext<'_>,
    constraint: &Arc<SchemaConstraint>,
    instance: &Value,
    instance_location: JsonPointer,
    evaluation_path: JsonPointer,
) -> Result<EvaluationResults, EvaluationError> {
    ctx.check_cancelled()?;
    let mut results = EvaluationResults::new(
        evaluation_path.clone(),
        instance_location.clone(),
        constraint.absolute.clone(),
    );
    match &constraint.node {
        ConstraintNode::AlwaysValid => Ok(results),
        ConstraintNode::AlwaysInvalid => {
            results.valid = false;
            let mut params = Map::new();
            params.insert("value".to_string(), instance.clone());
            let message = ctx.options.messages().render("false", &params);
            results.errors.push(ErrorEntry {
                keyword: "false".into(),
                message,
                params,
            });
            Ok(results)
        }
        ConstraintNode::Keywords(keywords) => {
            let visit = (constraint.id, instance_location.to_string());
            if !ctx.visited.insert(visit.clone()) {
                // Re-entrant visit of the same constraint at the same
                // instance position; valid by convention
                return Ok(results);
            }
            let entered_resource = ctx.scopes.last() != Some(&constraint.resource);
            if entered_resource {
                ctx.scopes.push(constraint.resource.clone());
            }
            let outcome = drive_keywords(
                ctx,
                constraint.draft,
                keywords,
                instance,
                &instance_location,
                &evaluation_path,
                &mut results,
            );
            if entered_resource {
                ctx.scopes.pop();
            }
            ctx.visited.remove(&visit);
            outcome?;
            Ok(results)
        }
    }
}

fn drive_keywords(
    ctx: &mut EvalContext<'_>,
    draft: Draft,
    keywords: &[KeywordConstraint],
    instance: &Value,
    instance_location: &JsonPointer,
    evaluation_path: &JsonPointer,
    results: &mut EvaluationResults,
) -> Result<(), EvaluationError> {
    let mut evaluations: Vec<KeywordEvaluation> = Vec::with_capacity(keywords.len());
    let mut valid = true;
    for (position, kc) in keywords.iter().enumerate() {
        ctx.check_cancelled()?;
        // Compile-time topological order puts every dependency first
        debug_assert!(kc.dependencies.iter().all(|dependency| *dependency < position));
        let keyword_path = evaluation_path.append(PathChunk::Property(kc.name.clone()));
        let mut evaluation = KeywordEvaluation::new(
            kc.name.clone(),
            keyword_path.clone(),
            instance_location.clone(),
            kc.absolute.clone(),
        );
        let siblings = Siblings {
            evaluations: &evaluations,
        };
        let mut scope = Scope {
            ctx: &mut *ctx,
            instance,
            instance_location,
            keyword_path: &keyword_path,
            draft,
        };
        kc.keyword.evaluate(&mut scope, &mut evaluation, &siblings)?;
        if !evaluation.skipped && !evaluation.results.valid {
            valid = false;
        }
        evaluations.push(evaluation);
        if !valid && ctx.short_circuit {
            break;
        }
    }
    results.valid = valid;
    results.nested = evaluations
        .into_iter()
        .map(KeywordEvaluation::into_results)
        .collect();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results(valid: bool, location: &JsonPointer) -> EvaluationResults {
        let mut node = EvaluationResults::new(
            JsonPointer::default(),
            location.clone(),
            None,
        );
        node.valid = valid;
        node
    }

    #[test]
    fn gather_walks_only_valid_nodes() {
        let location = JsonPointer::default();
        let mut keyword_node = results(true, &location);
        keyword_node
            .annotations
            .push(("properties".into(), json!(["a"])));

        let mut failed = results(false, &location);
        failed
            .annotations
            .push(("properties".into(), json!(["b"])));

        let mut other_location = results(true, &location.append("x".to_string()));
        other_location
            .annotations
            .push(("properties".into(), json!(["c"])));

        let mut parent = results(true, &location);
        parent.nested = vec![keyword_node, failed, other_location];

        let evaluation = KeywordEvaluation {
            keyword: "allOf".into(),
            results: parent,
            skipped: false,
        };
        let evaluations = vec![evaluation];
        let siblings = Siblings {
            evaluations: &evaluations,
        };
        let gathered = siblings.gather(&["properties"], &location);
        assert_eq!(gathered, vec![&json!(["a"])]);
    }

    #[test]
    fn sibling_annotation_lookup() {
        let location = JsonPointer::default();
        let mut evaluation = KeywordEvaluation::new(
            "prefixItems".into(),
            JsonPointer::default(),
            location,
            None,
        );
        evaluation.annotate(json!(1));
        let evaluations = vec![evaluation];
        let siblings = Siblings {
            evaluations: &evaluations,
        };
        assert_eq!(siblings.annotation("prefixItems"), Some(&json!(1)));
        assert_eq!(siblings.annotation("items"), None);
    }

    #[test]
    fn skipped_siblings_are_invisible() {
        let location = JsonPointer::default();
        let mut evaluation = KeywordEvaluation::new(
            "items".into(),
            JsonPointer::default(),
            location.clone(),
            None,
        );
        evaluation.annotate(json!(true));
        evaluation.skipped = true;
        let evaluations = vec![evaluation];
        let siblings = Siblings {
            evaluations: &evaluations,
        };
        assert_eq!(siblings.annotation("items"), None);
        assert!(siblings.gather(&["items"], &location).is_empty());
    }
}
