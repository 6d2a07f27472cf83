//! Constraint compilation.
//!
//! The first phase of the engine: a schema tree is turned into an immutable
//! graph of [`SchemaConstraint`]s. Each object schema becomes an ordered list
//! of [`KeywordConstraint`]s (topological by sibling-annotation dependencies,
//! then priority, then source order); boolean schemas become unconditional
//! nodes. Compiled constraints are memoized by canonical URI so cyclic
//! references terminate: a reference into an in-progress compilation is
//! recorded as a lazy target and resolved through the cache on first
//! evaluation.
use crate::{
    drafts::{Draft, VocabularySet},
    error::SchemaError,
    keywords::{annotation::Annotation, custom::CustomConstraint, ref_, Keyword},
    options::{CustomKeywordPolicy, EvaluationOptions},
    registry::KeywordRegistry,
    resolver::{DocumentStore, ResolvedSchema, DEFAULT_SCHEME},
};
use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A compiled schema node.
#[derive(Debug)]
pub(crate) struct SchemaConstraint {
    /// Key of the evaluation visited-set; unique per cache.
    pub(crate) id: usize,
    /// Canonical URI of the owning schema resource.
    pub(crate) resource: Arc<str>,
    /// Absolute location for output; absent for the anonymous root scheme.
    pub(crate) absolute: Option<Arc<str>>,
    pub(crate) draft: Draft,
    pub(crate) node: ConstraintNode,
}

#[derive(Debug)]
pub(crate) enum ConstraintNode {
    /// The `true` schema.
    AlwaysValid,
    /// The `false` schema.
    AlwaysInvalid,
    Keywords(Vec<KeywordConstraint>),
}

/// One keyword within a [`SchemaConstraint`], in evaluation order.
#[derive(Debug)]
pub(crate) struct KeywordConstraint {
    pub(crate) name: Box<str>,
    pub(crate) keyword: Keyword,
    /// Positions of sibling dependencies earlier in the list.
    pub(crate) dependencies: Vec<usize>,
    pub(crate) absolute: Option<Arc<str>>,
}

/// Memoized compilation results, shared by compile time and evaluation time.
///
/// Reads dominate: writes happen only while a not-yet-seen sub-schema is
/// compiled, with double-checked insertion.
#[derive(Debug, Default)]
pub(crate) struct ConstraintCache {
    entries: RwLock<AHashMap<Box<str>, Arc<SchemaConstraint>>>,
    /// Canonical URIs whose compilation is in progress.
    building: Mutex<AHashSet<Box<str>>>,
    next_id: AtomicUsize,
}

impl ConstraintCache {
    pub(crate) fn new() -> ConstraintCache {
        ConstraintCache::default()
    }

    pub(crate) fn get(&self, canonical: &str) -> Option<Arc<SchemaConstraint>> {
        self.entries.read().get(canonical).cloned()
    }

    pub(crate) fn is_building(&self, canonical: &str) -> bool {
        self.building.lock().contains(canonical)
    }

    fn begin(&self, canonical: &str) {
        self.building.lock().insert(canonical.into());
    }

    fn abandon(&self, canonical: &str) {
        self.building.lock().remove(canonical);
    }

    fn finish(&self, canonical: &str, constraint: Arc<SchemaConstraint>) -> Arc<SchemaConstraint> {
        let mut entries = self.entries.write();
        // Double-checked: a concurrent evaluation may have won the race
        let constraint = entries
            .entry(canonical.into())
            .or_insert(constraint)
            .clone();
        drop(entries);
        self.building.lock().remove(canonical);
        constraint
    }

    fn alias(&self, canonical: &str, constraint: Arc<SchemaConstraint>) {
        self.entries.write().entry(canonical.into()).or_insert(constraint);
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Container for information required to compile one schema node.
///
/// Tracks the lexical pointer within the current resource and the resource's
/// base URI; the evaluation path is a run-time notion and is not part of it.
#[derive(Debug, Clone)]
pub(crate) struct Context<'a> {
    pub(crate) options: &'a EvaluationOptions,
    pub(crate) store: &'a DocumentStore,
    pub(crate) registry: &'a KeywordRegistry,
    pub(crate) cache: &'a ConstraintCache,
    pub(crate) draft: Draft,
    resource: Arc<str>,
    pointer: String,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        options: &'a EvaluationOptions,
        store: &'a DocumentStore,
        registry: &'a KeywordRegistry,
        cache: &'a ConstraintCache,
        resolved: &ResolvedSchema,
    ) -> Context<'a> {
        Context {
            options,
            store,
            registry,
            cache,
            draft: resolved.draft,
            resource: resolved.resource.clone(),
            pointer: resolved.pointer.clone(),
        }
    }

    /// A context one schema segment deeper.
    pub(crate) fn push(&self, segment: &str) -> Context<'a> {
        let mut pointer = self.pointer.clone();
        pointer.push('/');
        for ch in segment.chars() {
            match ch {
                '~' => pointer.push_str("~0"),
                '/' => pointer.push_str("~1"),
                _ => pointer.push(ch),
            }
        }
        Context {
            pointer,
            resource: self.resource.clone(),
            ..*self
        }
    }

    pub(crate) fn push_index(&self, index: usize) -> Context<'a> {
        let mut pointer = self.pointer.clone();
        pointer.push('/');
        pointer.push_str(itoa::Buffer::new().format(index));
        Context {
            pointer,
            resource: self.resource.clone(),
            ..*self
        }
    }

    pub(crate) fn canonical(&self) -> String {
        format!("{}#{}", self.resource, self.pointer)
    }

    /// Canonical location for error reporting.
    pub(crate) fn location(&self) -> String {
        self.canonical()
    }

    pub(crate) fn resolve_reference(&self, reference: &str) -> Result<ResolvedSchema, SchemaError> {
        self.store.resolve(&self.resource, reference)
    }
}

/// Compile an externally resolved schema node; used for reference targets and
/// evaluation-time (lazy and dynamic) compilation.
pub(crate) fn compile_resolved(
    options: &EvaluationOptions,
    store: &DocumentStore,
    registry: &KeywordRegistry,
    cache: &ConstraintCache,
    resolved: &ResolvedSchema,
) -> Result<Arc<SchemaConstraint>, SchemaError> {
    let ctx = Context::new(options, store, registry, cache, resolved);
    compile(&ctx, resolved.contents())
}

/// Compile a schema node into a constraint, memoized by canonical URI.
pub(crate) fn compile(
    ctx: &Context<'_>,
    schema: &Value,
) -> Result<Arc<SchemaConstraint>, SchemaError> {
    let canonical = ctx.canonical();
    if let Some(existing) = ctx.cache.get(&canonical) {
        return Ok(existing);
    }
    // An embedded `$id` re-roots compilation at its own resource
    if let Value::Object(_) = schema {
        if !ctx.pointer.is_empty() {
            let mut draft = ctx.draft;
            if let Some(detected) = Draft::detect(schema) {
                if detected.id_of(schema).is_some() {
                    draft = detected;
                }
            }
            if let Some(id) = draft.id_of(schema) {
                let resolved = ctx.resolve_reference(id)?;
                let inner = Context {
                    draft: resolved.draft,
                    resource: resolved.resource.clone(),
                    pointer: String::new(),
                    ..*ctx
                };
                let constraint = compile(&inner, schema)?;
                ctx.cache.alias(&canonical, constraint.clone());
                return Ok(constraint);
            }
        }
    }

    ctx.cache.begin(&canonical);
    let node = match build_node(ctx, schema) {
        Ok(node) => node,
        Err(error) => {
            ctx.cache.abandon(&canonical);
            return Err(error);
        }
    };
    let absolute = if ctx.resource.starts_with(DEFAULT_SCHEME) {
        None
    } else {
        Some(Arc::from(canonical.as_str()))
    };
    let constraint = Arc::new(SchemaConstraint {
        id: ctx.cache.next_id(),
        resource: ctx.resource.clone(),
        absolute,
        draft: ctx.draft,
        node,
    });
    Ok(ctx.cache.finish(&canonical, constraint))
}

fn build_node(ctx: &Context<'_>, schema: &Value) -> Result<ConstraintNode, SchemaError> {
    match schema {
        Value::Bool(true) => Ok(ConstraintNode::AlwaysValid),
        Value::Bool(false) => Ok(ConstraintNode::AlwaysInvalid),
        Value::Object(object) => Ok(ConstraintNode::Keywords(compile_keywords(ctx, object)?)),
        _ => Err(SchemaError::InvalidSchema {
            location: ctx.location(),
            detail: "a schema must be a boolean or an object".to_string(),
        }),
    }
}

fn compile_keywords(
    ctx: &Context<'_>,
    object: &Map<String, Value>,
) -> Result<Vec<KeywordConstraint>, SchemaError> {
    let mut collected: Vec<(String, Keyword)> = Vec::with_capacity(object.len());

    // Older drafts ignore all keywords adjacent to `$ref`; they are kept as
    // bare annotations
    if !ctx.draft.supports_adjacent_validation() {
        if let Some(reference) = object.get("$ref") {
            let keyword = ref_::compile_ref(ctx, object, reference)?
                .expect("`$ref` compilation always produces a keyword");
            collected.push(("$ref".to_string(), keyword));
            for (key, value) in object {
                if key != "$ref" {
                    collected.push((key.clone(), Keyword::Annotation(Annotation::new(value.clone()))));
                }
            }
            return into_constraints(ctx, collected);
        }
    }

    let vocabularies = VocabularySet::standard();
    for (key, value) in object {
        let custom = match ctx.options.custom_keyword_policy() {
            CustomKeywordPolicy::Ignore => None,
            _ => ctx.registry.custom(key),
        };
        if let Some(descriptor) = custom {
            let inner = descriptor
                .factory
                .init(object, value)
                .map_err(|detail| SchemaError::InvalidSchema {
                    location: ctx.location(),
                    detail,
                })?;
            collected.push((key.clone(), Keyword::Custom(CustomConstraint::new(inner))));
            continue;
        }
        let descriptor = ctx
            .registry
            .lookup(key)
            .filter(|descriptor| descriptor.drafts.contains(ctx.draft))
            .filter(|descriptor| vocabularies.contains(descriptor.vocabulary));
        if let Some(descriptor) = descriptor {
            if let Some(keyword) = (descriptor.compile)(ctx, object, value)? {
                collected.push((key.clone(), keyword));
            }
            continue;
        }
        if is_structural(ctx.draft, key) {
            continue;
        }
        if ctx.options.custom_keyword_policy() == CustomKeywordPolicy::Error {
            return Err(SchemaError::UnknownKeyword {
                keyword: key.clone(),
                location: ctx.location(),
            });
        }
        // Unknown keywords surface as annotations carrying their raw value
        collected.push((key.clone(), Keyword::Annotation(Annotation::new(value.clone()))));
    }
    into_constraints(ctx, collected)
}

fn into_constraints(
    ctx: &Context<'_>,
    collected: Vec<(String, Keyword)>,
) -> Result<Vec<KeywordConstraint>, SchemaError> {
    let names: Vec<&str> = collected.iter().map(|(name, _)| name.as_str()).collect();
    let order = ctx.registry.ordered(&names)?;
    let mut slots: Vec<Option<(String, Keyword)>> = collected.into_iter().map(Some).collect();
    let mut constraints = Vec::with_capacity(slots.len());
    for entry in order {
        let (name, keyword) = slots[entry.source].take().expect("Each slot is used once");
        let absolute = match &*keyword_absolute(ctx, &name) {
            location if location.starts_with(DEFAULT_SCHEME) => None,
            location => Some(Arc::from(location)),
        };
        constraints.push(KeywordConstraint {
            name: name.into_boxed_str(),
            keyword,
            dependencies: entry.dependencies,
            absolute,
        });
    }
    Ok(constraints)
}

fn keyword_absolute(ctx: &Context<'_>, name: &str) -> String {
    ctx.push(name).canonical()
}

/// Keywords that shape identification and reuse but produce no constraint.
fn is_structural(draft: Draft, keyword: &str) -> bool {
    match keyword {
        "$id" | "$schema" | "$comment" => true,
        "definitions" => matches!(draft, Draft::Draft6 | Draft::Draft7),
        "$defs" | "$anchor" | "$vocabulary" | "$recursiveAnchor" => {
            !matches!(draft, Draft::Draft6 | Draft::Draft7)
        }
        "$dynamicAnchor" => matches!(draft, Draft::Draft202012 | Draft::DraftNext),
        _ => false,
    }
}
