//! Configuration for building a [`Validator`](crate::Validator).
use crate::{
    compiler::{self, ConstraintCache},
    drafts::Draft,
    error::SchemaError,
    keywords::{custom::CustomKeywordFactory, format::FormatCheck},
    messages::MessageTemplates,
    registry::{CustomDescriptor, KeywordRegistry},
    resolver::{DocumentStore, Retrieve},
    validator::Validator,
};
use ahash::AHashMap;
use serde_json::Value;
use std::{
    fmt,
    sync::{atomic::AtomicBool, Arc},
};

/// The JSON Schema output format to produce.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
    /// `{"valid": bool}` only; allows short-circuiting.
    Flag,
    /// A flat list of output units, depth-first.
    Basic,
    /// A hierarchical tree with uninteresting nodes pruned.
    Detailed,
    /// The full tree, skipped evaluations included.
    Verbose,
}

/// How keywords unknown to the active draft are treated.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CustomKeywordPolicy {
    /// Registered custom keywords are not evaluated; unknown keywords are
    /// collected as annotations.
    Ignore,
    /// Registered custom keywords are evaluated; unregistered unknown
    /// keywords are collected as annotations.
    Evaluate,
    /// Any keyword that is neither builtin nor registered fails compilation.
    Error,
}

/// Full configuration to guide schema compilation and evaluation.
#[derive(Clone)]
pub struct EvaluationOptions {
    pub(crate) draft: Option<Draft>,
    output_format: OutputFormat,
    validate_formats: Option<bool>,
    custom_keyword_policy: CustomKeywordPolicy,
    validate_schema: bool,
    resources: Vec<(String, Value)>,
    retriever: Option<Arc<dyn Retrieve>>,
    cancellation: Option<Arc<AtomicBool>>,
    max_ref_depth: usize,
    formats: AHashMap<Box<str>, Arc<FormatCheck>>,
    keywords: Vec<(Box<str>, CustomDescriptor)>,
    messages: MessageTemplates,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        EvaluationOptions {
            draft: None,
            output_format: OutputFormat::Basic,
            validate_formats: None,
            custom_keyword_policy: CustomKeywordPolicy::Evaluate,
            validate_schema: false,
            resources: Vec::new(),
            retriever: None,
            cancellation: None,
            max_ref_depth: 100,
            formats: AHashMap::new(),
            keywords: Vec::new(),
            messages: MessageTemplates::default(),
        }
    }
}

impl fmt::Debug for EvaluationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationOptions")
            .field("draft", &self.draft)
            .field("output_format", &self.output_format)
            .field("validate_formats", &self.validate_formats)
            .field("custom_keyword_policy", &self.custom_keyword_policy)
            .field("validate_schema", &self.validate_schema)
            .field("max_ref_depth", &self.max_ref_depth)
            .finish_non_exhaustive()
    }
}

impl EvaluationOptions {
    /// Force a specific draft instead of inferring it from `$schema`.
    pub fn with_draft(&mut self, draft: Draft) -> &mut Self {
        self.draft = Some(draft);
        self
    }

    /// The output format produced by
    /// [`Validator::evaluate_output`](crate::Validator::evaluate_output).
    pub fn with_output_format(&mut self, output_format: OutputFormat) -> &mut Self {
        self.output_format = output_format;
        self
    }

    /// Turn `format` into an assertion (`true`) or an annotation (`false`).
    /// Without an explicit setting, drafts 6 and 7 assert by default.
    pub fn with_format_validation(&mut self, validate: bool) -> &mut Self {
        self.validate_formats = Some(validate);
        self
    }

    /// How unknown and caller-registered keywords are processed.
    pub fn with_custom_keywords(&mut self, policy: CustomKeywordPolicy) -> &mut Self {
        self.custom_keyword_policy = policy;
        self
    }

    /// Validate the schema against its meta-schema before compiling. The
    /// meta-schema must be registered as a resource or reachable through the
    /// retriever.
    pub fn with_meta_schema_validation(&mut self, validate: bool) -> &mut Self {
        self.validate_schema = validate;
        self
    }

    /// Register a schema document under `uri` for reference resolution.
    pub fn with_resource(&mut self, uri: impl Into<String>, document: Value) -> &mut Self {
        self.resources.push((uri.into(), document));
        self
    }

    /// Use `retriever` for absolute URIs that were not registered upfront.
    pub fn with_retriever(&mut self, retriever: impl Retrieve + 'static) -> &mut Self {
        self.retriever = Some(Arc::new(retriever));
        self
    }

    /// Cancel a running evaluation when `token` becomes `true`.
    pub fn with_cancellation(&mut self, token: Arc<AtomicBool>) -> &mut Self {
        self.cancellation = Some(token);
        self
    }

    /// Bound reference expansion depth. Defaults to 100.
    pub fn with_max_ref_depth(&mut self, limit: usize) -> &mut Self {
        self.max_ref_depth = limit;
        self
    }

    /// Register a checker for the named `format`.
    pub fn with_format(
        &mut self,
        name: impl Into<String>,
        checker: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.formats
            .insert(name.into().into_boxed_str(), Arc::new(checker));
        self
    }

    /// Register a custom keyword with default priority and no dependencies.
    pub fn with_keyword(
        &mut self,
        name: impl Into<String>,
        factory: impl CustomKeywordFactory + 'static,
    ) -> &mut Self {
        self.with_keyword_at(name, 0, &[], factory)
    }

    /// Register a custom keyword with an explicit priority and
    /// sibling-annotation dependencies.
    pub fn with_keyword_at(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        dependencies: &[&str],
        factory: impl CustomKeywordFactory + 'static,
    ) -> &mut Self {
        self.keywords.push((
            name.into().into_boxed_str(),
            CustomDescriptor {
                priority,
                dependencies: dependencies.iter().map(|name| Box::from(*name)).collect(),
                factory: Arc::new(factory),
            },
        ));
        self
    }

    /// Override the message template of `keyword`. Templates substitute
    /// `[[name]]` placeholders from the error's parameter map.
    pub fn with_message(
        &mut self,
        keyword: impl Into<String>,
        template: impl Into<String>,
    ) -> &mut Self {
        self.messages.set(keyword, template);
        self
    }

    /// Build a validator for `schema` using the current options.
    pub fn build(&self, schema: &Value) -> Result<Validator, SchemaError> {
        let mut config = self.clone();
        // Draft precedence: explicit, then `$schema`, then the default
        let draft = match config.draft {
            Some(draft) => draft,
            None => Draft::detect(schema).unwrap_or_default(),
        };
        config.draft = Some(draft);

        let store = DocumentStore::new(draft, config.retriever.clone());
        for (uri, document) in &config.resources {
            store.add_document(Some(uri), document.clone())?;
        }
        let root_uri = store.add_document(None, schema.clone())?;

        let mut registry = KeywordRegistry::standard();
        for (name, descriptor) in &config.keywords {
            registry.register(name.clone(), descriptor.clone())?;
        }

        if config.validate_schema {
            validate_against_meta_schema(&config, &store, schema, draft)?;
        }

        let cache = ConstraintCache::new();
        let resolved = store.resource_root(&root_uri)?;
        let ctx = compiler::Context::new(&config, &store, &registry, &cache, &resolved);
        let root = compiler::compile(&ctx, resolved.contents())?;
        Ok(Validator {
            root,
            draft,
            config: Arc::new(config),
            store: Arc::new(store),
            registry: Arc::new(registry),
            cache: Arc::new(cache),
        })
    }

    pub(crate) fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub(crate) fn validate_formats(&self) -> Option<bool> {
        self.validate_formats
    }

    pub(crate) fn custom_keyword_policy(&self) -> CustomKeywordPolicy {
        self.custom_keyword_policy
    }

    pub(crate) fn cancellation(&self) -> Option<&Arc<AtomicBool>> {
        self.cancellation.as_ref()
    }

    pub(crate) fn max_ref_depth(&self) -> usize {
        self.max_ref_depth
    }

    pub(crate) fn format_checker(&self, name: &str) -> Option<Arc<FormatCheck>> {
        self.formats.get(name).cloned()
    }

    pub(crate) fn messages(&self) -> &MessageTemplates {
        &self.messages
    }
}

fn validate_against_meta_schema(
    options: &EvaluationOptions,
    store: &DocumentStore,
    schema: &Value,
    draft: Draft,
) -> Result<(), SchemaError> {
    let uri = schema
        .get("$schema")
        .and_then(Value::as_str)
        .unwrap_or_else(|| draft.meta_schema_url());
    let resolved = store.resolve(uri, uri)?;
    let meta_schema = resolved.contents().clone();
    let mut meta_options = options.clone();
    meta_options.validate_schema = false;
    meta_options.draft = None;
    let validator = meta_options.build(&meta_schema)?;
    if !validator.is_valid(schema) {
        return Err(SchemaError::InvalidSchema {
            location: uri.to_string(),
            detail: "the schema does not conform to its meta-schema".to_string(),
        });
    }
    Ok(())
}
