//! Schema document store and reference resolution.
//!
//! Documents are indexed once when they are added: every `$id` subresource
//! and every anchor (`$anchor`, `$dynamicAnchor`, `$recursiveAnchor`, or the
//! `$id: "#name"` form of drafts 6/7) is recorded under its canonical URI.
//! Lookups never re-walk documents. Unknown absolute URIs are handed to the
//! caller-supplied [`Retrieve`] hook.
use crate::{drafts::Draft, error::SchemaError};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub(crate) const DEFAULT_ROOT_URL: &str = "json-schema:///";
pub(crate) const DEFAULT_SCHEME: &str = "json-schema";

/// Resolver for external schema resources.
///
/// The engine never performs I/O itself. When a reference points to a
/// document that was not registered upfront, the retriever is asked for it.
pub trait Retrieve: Send + Sync {
    /// Retrieve the document identified by `uri`.
    fn retrieve(
        &self,
        uri: &Url,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync + 'static>>;
}

/// A schema resource, i.e. a document root or an embedded `$id` boundary.
#[derive(Debug, Clone)]
struct Resource {
    document: Arc<str>,
    /// JSON Pointer from the document root to the resource root.
    pointer: String,
    draft: Draft,
    recursive_anchor: bool,
}

#[derive(Debug, Clone)]
struct Anchor {
    resource: Arc<str>,
    /// JSON Pointer from the resource root.
    pointer: String,
    dynamic: bool,
}

#[derive(Debug, Default)]
struct StoreInner {
    documents: AHashMap<Arc<str>, Arc<Value>>,
    resources: AHashMap<Arc<str>, Resource>,
    /// Keyed by `<resource-uri>#<anchor-name>`; resource URIs carry no fragment.
    anchors: AHashMap<Box<str>, Anchor>,
}

/// All documents known to one validator.
pub(crate) struct DocumentStore {
    inner: RwLock<StoreInner>,
    retriever: Option<Arc<dyn Retrieve>>,
    default_draft: Draft,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("inner", &self.inner)
            .field("default_draft", &self.default_draft)
            .finish_non_exhaustive()
    }
}

/// A schema node resolved from a reference.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSchema {
    pub(crate) document: Arc<Value>,
    /// Canonical URI of the owning resource, without fragment.
    pub(crate) resource: Arc<str>,
    /// JSON Pointer from the resource root.
    pub(crate) pointer: String,
    /// JSON Pointer from the document root.
    pub(crate) document_pointer: String,
    pub(crate) draft: Draft,
}

impl ResolvedSchema {
    pub(crate) fn contents(&self) -> &Value {
        self.document
            .pointer(&self.document_pointer)
            .expect("Verified at resolution time")
    }

    pub(crate) fn canonical(&self) -> String {
        format!("{}#{}", self.resource, self.pointer)
    }
}

impl DocumentStore {
    pub(crate) fn new(default_draft: Draft, retriever: Option<Arc<dyn Retrieve>>) -> Self {
        DocumentStore {
            inner: RwLock::new(StoreInner::default()),
            retriever,
            default_draft,
        }
    }

    /// Register `contents` under `uri` (or its own `$id`, or the default root
    /// URL) and index all resources and anchors inside. Returns the canonical
    /// document URI.
    pub(crate) fn add_document(
        &self,
        uri: Option<&str>,
        contents: Value,
    ) -> Result<Arc<str>, SchemaError> {
        let draft = Draft::detect(&contents).unwrap_or(self.default_draft);
        let registration = match uri {
            Some(uri) => {
                Url::parse(uri).map_err(|_| SchemaError::invalid_reference(uri.to_string()))?
            }
            None => Url::parse(DEFAULT_ROOT_URL).expect("Is a valid URL"),
        };
        let base = match draft.id_of(&contents) {
            Some(id) => Url::options()
                .base_url(Some(&registration))
                .parse(id)
                .map_err(|_| SchemaError::invalid_reference(id.to_string()))?,
            None => registration.clone(),
        };
        let canonical: Arc<str> = Arc::from(canonicalize(base.clone()));
        let document = Arc::new(contents);
        let mut inner = self.inner.write();
        inner.documents.insert(canonical.clone(), document.clone());
        inner.resources.insert(
            canonical.clone(),
            Resource {
                document: canonical.clone(),
                pointer: String::new(),
                draft,
                recursive_anchor: false,
            },
        );
        index(
            &mut inner,
            &document,
            &canonical,
            &base,
            canonical.clone(),
            draft,
            &mut String::new(),
            &mut String::new(),
        )?;
        // The registration URI is an alias for the document's own identifier
        let registered: Arc<str> = Arc::from(canonicalize(registration));
        if registered != canonical {
            inner.documents.insert(registered.clone(), document.clone());
            let root = inner.resources[&canonical].clone();
            inner.resources.insert(registered, root);
        }
        Ok(canonical)
    }

    /// Resolve `reference` against the resource identified by `base`.
    pub(crate) fn resolve(
        &self,
        base: &str,
        reference: &str,
    ) -> Result<ResolvedSchema, SchemaError> {
        let base_url =
            Url::parse(base).map_err(|_| SchemaError::invalid_reference(base.to_string()))?;
        let url = Url::options()
            .base_url(Some(&base_url))
            .parse(reference)
            .map_err(|_| SchemaError::invalid_reference(reference.to_string()))?;
        let fragment = percent_encoding::percent_decode_str(url.fragment().unwrap_or(""))
            .decode_utf8()
            .map_err(|_| SchemaError::invalid_reference(reference.to_string()))?
            .into_owned();
        let mut resource_url = url;
        resource_url.set_fragment(None);
        let resource_uri = canonicalize(resource_url.clone());

        if !self
            .inner
            .read()
            .resources
            .contains_key(resource_uri.as_str())
        {
            self.retrieve(&resource_url, &resource_uri)?;
        }

        let inner = self.inner.read();
        if fragment.is_empty() || fragment.starts_with('/') {
            return resolved(&inner, &resource_uri, fragment, reference);
        }
        // Location-independent anchor
        let anchor = inner
            .anchors
            .get(format!("{resource_uri}#{fragment}").as_str())
            .ok_or_else(|| SchemaError::invalid_reference(reference.to_string()))?
            .clone();
        resolved(&inner, &anchor.resource, anchor.pointer, reference)
    }

    fn retrieve(&self, url: &Url, uri: &str) -> Result<(), SchemaError> {
        if url.scheme() == DEFAULT_SCHEME {
            return Err(SchemaError::not_found(uri.to_string()));
        }
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| SchemaError::not_found(uri.to_string()))?;
        let contents = retriever
            .retrieve(url)
            .map_err(|_| SchemaError::not_found(uri.to_string()))?;
        self.add_document(Some(uri), contents)?;
        Ok(())
    }

    /// The root of the resource identified by `uri`.
    pub(crate) fn resource_root(&self, uri: &str) -> Result<ResolvedSchema, SchemaError> {
        self.resolve(uri, uri)
    }

    /// Whether the resource root declares `$recursiveAnchor: true`.
    pub(crate) fn has_recursive_anchor(&self, resource: &str) -> bool {
        self.inner
            .read()
            .resources
            .get(resource)
            .map_or(false, |resource| resource.recursive_anchor)
    }

    /// Whether `name` is declared with `$dynamicAnchor` in `resource`.
    pub(crate) fn has_dynamic_anchor(&self, resource: &str, name: &str) -> bool {
        self.inner
            .read()
            .anchors
            .get(format!("{resource}#{name}").as_str())
            .map_or(false, |anchor| anchor.dynamic)
    }

    /// Resolve `name` as a `$dynamicAnchor` within `resource`.
    pub(crate) fn dynamic_anchor(&self, resource: &str, name: &str) -> Option<ResolvedSchema> {
        if !self.has_dynamic_anchor(resource, name) {
            return None;
        }
        self.resolve(resource, &format!("#{name}")).ok()
    }
}

fn resolved(
    inner: &StoreInner,
    resource_uri: &str,
    pointer: String,
    reference: &str,
) -> Result<ResolvedSchema, SchemaError> {
    let (resource_key, resource) = inner
        .resources
        .get_key_value(resource_uri)
        .ok_or_else(|| SchemaError::not_found(resource_uri.to_string()))?;
    let document = inner
        .documents
        .get(resource.document.as_ref())
        .expect("Resources always point into known documents")
        .clone();
    let document_pointer = format!("{}{}", resource.pointer, pointer);
    if document.pointer(&document_pointer).is_none() {
        return Err(SchemaError::invalid_reference(reference.to_string()));
    }
    Ok(ResolvedSchema {
        document,
        resource: resource_key.clone(),
        pointer,
        document_pointer,
        draft: resource.draft,
    })
}

/// Strip empty fragments; they are not distinguishable from absent ones.
fn canonicalize(mut url: Url) -> String {
    if url.fragment() == Some("") {
        url.set_fragment(None);
    }
    url.to_string()
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Walk a document and record every resource and anchor in it.
#[allow(clippy::too_many_arguments)]
fn index(
    inner: &mut StoreInner,
    document: &Arc<Value>,
    document_uri: &Arc<str>,
    base: &Url,
    resource: Arc<str>,
    draft: Draft,
    document_pointer: &mut String,
    resource_pointer: &mut String,
) -> Result<(), SchemaError> {
    let value = document.pointer(document_pointer).expect("Walked path");
    match value {
        Value::Object(object) => {
            let mut resource = resource;
            let mut base = base.clone();
            let mut draft = draft;
            let mut fresh_resource_pointer = String::new();
            let mut resource_pointer = resource_pointer;
            if !document_pointer.is_empty() {
                // `$schema` is honored where a subschema starts a new resource
                if let Some(detected) = Draft::detect(value) {
                    if detected.id_of(value).is_some() {
                        draft = detected;
                    }
                }
                if let Some(id) = draft.id_of(value) {
                    let url = Url::options()
                        .base_url(Some(&base))
                        .parse(id)
                        .map_err(|_| SchemaError::invalid_reference(id.to_string()))?;
                    let uri: Arc<str> = Arc::from(canonicalize(url.clone()));
                    inner.resources.insert(
                        uri.clone(),
                        Resource {
                            document: document_uri.clone(),
                            pointer: document_pointer.clone(),
                            draft,
                            recursive_anchor: false,
                        },
                    );
                    base = url;
                    resource = uri;
                    resource_pointer = &mut fresh_resource_pointer;
                }
            }

            if let Some(name) = draft.anchor_of(value) {
                inner.anchors.insert(
                    format!("{resource}#{name}").into_boxed_str(),
                    Anchor {
                        resource: resource.clone(),
                        pointer: resource_pointer.clone(),
                        dynamic: false,
                    },
                );
            }
            if matches!(draft, Draft::Draft202012 | Draft::DraftNext) {
                if let Some(name) = object.get("$dynamicAnchor").and_then(Value::as_str) {
                    inner.anchors.insert(
                        format!("{resource}#{name}").into_boxed_str(),
                        Anchor {
                            resource: resource.clone(),
                            pointer: resource_pointer.clone(),
                            dynamic: true,
                        },
                    );
                }
            }
            if draft == Draft::Draft201909
                && resource_pointer.is_empty()
                && object.get("$recursiveAnchor") == Some(&Value::Bool(true))
            {
                if let Some(entry) = inner.resources.get_mut(resource.as_ref()) {
                    entry.recursive_anchor = true;
                }
            }

            for key in object.keys() {
                if key == "enum" || key == "const" {
                    continue;
                }
                let escaped = escape_segment(key);
                let document_len = document_pointer.len();
                let resource_len = resource_pointer.len();
                document_pointer.push('/');
                document_pointer.push_str(&escaped);
                resource_pointer.push('/');
                resource_pointer.push_str(&escaped);
                index(
                    inner,
                    document,
                    document_uri,
                    &base,
                    resource.clone(),
                    draft,
                    document_pointer,
                    resource_pointer,
                )?;
                document_pointer.truncate(document_len);
                resource_pointer.truncate(resource_len);
            }
            Ok(())
        }
        Value::Array(items) => {
            for idx in 0..items.len() {
                let segment = itoa::Buffer::new().format(idx).to_string();
                let document_len = document_pointer.len();
                let resource_len = resource_pointer.len();
                document_pointer.push('/');
                document_pointer.push_str(&segment);
                resource_pointer.push('/');
                resource_pointer.push_str(&segment);
                index(
                    inner,
                    document,
                    document_uri,
                    base,
                    resource.clone(),
                    draft,
                    document_pointer,
                    resource_pointer,
                )?;
                document_pointer.truncate(document_len);
                resource_pointer.truncate(resource_len);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
