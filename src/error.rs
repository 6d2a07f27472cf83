//! Error types.
//!
//! Failed assertions are not errors in the Rust sense: they are data in the
//! results tree (see [`ErrorEntry`]). The enums here cover malformed schemas
//! and unexpected runtime conditions only.
use crate::paths::JsonPointer;
use serde_json::{Map, Value};
use thiserror::Error;

/// An error raised while turning a schema into constraints.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A keyword is not known to the active draft and strict mode is enabled.
    #[error("unknown keyword `{keyword}` at `{location}`")]
    UnknownKeyword {
        /// The offending keyword name.
        keyword: String,
        /// Canonical location of the schema object.
        location: String,
    },
    /// A keyword value has a shape that is invalid in the active draft.
    #[error("invalid form for `{keyword}` at `{location}`: {detail}")]
    InvalidKeywordForm {
        /// The offending keyword name.
        keyword: &'static str,
        /// Canonical location of the schema object.
        location: String,
        /// Human-readable explanation.
        detail: String,
    },
    /// A regular expression cannot be compiled.
    #[error("invalid pattern `{pattern}` at `{location}`")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Canonical location of the schema object.
        location: String,
    },
    /// A reference is not a valid URI reference.
    #[error("invalid reference `{reference}`")]
    InvalidReference {
        /// The reference as written in the schema.
        reference: String,
    },
    /// Registered keyword descriptors declare a dependency cycle.
    #[error("keyword dependency cycle: {}", chain.join(" -> "))]
    RegistryCycle {
        /// The keywords forming the cycle.
        chain: Vec<String>,
    },
    /// A referenced schema resource is not registered and cannot be retrieved.
    #[error("schema resource `{uri}` is not available")]
    SchemaNotFound {
        /// The absolute URI of the missing resource.
        uri: String,
    },
    /// A schema value is neither a boolean nor an object, or fails its meta-schema.
    #[error("`{location}` is not a valid schema: {detail}")]
    InvalidSchema {
        /// Canonical location of the schema value.
        location: String,
        /// Human-readable explanation.
        detail: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid_form(
        keyword: &'static str,
        location: impl Into<String>,
        detail: impl Into<String>,
    ) -> SchemaError {
        SchemaError::InvalidKeywordForm {
            keyword,
            location: location.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_reference(reference: impl Into<String>) -> SchemaError {
        SchemaError::InvalidReference {
            reference: reference.into(),
        }
    }

    pub(crate) fn not_found(uri: impl Into<String>) -> SchemaError {
        SchemaError::SchemaNotFound { uri: uri.into() }
    }
}

/// An error raised while driving an evaluation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A lazily compiled schema resource turned out to be malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A `$ref` chain went deeper than the configured limit.
    #[error("reference recursion limit of {limit} exceeded at `{location}`")]
    RecursionLimitExceeded {
        /// The configured limit.
        limit: usize,
        /// Instance location at which the limit was hit.
        location: JsonPointer,
    },
    /// The cancellation token was triggered.
    #[error("evaluation was cancelled")]
    Cancelled,
    /// A bug: an internal invariant did not hold.
    #[error("internal invariant violated: {detail}")]
    Internal {
        /// What went wrong.
        detail: String,
    },
}

/// A single failed assertion, recorded in the results tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    /// The keyword that failed.
    pub keyword: Box<str>,
    /// Rendered, human-readable message.
    pub message: String,
    /// The parameters the message was rendered from.
    pub params: Map<String, Value>,
}
