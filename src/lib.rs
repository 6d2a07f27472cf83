//! # jsonschema-eval
//!
//! A two-phase JSON Schema evaluation engine with full annotation support.
//!
//! Schemas are compiled once into a dependency graph of keyword constraints
//! (ordered by sibling-annotation dependencies, priority, then source order);
//! a driver then walks that graph against an instance, collecting annotations
//! and errors into a results tree that renders into the standard JSON Schema
//! output formats.
//!
//! Supports drafts 6, 7, 2019-09, 2020-12 and the in-progress next draft,
//! including `$dynamicRef` / `$recursiveRef` and the `unevaluated*` keywords.
//!
//! ## Usage
//!
//! One-off validation:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"maxLength": 5});
//! let instance = json!("foo");
//! assert!(jsonschema_eval::is_valid(&schema, &instance));
//! ```
//!
//! Reusable validators with structured results:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({
//!     "properties": {"name": {"type": "string"}},
//!     "additionalProperties": false
//! });
//! let validator = jsonschema_eval::validator_for(&schema).expect("Invalid schema");
//!
//! let results = validator.evaluate(&json!({"name": 1})).expect("Evaluation ran");
//! assert!(!results.is_valid());
//!
//! let output = validator.apply(&json!({"name": "x"})).basic().expect("Evaluation ran");
//! assert!(output.is_valid());
//! ```
//!
//! Custom configuration:
//!
//! ```rust
//! use jsonschema_eval::Draft;
//! use serde_json::json;
//!
//! let schema = json!({"maxLength": 5});
//! let validator = jsonschema_eval::options()
//!     .with_draft(Draft::Draft7)
//!     .build(&schema)
//!     .expect("Invalid schema");
//! assert!(validator.is_valid(&json!("foo")));
//! ```
#![warn(
    clippy::cast_possible_truncation,
    clippy::doc_markdown,
    clippy::explicit_iter_loop,
    clippy::map_unwrap_or,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::needless_pass_by_value,
    clippy::print_stdout,
    clippy::redundant_closure,
    clippy::trivially_copy_pass_by_ref,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unreachable_pub,
    variant_size_differences
)]
#![allow(clippy::unnecessary_wraps, clippy::upper_case_acronyms)]
mod compiler;
mod drafts;
mod ecma;
pub mod error;
mod evaluation;
mod keywords;
mod messages;
mod options;
pub mod output;
pub mod paths;
pub mod primitive_type;
mod registry;
mod resolver;
mod validator;

pub use drafts::{Draft, Vocabulary};
pub use error::{ErrorEntry, EvaluationError, SchemaError};
pub use evaluation::EvaluationResults;
pub use keywords::custom::{CustomKeyword, CustomKeywordFactory};
pub use messages::MessageTemplates;
pub use options::{CustomKeywordPolicy, EvaluationOptions, OutputFormat};
pub use resolver::Retrieve;
pub use validator::Validator;

use serde_json::Value;

/// Create a default [`EvaluationOptions`] to configure a [`Validator`].
#[must_use]
pub fn options() -> EvaluationOptions {
    EvaluationOptions::default()
}

/// Build a validator for `schema` using default options. The draft is
/// detected from `$schema`.
pub fn validator_for(schema: &Value) -> Result<Validator, SchemaError> {
    options().build(schema)
}

/// A shortcut for validating `instance` against `schema`.
///
/// ```rust
/// use serde_json::json;
///
/// assert!(jsonschema_eval::is_valid(&json!({"maxLength": 5}), &json!("foo")));
/// ```
///
/// This function panics if the schema is invalid.
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    let validator = validator_for(schema).expect("Invalid schema");
    validator.is_valid(instance)
}

#[cfg(test)]
pub(crate) mod tests_util {
    use crate::{error::ErrorEntry, EvaluationResults};
    use serde_json::Value;

    pub(crate) fn evaluate(schema: &Value, instance: &Value) -> EvaluationResults {
        let validator = crate::validator_for(schema).expect("Invalid schema");
        validator.evaluate(instance).expect("Evaluation ran")
    }

    pub(crate) fn is_valid(schema: &Value, instance: &Value) {
        let validator = crate::validator_for(schema).expect("Invalid schema");
        assert!(
            validator.is_valid(instance),
            "{instance} should be valid (via is_valid)"
        );
        assert!(
            validator.evaluate(instance).expect("Evaluation ran").is_valid(),
            "{instance} should be valid (via evaluate)"
        );
        assert!(
            validator.apply(instance).flag().expect("Evaluation ran").valid,
            "{instance} should be valid (via apply)"
        );
    }

    pub(crate) fn is_not_valid(schema: &Value, instance: &Value) {
        let validator = crate::validator_for(schema).expect("Invalid schema");
        assert!(
            !validator.is_valid(instance),
            "{instance} should not be valid (via is_valid)"
        );
        assert!(
            !validator.evaluate(instance).expect("Evaluation ran").is_valid(),
            "{instance} should not be valid (via evaluate)"
        );
        assert!(
            !validator.apply(instance).basic().expect("Evaluation ran").is_valid(),
            "{instance} should not be valid (via apply)"
        );
    }

    fn collect_annotations<'a>(
        node: &'a EvaluationResults,
        collected: &mut Vec<(&'a str, &'a Value)>,
    ) {
        if !node.is_valid() || node.is_skipped() {
            return;
        }
        collected.extend(node.annotations());
        for child in node.nested() {
            collect_annotations(child, collected);
        }
    }

    /// All annotations of valid nodes, depth-first.
    pub(crate) fn all_annotations(results: &EvaluationResults) -> Vec<(&str, &Value)> {
        let mut collected = Vec::new();
        collect_annotations(results, &mut collected);
        collected
    }

    fn collect_errors<'a>(node: &'a EvaluationResults, collected: &mut Vec<&'a ErrorEntry>) {
        collected.extend(node.errors());
        for child in node.nested() {
            collect_errors(child, collected);
        }
    }

    /// All error entries in the tree, depth-first.
    pub(crate) fn all_errors(results: &EvaluationResults) -> Vec<&ErrorEntry> {
        let mut collected = Vec::new();
        collect_errors(results, &mut collected);
        collected
    }

    /// Assert that evaluation fails and the first error of `keyword` carries
    /// `message`.
    pub(crate) fn expect_error(schema: &Value, instance: &Value, keyword: &str, message: &str) {
        let results = evaluate(schema, instance);
        assert!(!results.is_valid(), "{instance} should not be valid");
        let errors = all_errors(&results);
        let entry = errors
            .iter()
            .find(|entry| entry.keyword.as_ref() == keyword)
            .unwrap_or_else(|| panic!("No `{keyword}` error in {errors:?}"));
        assert_eq!(entry.message, message);
    }

    pub(crate) fn expect_schema_error(schema: &Value) {
        assert!(
            crate::validator_for(schema).is_err(),
            "{schema} should not compile"
        );
    }
}
