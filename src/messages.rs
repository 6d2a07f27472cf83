//! Templated error messages.
//!
//! Every assertion failure renders a message from a template with `[[name]]`
//! placeholders substituted from the error's parameter map. Callers may
//! override templates per keyword.
use ahash::AHashMap;
use serde_json::{Map, Value};

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("false", "false schema does not allow [[value]]"),
    ("type", "[[received]] is not of type [[expected]]"),
    ("enum", "[[value]] is not one of [[options]]"),
    ("const", "[[expected]] was expected"),
    ("multipleOf", "[[value]] is not a multiple of [[multipleOf]]"),
    ("maximum", "[[value]] is greater than the maximum of [[limit]]"),
    (
        "exclusiveMaximum",
        "[[value]] is greater than or equal to the maximum of [[limit]]",
    ),
    ("minimum", "[[value]] is less than the minimum of [[limit]]"),
    (
        "exclusiveMinimum",
        "[[value]] is less than or equal to the minimum of [[limit]]",
    ),
    ("maxLength", "[[value]] is longer than [[limit]] characters"),
    ("minLength", "[[value]] is shorter than [[limit]] characters"),
    ("pattern", "[[value]] does not match [[pattern]]"),
    ("maxItems", "[[value]] has more than [[limit]] items"),
    ("minItems", "[[value]] has less than [[limit]] items"),
    ("uniqueItems", "[[value]] has non-unique elements"),
    ("contains", "none of [[value]] are valid under the given schema"),
    (
        "minContains",
        "[[matched]] items match `contains`, fewer than [[limit]]",
    ),
    (
        "maxContains",
        "[[matched]] items match `contains`, more than [[limit]]",
    ),
    ("maxProperties", "[[value]] has more than [[limit]] properties"),
    ("minProperties", "[[value]] has less than [[limit]] properties"),
    ("required", "[[property]] is a required property"),
    (
        "dependentRequired",
        "[[property]] is required when [[dependency]] is present",
    ),
    (
        "dependentSchemas",
        "object does not satisfy the dependency schema of [[property]]",
    ),
    ("format", "[[value]] is not a [[format]]"),
    ("properties", "properties [[unmatched]] do not match their schemas"),
    (
        "patternProperties",
        "properties [[unmatched]] do not match their pattern schemas",
    ),
    (
        "additionalProperties",
        "additional properties are not allowed ([[unexpected]] were unexpected)",
    ),
    (
        "propertyNames",
        "property name [[property]] does not match the schema",
    ),
    ("items", "items at indexes [[unmatched]] do not match the schema"),
    (
        "prefixItems",
        "items at indexes [[unmatched]] do not match their schemas",
    ),
    (
        "additionalItems",
        "additional items at indexes [[unmatched]] do not match the schema",
    ),
    ("allOf", "[[value]] is not valid under all of the given schemas"),
    ("anyOf", "[[value]] is not valid under any of the given schemas"),
    ("oneOf", "[[value]] is not valid under any of the given schemas"),
    (
        "oneOf.multiple",
        "[[value]] is valid under more than one of the given schemas",
    ),
    ("not", "[[value]] is disallowed by the negated schema"),
    ("then", "[[value]] does not match the `then` schema"),
    ("else", "[[value]] does not match the `else` schema"),
    ("$ref", "[[value]] does not match the referenced schema"),
    ("$recursiveRef", "[[value]] does not match the referenced schema"),
    ("$dynamicRef", "[[value]] does not match the referenced schema"),
    (
        "unevaluatedProperties",
        "unevaluated properties are not allowed ([[unexpected]] were unexpected)",
    ),
    (
        "unevaluatedItems",
        "unevaluated items are not allowed ([[unexpected]] were unexpected)",
    ),
];

/// Message templates with caller overrides.
#[derive(Debug, Clone, Default)]
pub struct MessageTemplates {
    overrides: AHashMap<Box<str>, Box<str>>,
}

impl MessageTemplates {
    pub(crate) fn set(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.overrides
            .insert(key.into().into_boxed_str(), template.into().into_boxed_str());
    }

    fn template(&self, key: &str) -> Option<&str> {
        if let Some(template) = self.overrides.get(key) {
            return Some(template);
        }
        DEFAULT_TEMPLATES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, template)| *template)
    }

    /// Render the message for `key` from `params`.
    pub(crate) fn render(&self, key: &str, params: &Map<String, Value>) -> String {
        match self.template(key) {
            Some(template) => substitute(template, params),
            None => format!("value does not satisfy `{key}`"),
        }
    }
}

/// Replace each `[[name]]` with the JSON serialization of `params[name]`.
fn substitute(template: &str, params: &Map<String, Value>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("[[") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        if let Some(end) = after.find("]]") {
            let name = &after[..end];
            match params.get(name) {
                Some(value) => {
                    output.push_str(&serde_json::to_string(value).expect("Always serializable"));
                }
                // Unknown placeholders are kept verbatim
                None => {
                    output.push_str(&rest[start..start + end + 4]);
                }
            }
            rest = &after[end + 2..];
        } else {
            output.push_str(&rest[start..]);
            rest = "";
        }
    }
    output.push_str(rest);
    output
}
