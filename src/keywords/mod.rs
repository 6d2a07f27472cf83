//! Keyword constraints.
//!
//! One module per keyword. Each module provides a payload struct, a compile
//! function registered in the keyword table, and an evaluator invoked by the
//! driver once the keyword's sibling dependencies have completed. Dispatch is
//! a tagged enum; custom keywords plug in through the [`custom`] module.
pub(crate) mod additional_items;
pub(crate) mod additional_properties;
pub(crate) mod all_of;
pub(crate) mod annotation;
pub(crate) mod any_of;
pub(crate) mod const_;
pub(crate) mod contains;
pub(crate) mod custom;
pub(crate) mod dependencies;
pub(crate) mod dependent_required;
pub(crate) mod enum_;
pub(crate) mod exclusive_maximum;
pub(crate) mod exclusive_minimum;
pub(crate) mod format;
pub(crate) mod helpers;
pub(crate) mod if_;
pub(crate) mod items;
pub(crate) mod max_items;
pub(crate) mod max_length;
pub(crate) mod max_properties;
pub(crate) mod maximum;
pub(crate) mod min_items;
pub(crate) mod min_length;
pub(crate) mod min_properties;
pub(crate) mod minimum;
pub(crate) mod multiple_of;
pub(crate) mod not;
pub(crate) mod one_of;
pub(crate) mod pattern;
pub(crate) mod pattern_properties;
pub(crate) mod prefix_items;
pub(crate) mod properties;
pub(crate) mod property_names;
pub(crate) mod ref_;
pub(crate) mod required;
pub(crate) mod type_;
pub(crate) mod unevaluated_items;
pub(crate) mod unevaluated_properties;
pub(crate) mod unique_items;

use crate::{
    error::EvaluationError,
    evaluation::{KeywordEvaluation, Scope, Siblings},
};

/// A compiled keyword constraint, dispatched by tag.
#[derive(Debug)]
pub(crate) enum Keyword {
    AdditionalItems(additional_items::AdditionalItems),
    AdditionalProperties(additional_properties::AdditionalProperties),
    AllOf(all_of::AllOf),
    Annotation(annotation::Annotation),
    AnyOf(any_of::AnyOf),
    Const(const_::Const),
    Contains(contains::Contains),
    Custom(custom::CustomConstraint),
    Dependencies(dependencies::Dependencies),
    DependentRequired(dependent_required::DependentRequired),
    DependentSchemas(dependencies::DependentSchemas),
    DynamicRef(ref_::DynamicRef),
    Else(if_::Else),
    Enum(enum_::Enum),
    ExclusiveMaximum(exclusive_maximum::ExclusiveMaximum),
    ExclusiveMinimum(exclusive_minimum::ExclusiveMinimum),
    Format(format::Format),
    If(if_::If),
    Items(items::Items),
    ItemsArray(items::ItemsArray),
    MaxItems(max_items::MaxItems),
    MaxLength(max_length::MaxLength),
    MaxProperties(max_properties::MaxProperties),
    Maximum(maximum::Maximum),
    MinItems(min_items::MinItems),
    MinLength(min_length::MinLength),
    MinProperties(min_properties::MinProperties),
    Minimum(minimum::Minimum),
    MultipleOf(multiple_of::MultipleOf),
    Not(not::Not),
    OneOf(one_of::OneOf),
    Pattern(pattern::Pattern),
    PatternProperties(pattern_properties::PatternProperties),
    PrefixItems(prefix_items::PrefixItems),
    Properties(properties::Properties),
    PropertyNames(property_names::PropertyNames),
    RecursiveRef(ref_::RecursiveRef),
    Ref(ref_::Ref),
    Required(required::Required),
    Then(if_::Then),
    Type(type_::Type),
    UnevaluatedItems(unevaluated_items::UnevaluatedItems),
    UnevaluatedProperties(unevaluated_properties::UnevaluatedProperties),
    UniqueItems(unique_items::UniqueItems),
}

impl Keyword {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        match self {
            Keyword::AdditionalItems(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::AdditionalProperties(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::AllOf(inner) => inner.evaluate(scope, evaluation),
            Keyword::Annotation(inner) => inner.evaluate(evaluation),
            Keyword::AnyOf(inner) => inner.evaluate(scope, evaluation),
            Keyword::Const(inner) => inner.evaluate(scope, evaluation),
            Keyword::Contains(inner) => inner.evaluate(scope, evaluation),
            Keyword::Custom(inner) => inner.evaluate(scope, evaluation),
            Keyword::Dependencies(inner) => inner.evaluate(scope, evaluation),
            Keyword::DependentRequired(inner) => inner.evaluate(scope, evaluation),
            Keyword::DependentSchemas(inner) => inner.evaluate(scope, evaluation),
            Keyword::DynamicRef(inner) => inner.evaluate(scope, evaluation),
            Keyword::Else(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::Enum(inner) => inner.evaluate(scope, evaluation),
            Keyword::ExclusiveMaximum(inner) => inner.evaluate(scope, evaluation),
            Keyword::ExclusiveMinimum(inner) => inner.evaluate(scope, evaluation),
            Keyword::Format(inner) => inner.evaluate(scope, evaluation),
            Keyword::If(inner) => inner.evaluate(scope, evaluation),
            Keyword::Items(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::ItemsArray(inner) => inner.evaluate(scope, evaluation),
            Keyword::MaxItems(inner) => inner.evaluate(scope, evaluation),
            Keyword::MaxLength(inner) => inner.evaluate(scope, evaluation),
            Keyword::MaxProperties(inner) => inner.evaluate(scope, evaluation),
            Keyword::Maximum(inner) => inner.evaluate(scope, evaluation),
            Keyword::MinItems(inner) => inner.evaluate(scope, evaluation),
            Keyword::MinLength(inner) => inner.evaluate(scope, evaluation),
            Keyword::MinProperties(inner) => inner.evaluate(scope, evaluation),
            Keyword::Minimum(inner) => inner.evaluate(scope, evaluation),
            Keyword::MultipleOf(inner) => inner.evaluate(scope, evaluation),
            Keyword::Not(inner) => inner.evaluate(scope, evaluation),
            Keyword::OneOf(inner) => inner.evaluate(scope, evaluation),
            Keyword::Pattern(inner) => inner.evaluate(scope, evaluation),
            Keyword::PatternProperties(inner) => inner.evaluate(scope, evaluation),
            Keyword::PrefixItems(inner) => inner.evaluate(scope, evaluation),
            Keyword::Properties(inner) => inner.evaluate(scope, evaluation),
            Keyword::PropertyNames(inner) => inner.evaluate(scope, evaluation),
            Keyword::RecursiveRef(inner) => inner.evaluate(scope, evaluation),
            Keyword::Ref(inner) => inner.evaluate(scope, evaluation),
            Keyword::Required(inner) => inner.evaluate(scope, evaluation),
            Keyword::Then(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::Type(inner) => inner.evaluate(scope, evaluation),
            Keyword::UnevaluatedItems(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::UnevaluatedProperties(inner) => inner.evaluate(scope, evaluation, siblings),
            Keyword::UniqueItems(inner) => inner.evaluate(scope, evaluation),
        }
    }
}
