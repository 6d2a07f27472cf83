//! The keyword registry.
//!
//! Maps keyword names to descriptors carrying evaluation priority, supported
//! drafts, vocabulary, sibling-annotation dependencies and the compile
//! function producing a constraint. The registry also computes the order in
//! which keyword constraints are evaluated: topological over declared
//! dependencies, ties broken by ascending priority, then source order.
use crate::{
    compiler::Context,
    drafts::{Draft, DraftSet, Vocabulary},
    error::SchemaError,
    keywords::{self, custom::CustomKeywordFactory, Keyword},
};
use ahash::AHashMap;
use serde_json::{Map, Value};
use std::sync::Arc;

pub(crate) type CompileFn =
    fn(&Context<'_>, &Map<String, Value>, &Value) -> Result<Option<Keyword>, SchemaError>;

/// A registered keyword.
#[derive(Debug)]
pub(crate) struct KeywordDescriptor {
    pub(crate) name: &'static str,
    /// Lower runs first. Assertions are 0, applicators 10-30.
    pub(crate) priority: i32,
    pub(crate) drafts: DraftSet,
    pub(crate) vocabulary: Vocabulary,
    /// Sibling keywords whose annotations this keyword consumes.
    pub(crate) dependencies: &'static [&'static str],
    pub(crate) compile: CompileFn,
}

const ASSERTION: i32 = 0;
const APPLICATOR: i32 = 10;
const DEPENDENT: i32 = 20;
const UNEVALUATED: i32 = 30;

macro_rules! descriptor {
    ($name:literal, $priority:expr, $drafts:expr, $vocabulary:expr, $deps:expr, $compile:expr) => {
        KeywordDescriptor {
            name: $name,
            priority: $priority,
            drafts: $drafts,
            vocabulary: $vocabulary,
            dependencies: $deps,
            compile: $compile,
        }
    };
}

#[rustfmt::skip]
static DESCRIPTORS: &[KeywordDescriptor] = &[
    // Core
    descriptor!("$ref", APPLICATOR, DraftSet::ALL, Vocabulary::Core, &[], keywords::ref_::compile_ref),
    descriptor!("$recursiveRef", APPLICATOR, DraftSet::DRAFT201909_ONLY, Vocabulary::Core, &[], keywords::ref_::compile_recursive_ref),
    descriptor!("$dynamicRef", APPLICATOR, DraftSet::DRAFT202012_ON, Vocabulary::Core, &[], keywords::ref_::compile_dynamic_ref),
    // In-place applicators
    descriptor!("allOf", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::all_of::compile),
    descriptor!("anyOf", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::any_of::compile),
    descriptor!("oneOf", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::one_of::compile),
    descriptor!("not", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::not::compile),
    descriptor!("if", APPLICATOR, DraftSet::DRAFT7_ON, Vocabulary::Applicator, &[], keywords::if_::compile),
    descriptor!("then", DEPENDENT, DraftSet::DRAFT7_ON, Vocabulary::Applicator, &["if"], keywords::if_::compile_then),
    descriptor!("else", DEPENDENT, DraftSet::DRAFT7_ON, Vocabulary::Applicator, &["if"], keywords::if_::compile_else),
    descriptor!("dependencies", APPLICATOR, DraftSet::LEGACY, Vocabulary::Applicator, &[], keywords::dependencies::compile),
    descriptor!("dependentSchemas", APPLICATOR, DraftSet::DRAFT201909_ON, Vocabulary::Applicator, &[], keywords::dependencies::compile_dependent_schemas),
    // Object applicators
    descriptor!("properties", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::properties::compile),
    descriptor!("patternProperties", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::pattern_properties::compile),
    descriptor!("additionalProperties", DEPENDENT, DraftSet::ALL, Vocabulary::Applicator, &["properties", "patternProperties"], keywords::additional_properties::compile),
    descriptor!("propertyNames", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::property_names::compile),
    descriptor!("unevaluatedProperties", UNEVALUATED, DraftSet::DRAFT201909_ON, Vocabulary::Unevaluated, &["properties", "patternProperties", "additionalProperties"], keywords::unevaluated_properties::compile),
    // Array applicators
    descriptor!("prefixItems", APPLICATOR, DraftSet::DRAFT202012_ON, Vocabulary::Applicator, &[], keywords::prefix_items::compile),
    descriptor!("items", DEPENDENT, DraftSet::ALL, Vocabulary::Applicator, &["prefixItems"], keywords::items::compile),
    descriptor!("additionalItems", DEPENDENT, DraftSet::UNTIL_DRAFT201909, Vocabulary::Applicator, &["items"], keywords::additional_items::compile),
    descriptor!("contains", APPLICATOR, DraftSet::ALL, Vocabulary::Applicator, &[], keywords::contains::compile),
    descriptor!("unevaluatedItems", UNEVALUATED, DraftSet::DRAFT201909_ON, Vocabulary::Unevaluated, &["prefixItems", "items", "additionalItems", "contains"], keywords::unevaluated_items::compile),
    // Absorbed by `contains` at compile time
    descriptor!("minContains", ASSERTION, DraftSet::DRAFT201909_ON, Vocabulary::Validation, &[], keywords::contains::compile_min_contains),
    descriptor!("maxContains", ASSERTION, DraftSet::DRAFT201909_ON, Vocabulary::Validation, &[], keywords::contains::compile_max_contains),
    // Assertions
    descriptor!("type", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::type_::compile),
    descriptor!("enum", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::enum_::compile),
    descriptor!("const", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::const_::compile),
    descriptor!("multipleOf", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::multiple_of::compile),
    descriptor!("maximum", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::maximum::compile),
    descriptor!("exclusiveMaximum", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::exclusive_maximum::compile),
    descriptor!("minimum", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::minimum::compile),
    descriptor!("exclusiveMinimum", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::exclusive_minimum::compile),
    descriptor!("maxLength", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::max_length::compile),
    descriptor!("minLength", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::min_length::compile),
    descriptor!("pattern", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::pattern::compile),
    descriptor!("maxItems", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::max_items::compile),
    descriptor!("minItems", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::min_items::compile),
    descriptor!("uniqueItems", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::unique_items::compile),
    descriptor!("maxProperties", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::max_properties::compile),
    descriptor!("minProperties", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::min_properties::compile),
    descriptor!("required", ASSERTION, DraftSet::ALL, Vocabulary::Validation, &[], keywords::required::compile),
    descriptor!("dependentRequired", ASSERTION, DraftSet::DRAFT201909_ON, Vocabulary::Validation, &[], keywords::dependent_required::compile),
    descriptor!("format", ASSERTION, DraftSet::ALL, Vocabulary::Format, &[], keywords::format::compile),
    // Annotation-only keywords
    descriptor!("title", ASSERTION, DraftSet::ALL, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("description", ASSERTION, DraftSet::ALL, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("default", ASSERTION, DraftSet::ALL, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("examples", ASSERTION, DraftSet::ALL, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("readOnly", ASSERTION, DraftSet::DRAFT7_ON, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("writeOnly", ASSERTION, DraftSet::DRAFT7_ON, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("deprecated", ASSERTION, DraftSet::DRAFT201909_ON, Vocabulary::Metadata, &[], keywords::annotation::compile),
    descriptor!("contentEncoding", ASSERTION, DraftSet::DRAFT7_ON, Vocabulary::Content, &[], keywords::annotation::compile),
    descriptor!("contentMediaType", ASSERTION, DraftSet::DRAFT7_ON, Vocabulary::Content, &[], keywords::annotation::compile),
    descriptor!("contentSchema", ASSERTION, DraftSet::DRAFT201909_ON, Vocabulary::Content, &[], keywords::annotation::compile),
];

/// A caller-registered keyword.
#[derive(Clone)]
pub(crate) struct CustomDescriptor {
    pub(crate) priority: i32,
    pub(crate) dependencies: Vec<Box<str>>,
    pub(crate) factory: Arc<dyn CustomKeywordFactory>,
}

impl std::fmt::Debug for CustomDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomDescriptor")
            .field("priority", &self.priority)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Keyword descriptors known to one validator.
#[derive(Debug)]
pub(crate) struct KeywordRegistry {
    builtin: AHashMap<&'static str, &'static KeywordDescriptor>,
    custom: AHashMap<Box<str>, CustomDescriptor>,
}

/// One keyword in its evaluation position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OrderedKeyword {
    /// Index into the input slice of `ordered`.
    pub(crate) source: usize,
    /// Positions of sibling dependencies in the output order.
    pub(crate) dependencies: Vec<usize>,
}

impl KeywordRegistry {
    pub(crate) fn standard() -> KeywordRegistry {
        let mut builtin = AHashMap::with_capacity(DESCRIPTORS.len());
        for descriptor in DESCRIPTORS {
            builtin.insert(descriptor.name, descriptor);
        }
        let registry = KeywordRegistry {
            builtin,
            custom: AHashMap::new(),
        };
        debug_assert!(registry.find_cycle().is_none(), "Builtin table is acyclic");
        registry
    }

    /// Register a caller-supplied keyword. It may override a builtin.
    pub(crate) fn register(
        &mut self,
        name: Box<str>,
        descriptor: CustomDescriptor,
    ) -> Result<(), SchemaError> {
        self.custom.insert(name, descriptor);
        if let Some(chain) = self.find_cycle() {
            return Err(SchemaError::RegistryCycle { chain });
        }
        Ok(())
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&'static KeywordDescriptor> {
        self.builtin.get(name).copied()
    }

    pub(crate) fn custom(&self, name: &str) -> Option<&CustomDescriptor> {
        self.custom.get(name)
    }

    /// All builtin keywords defined in `draft`.
    #[allow(dead_code)]
    pub(crate) fn enumerate(&self, draft: Draft) -> impl Iterator<Item = &'static str> + '_ {
        DESCRIPTORS
            .iter()
            .filter(move |descriptor| descriptor.drafts.contains(draft))
            .map(|descriptor| descriptor.name)
    }

    fn priority_and_dependencies(&self, name: &str) -> (i32, Vec<&str>) {
        if let Some(descriptor) = self.custom.get(name) {
            (
                descriptor.priority,
                descriptor.dependencies.iter().map(AsRef::as_ref).collect(),
            )
        } else if let Some(descriptor) = self.builtin.get(name) {
            (descriptor.priority, descriptor.dependencies.to_vec())
        } else {
            (ASSERTION, Vec::new())
        }
    }

    /// Evaluation order for the keywords of one schema object.
    ///
    /// Dependencies form the partial order; ties are broken by ascending
    /// priority, then by source order. Dependency edges are restricted to the
    /// keywords actually present.
    pub(crate) fn ordered(&self, names: &[&str]) -> Result<Vec<OrderedKeyword>, SchemaError> {
        let n = names.len();
        let mut priorities = vec![0_i32; n];
        let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (idx, name) in names.iter().enumerate() {
            let (priority, dependency_names) = self.priority_and_dependencies(name);
            priorities[idx] = priority;
            for dependency in dependency_names {
                if let Some(position) = names.iter().position(|name| *name == dependency) {
                    dependencies[idx].push(position);
                }
            }
        }
        let mut emitted = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        let mut positions = vec![0_usize; n];
        while emitted.len() < n {
            let mut candidate: Option<usize> = None;
            for idx in 0..n {
                if placed[idx] || !dependencies[idx].iter().all(|dep| placed[*dep]) {
                    continue;
                }
                match candidate {
                    Some(best) if (priorities[idx], idx) >= (priorities[best], best) => {}
                    _ => candidate = Some(idx),
                }
            }
            // Unreachable with an acyclic registry; reported for custom tables
            let Some(idx) = candidate else {
                return Err(SchemaError::RegistryCycle {
                    chain: names
                        .iter()
                        .enumerate()
                        .filter(|(idx, _)| !placed[*idx])
                        .map(|(_, name)| (*name).to_string())
                        .collect(),
                });
            };
            placed[idx] = true;
            positions[idx] = emitted.len();
            emitted.push(idx);
        }
        Ok(emitted
            .into_iter()
            .map(|source| OrderedKeyword {
                source,
                dependencies: dependencies[source]
                    .iter()
                    .map(|dep| positions[*dep])
                    .collect(),
            })
            .collect())
    }

    /// Find a dependency cycle among registered descriptors, if any.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let names: Vec<&str> = self
            .builtin
            .keys()
            .copied()
            .chain(self.custom.keys().map(AsRef::as_ref))
            .collect();
        let mut states: AHashMap<&str, u8> = AHashMap::new();
        for name in &names {
            if let Some(chain) = self.visit(name, &mut states, &mut Vec::new()) {
                return Some(chain);
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        states: &mut AHashMap<&'a str, u8>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match states.get(name) {
            Some(2) => return None,
            Some(1) => {
                let start = stack.iter().position(|entry| *entry == name).unwrap_or(0);
                let mut chain: Vec<String> =
                    stack[start..].iter().map(|entry| entry.to_string()).collect();
                chain.push(name.to_string());
                return Some(chain);
            }
            _ => {}
        }
        states.insert(name, 1);
        stack.push(name);
        let (_, dependencies) = self.priority_and_dependencies(name);
        for dependency in dependencies {
            // Only edges between registered keywords participate
            if self.builtin.contains_key(dependency) || self.custom.contains_key(dependency) {
                if let Some(chain) = self.visit(dependency, states, stack) {
                    return Some(chain);
                }
            }
        }
        stack.pop();
        states.insert(name, 2);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::custom::{CustomKeyword, CustomKeywordFactory};

    struct NoopFactory;

    impl CustomKeywordFactory for NoopFactory {
        fn init(
            &self,
            _: &Map<String, Value>,
            _: &Value,
        ) -> Result<Box<dyn CustomKeyword>, String> {
            unimplemented!("Never compiled in these tests")
        }
    }

    fn names<'a>(order: &[OrderedKeyword], input: &[&'a str]) -> Vec<&'a str> {
        order.iter().map(|entry| input[entry.source]).collect()
    }

    #[test]
    fn dependency_order() {
        let registry = KeywordRegistry::standard();
        let input = ["additionalProperties", "type", "properties"];
        let order = registry.ordered(&input).expect("No cycles");
        assert_eq!(names(&order, &input), ["type", "properties", "additionalProperties"]);
        // `additionalProperties` sees `properties` at its position in the output
        assert_eq!(order[2].dependencies, vec![1]);
    }

    #[test]
    fn priority_breaks_ties() {
        let registry = KeywordRegistry::standard();
        let input = ["unevaluatedProperties", "allOf", "required"];
        let order = registry.ordered(&input).expect("No cycles");
        assert_eq!(
            names(&order, &input),
            ["required", "allOf", "unevaluatedProperties"]
        );
    }

    #[test]
    fn source_order_is_stable() {
        let registry = KeywordRegistry::standard();
        let input = ["minimum", "maximum", "type"];
        let order = registry.ordered(&input).expect("No cycles");
        assert_eq!(names(&order, &input), ["minimum", "maximum", "type"]);
    }

    #[test]
    fn then_runs_after_if() {
        let registry = KeywordRegistry::standard();
        let input = ["then", "if", "else"];
        let order = registry.ordered(&input).expect("No cycles");
        assert_eq!(names(&order, &input), ["if", "then", "else"]);
    }

    #[test]
    fn registration_cycle_is_rejected() {
        let mut registry = KeywordRegistry::standard();
        registry
            .register(
                "x-a".into(),
                CustomDescriptor {
                    priority: 0,
                    dependencies: vec!["x-b".into()],
                    factory: Arc::new(NoopFactory),
                },
            )
            .expect("No cycle yet");
        let error = registry
            .register(
                "x-b".into(),
                CustomDescriptor {
                    priority: 0,
                    dependencies: vec!["x-a".into()],
                    factory: Arc::new(NoopFactory),
                },
            )
            .expect_err("Cycle must be detected");
        assert!(matches!(error, SchemaError::RegistryCycle { .. }));
    }

    #[test]
    fn unknown_keywords_get_default_priority() {
        let registry = KeywordRegistry::standard();
        let input = ["x-custom", "properties"];
        let order = registry.ordered(&input).expect("No cycles");
        assert_eq!(names(&order, &input), ["x-custom", "properties"]);
    }
}
