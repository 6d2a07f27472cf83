//! Output formats.
//!
//! Flattens or prunes an [`EvaluationResults`] tree into the four standard
//! JSON Schema output formats. Field names follow the 2020-12 output
//! specification: `valid`, `keywordLocation`, `absoluteKeywordLocation`,
//! `instanceLocation`, `annotations`, `errors`, `nested`.
use crate::{
    error::EvaluationError,
    evaluation::EvaluationResults,
    paths::JsonPointer,
    validator::Validator,
};
use serde::ser::SerializeMap;
use serde_json::Value;
use std::sync::Arc;

/// The output resulting from applying a schema to an instance.
///
/// No work is done until one of the format methods is called, because the
/// formats have different performance characteristics: `flag` short-circuits,
/// the other three require a full evaluation.
#[derive(Debug, Clone)]
pub struct Output<'a, 'b> {
    validator: &'a Validator,
    instance: &'b Value,
}

impl<'a, 'b> Output<'a, 'b> {
    pub(crate) const fn new<'c, 'd>(
        validator: &'c Validator,
        instance: &'d Value,
    ) -> Output<'c, 'd> {
        Output {
            validator,
            instance,
        }
    }

    /// The `Flag` format: validity only.
    pub fn flag(&self) -> Result<Flag, EvaluationError> {
        let results = self.validator.evaluate_with(self.instance, true)?;
        Ok(Flag {
            valid: results.is_valid(),
        })
    }

    /// The `Basic` format: a flat list of output units, depth-first.
    pub fn basic(&self) -> Result<BasicOutput, EvaluationError> {
        let results = self.validator.evaluate(self.instance)?;
        Ok(BasicOutput::from_results(&results))
    }

    /// The `Detailed` format: the results tree with nodes that are valid,
    /// unannotated and childless dropped.
    pub fn detailed(&self) -> Result<DetailedOutput, EvaluationError> {
        let results = self.validator.evaluate(self.instance)?;
        Ok(DetailedOutput { root: results })
    }

    /// The `Verbose` format: the full results tree, skipped nodes included.
    pub fn verbose(&self) -> Result<VerboseOutput, EvaluationError> {
        let results = self.validator.evaluate(self.instance)?;
        Ok(VerboseOutput { root: results })
    }
}

/// The `Flag` output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Flag {
    /// Whether the instance conforms.
    pub valid: bool,
}

/// One entry of the `Basic` output format.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    valid: bool,
    keyword_location: JsonPointer,
    absolute_keyword_location: Option<Arc<str>>,
    instance_location: JsonPointer,
    payload: UnitPayload,
}

#[derive(Debug, Clone, PartialEq)]
enum UnitPayload {
    Annotations(Vec<(Box<str>, Value)>),
    Error(String),
}

impl OutputUnit {
    /// The dynamic path to the producing schema node.
    #[must_use]
    pub fn keyword_location(&self) -> &JsonPointer {
        &self.keyword_location
    }

    /// The absolute schema location, when the schema has a real identifier.
    #[must_use]
    pub fn absolute_keyword_location(&self) -> Option<&str> {
        self.absolute_keyword_location.as_deref()
    }

    /// The location within the validated instance.
    #[must_use]
    pub fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }
}

/// The `Basic` output format.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicOutput {
    valid: bool,
    units: Vec<OutputUnit>,
}

impl BasicOutput {
    /// Whether the instance conforms.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The flattened output units.
    #[must_use]
    pub fn units(&self) -> &[OutputUnit] {
        &self.units
    }

    pub(crate) fn from_results(results: &EvaluationResults) -> BasicOutput {
        let mut units = Vec::new();
        if results.is_valid() {
            collect_annotation_units(results, &mut units);
        } else {
            collect_error_units(results, &mut units);
        }
        BasicOutput {
            valid: results.is_valid(),
            units,
        }
    }
}

fn collect_annotation_units(node: &EvaluationResults, units: &mut Vec<OutputUnit>) {
    if !node.is_valid() || node.is_skipped() {
        return;
    }
    if node.annotations().next().is_some() {
        units.push(OutputUnit {
            valid: true,
            keyword_location: node.evaluation_path().clone(),
            absolute_keyword_location: node.schema_location().map(Arc::from),
            instance_location: node.instance_location().clone(),
            payload: UnitPayload::Annotations(
                node.annotations()
                    .map(|(keyword, value)| (Box::from(keyword), value.clone()))
                    .collect(),
            ),
        });
    }
    for child in node.nested() {
        collect_annotation_units(child, units);
    }
}

fn collect_error_units(node: &EvaluationResults, units: &mut Vec<OutputUnit>) {
    if node.is_valid() || node.is_skipped() {
        return;
    }
    for entry in node.errors() {
        units.push(OutputUnit {
            valid: false,
            keyword_location: node.evaluation_path().clone(),
            absolute_keyword_location: node.schema_location().map(Arc::from),
            instance_location: node.instance_location().clone(),
            payload: UnitPayload::Error(entry.message.clone()),
        });
    }
    for child in node.nested() {
        collect_error_units(child, units);
    }
}

/// The `Detailed` output format.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedOutput {
    root: EvaluationResults,
}

impl DetailedOutput {
    /// Whether the instance conforms.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }
}

/// The `Verbose` output format.
#[derive(Debug, Clone, PartialEq)]
pub struct VerboseOutput {
    root: EvaluationResults,
}

impl VerboseOutput {
    /// Whether the instance conforms.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }
}

impl serde::Serialize for BasicOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("valid", &self.valid)?;
        if self.valid {
            map.serialize_entry("annotations", &self.units)?;
        } else {
            map.serialize_entry("errors", &self.units)?;
        }
        map.end()
    }
}

impl serde::Serialize for OutputUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.valid)?;
        map.serialize_entry("keywordLocation", &self.keyword_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map.serialize_entry("absoluteKeywordLocation", absolute.as_ref())?;
        }
        map.serialize_entry("instanceLocation", &self.instance_location)?;
        match &self.payload {
            UnitPayload::Annotations(annotations) => {
                map.serialize_entry("annotations", &AnnotationMap(annotations))?;
            }
            UnitPayload::Error(message) => {
                map.serialize_entry("error", message)?;
            }
        }
        map.end()
    }
}

struct AnnotationMap<'a>(&'a [(Box<str>, Value)]);

impl serde::Serialize for AnnotationMap<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (keyword, value) in self.0 {
            map.serialize_entry(keyword.as_ref(), value)?;
        }
        map.end()
    }
}

struct Node<'a> {
    node: &'a EvaluationResults,
    verbose: bool,
}

impl Node<'_> {
    fn keep(node: &EvaluationResults) -> bool {
        if node.is_skipped() {
            return false;
        }
        !node.is_valid()
            || node.annotations().next().is_some()
            || node.nested().iter().any(Node::keep)
    }
}

impl serde::Serialize for Node<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.node.is_valid())?;
        map.serialize_entry("keywordLocation", self.node.evaluation_path())?;
        if let Some(absolute) = self.node.schema_location() {
            map.serialize_entry("absoluteKeywordLocation", absolute)?;
        }
        map.serialize_entry("instanceLocation", self.node.instance_location())?;
        if self.node.annotations().next().is_some() {
            let annotations: Vec<(Box<str>, Value)> = self
                .node
                .annotations()
                .map(|(keyword, value)| (Box::from(keyword), value.clone()))
                .collect();
            map.serialize_entry("annotations", &AnnotationMap(&annotations))?;
        }
        if !self.node.errors().is_empty() {
            map.serialize_entry("errors", &ErrorList(self.node))?;
        }
        let nested: Vec<Node<'_>> = self
            .node
            .nested()
            .iter()
            .filter(|child| self.verbose || Node::keep(child))
            .map(|child| Node {
                node: child,
                verbose: self.verbose,
            })
            .collect();
        if !nested.is_empty() {
            map.serialize_entry("nested", &nested)?;
        }
        map.end()
    }
}

struct ErrorList<'a>(&'a EvaluationResults);

impl serde::Serialize for ErrorList<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.errors().len()))?;
        for entry in self.0.errors() {
            seq.serialize_element(&ErrorObject(entry))?;
        }
        seq.end()
    }
}

struct ErrorObject<'a>(&'a crate::error::ErrorEntry);

impl serde::Serialize for ErrorObject<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("keyword", self.0.keyword.as_ref())?;
        map.serialize_entry("error", &self.0.message)?;
        map.end()
    }
}

impl serde::Serialize for DetailedOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Node {
            node: &self.root,
            verbose: false,
        }
        .serialize(serializer)
    }
}

impl serde::Serialize for VerboseOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Node {
            node: &self.root,
            verbose: true,
        }
        .serialize(serializer)
    }
}
