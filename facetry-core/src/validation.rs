//! Post-introspection validation
//!
//! Validators run once per specification after it is fully introspected.
//! They never fail loading: problems are collected into a
//! [`ValidationReport`] and the specification is marked rejected.

use crate::facet::FacetType;
use crate::member::ObjectMember;
use crate::programming_model::ProgrammingModelBuilder;
use crate::specification::ObjectSpecification;
use facetry_types::{Identifier, TypeRef};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Checks one specification and reports what is wrong with it
pub trait MetaModelValidator: Send + Sync + 'static {
    fn id(&self) -> &'static str;

    fn validate(&self, spec: &ObjectSpecification, report: &mut ValidationReport);
}

/// A problem found by a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub identifier: Identifier,
    pub validator: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.identifier, self.message, self.validator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectionFailureKind {
    /// A factory returned an error or panicked
    Factory,
    /// A referenced type has no descriptor
    UnresolvedType,
}

/// A problem met while introspecting, recorded instead of propagated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntrospectionFailure {
    pub identifier: Identifier,
    pub kind: IntrospectionFailureKind,
    /// Factory id, or the unresolved type name
    pub source: String,
    pub message: String,
}

impl IntrospectionFailure {
    pub fn factory(identifier: Identifier, factory: &str, message: impl Into<String>) -> Self {
        Self {
            identifier,
            kind: IntrospectionFailureKind::Factory,
            source: factory.to_string(),
            message: message.into(),
        }
    }

    pub fn unresolved_type(identifier: Identifier, type_name: &str) -> Self {
        Self {
            identifier,
            kind: IntrospectionFailureKind::UnresolvedType,
            source: type_name.to_string(),
            message: format!("no descriptor for referenced type {}", type_name),
        }
    }
}

impl fmt::Display for IntrospectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.identifier, self.message, self.source)
    }
}

/// Everything that went wrong while building the metamodel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    failures: Vec<ValidationFailure>,
    introspection_failures: Vec<IntrospectionFailure>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_failure(
        &mut self,
        identifier: &Identifier,
        validator: &'static str,
        message: impl Into<String>,
    ) {
        self.failures.push(ValidationFailure {
            identifier: identifier.clone(),
            validator,
            message: message.into(),
        });
    }

    pub fn record_introspection_failure(&mut self, failure: IntrospectionFailure) {
        self.introspection_failures.push(failure);
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn introspection_failures(&self) -> &[IntrospectionFailure] {
        &self.introspection_failures
    }

    /// Validation failures raised against `identifier` or any of its members
    pub fn failures_for<'a>(
        &'a self,
        identifier: &'a Identifier,
    ) -> impl Iterator<Item = &'a ValidationFailure> + 'a {
        self.failures
            .iter()
            .filter(move |f| f.identifier.logical_type == identifier.logical_type)
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.failures.extend(other.failures);
        self.introspection_failures.extend(other.introspection_failures);
    }

    pub fn len(&self) -> usize {
        self.failures.len() + self.introspection_failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.introspection_failures.is_empty()
    }

    pub fn clear(&mut self) {
        self.failures.clear();
        self.introspection_failures.clear();
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "  {}", failure)?;
        }
        for failure in &self.introspection_failures {
            writeln!(f, "  {}", failure)?;
        }
        Ok(())
    }
}

/// Register the built-in validators
pub fn register_builtins(builder: &mut ProgrammingModelBuilder) {
    let results = [
        builder.add_validator(NamedRequired).map(|_| ()),
        builder.add_validator(OptionalPrimitive).map(|_| ()),
        builder.add_validator(MaxLengthType).map(|_| ()),
        builder.add_validator(UniqueMemberIds).map(|_| ()),
    ];
    for result in results {
        if let Err(err) = result {
            tracing::warn!(error = %err, "built-in validator not registered");
        }
    }
}

/// Every specification and member carries a `named` facet
pub struct NamedRequired;

impl MetaModelValidator for NamedRequired {
    fn id(&self) -> &'static str {
        "named-required"
    }

    fn validate(&self, spec: &ObjectSpecification, report: &mut ValidationReport) {
        if spec.get_local_facet(FacetType::NAMED).is_none() {
            report.add_failure(spec.identifier(), self.id(), "type has no name");
        }
        for member in spec.members() {
            if !member.contains_facet(FacetType::NAMED) {
                report.add_failure(member.identifier(), self.id(), "member has no name");
            }
        }
    }
}

/// A primitive can never be absent, so it cannot be optional
pub struct OptionalPrimitive;

impl OptionalPrimitive {
    fn is_optional(facets: &crate::holder::FacetHolder) -> bool {
        facets
            .get_facet(FacetType::MANDATORY)
            .and_then(|f| f.as_flag())
            == Some(false)
    }
}

impl MetaModelValidator for OptionalPrimitive {
    fn id(&self) -> &'static str {
        "optional-primitive"
    }

    fn validate(&self, spec: &ObjectSpecification, report: &mut ValidationReport) {
        for member in spec.properties() {
            if member.type_ref().is_primitive() && Self::is_optional(member.facets()) {
                report.add_failure(
                    member.identifier(),
                    self.id(),
                    format!("primitive property of type {} cannot be optional", member.type_ref()),
                );
            }
        }
        for action in spec.actions() {
            for parameter in action.parameters() {
                if parameter.type_ref().is_primitive() && Self::is_optional(parameter.facets()) {
                    report.add_failure(
                        parameter.identifier(),
                        self.id(),
                        format!(
                            "primitive parameter of type {} cannot be optional",
                            parameter.type_ref()
                        ),
                    );
                }
            }
        }
    }
}

/// `max-length` only makes sense on strings
pub struct MaxLengthType;

fn is_string(type_ref: &TypeRef) -> bool {
    !type_ref.is_collection()
        && type_ref
            .element_type()
            .is_some_and(|t| t.as_str() == "string")
}

impl MaxLengthType {
    fn check_member(&self, member: &ObjectMember, report: &mut ValidationReport) {
        if member.contains_facet(FacetType::MAX_LENGTH) && !is_string(member.type_ref()) {
            report.add_failure(
                member.identifier(),
                self.id(),
                format!("max-length on non-string type {}", member.type_ref()),
            );
        }
        for parameter in member.parameters() {
            if parameter.get_facet(FacetType::MAX_LENGTH).is_some()
                && !is_string(parameter.type_ref())
            {
                report.add_failure(
                    parameter.identifier(),
                    self.id(),
                    format!("max-length on non-string type {}", parameter.type_ref()),
                );
            }
        }
    }
}

impl MetaModelValidator for MaxLengthType {
    fn id(&self) -> &'static str {
        "max-length-type"
    }

    fn validate(&self, spec: &ObjectSpecification, report: &mut ValidationReport) {
        for member in spec.members() {
            self.check_member(member, report);
        }
    }
}

/// Two members may not share an id
pub struct UniqueMemberIds;

impl MetaModelValidator for UniqueMemberIds {
    fn id(&self) -> &'static str {
        "unique-member-ids"
    }

    fn validate(&self, spec: &ObjectSpecification, report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for member in spec.members() {
            if !seen.insert(member.id()) {
                report.add_failure(
                    member.identifier(),
                    self.id(),
                    format!("duplicate member id '{}' (from {})", member.id(), member.method()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facetry_types::LogicalType;

    #[test]
    fn test_report_counts_both_kinds() {
        let mut report = ValidationReport::new();
        assert!(report.is_empty());

        let id = Identifier::for_member(LogicalType::new("Order"), "total");
        report.add_failure(&id, "max-length-type", "max-length on non-string type prim:int");
        report.record_introspection_failure(IntrospectionFailure::factory(
            id.clone(),
            "boom",
            "exploded",
        ));

        assert_eq!(report.len(), 2);
        assert_eq!(
            report.failures_for(&Identifier::for_type(LogicalType::new("Order"))).count(),
            1
        );
        let text = report.to_string();
        assert!(text.contains("Order#total: max-length on non-string type prim:int [max-length-type]"));
        assert!(text.contains("exploded [boom]"));

        report.clear();
        assert!(report.is_empty());
    }

    #[test]
    fn test_merge() {
        let id = Identifier::for_type(LogicalType::new("Order"));
        let mut a = ValidationReport::new();
        a.add_failure(&id, "named-required", "type has no name");
        let mut b = ValidationReport::new();
        b.record_introspection_failure(IntrospectionFailure::unresolved_type(id, "Ghost"));
        a.merge(b);
        assert_eq!(a.failures().len(), 1);
        assert_eq!(
            a.introspection_failures()[0].kind,
            IntrospectionFailureKind::UnresolvedType
        );
    }

    #[test]
    fn test_string_detection() {
        assert!(is_string(&"string".parse().unwrap()));
        assert!(is_string(&"boxed:string".parse().unwrap()));
        assert!(!is_string(&"list:string".parse().unwrap()));
        assert!(!is_string(&"prim:int".parse().unwrap()));
    }
}
