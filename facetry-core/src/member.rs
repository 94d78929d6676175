//! Object members: properties, collections and actions

use crate::facet::{Facet, FacetType, FacetValue};
use crate::holder::FacetHolder;
use crate::specification::ObjectSpecification;
use facetry_types::{ActionSemantics, FeatureType, Identifier, TypeRef};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// A scalar or single reference
    Property,
    /// A reference to many
    Collection,
    Action,
}

impl MemberKind {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            MemberKind::Property => FeatureType::Property,
            MemberKind::Collection => FeatureType::Collection,
            MemberKind::Action => FeatureType::Action,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Property => "property",
            MemberKind::Collection => "collection",
            MemberKind::Action => "action",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of an action
#[derive(Debug)]
pub struct ActionParameter {
    index: usize,
    name: String,
    type_ref: TypeRef,
    facets: FacetHolder,
    spec: Option<Weak<ObjectSpecification>>,
}

impl ActionParameter {
    pub(crate) fn new(
        index: usize,
        name: String,
        type_ref: TypeRef,
        facets: FacetHolder,
        spec: Option<Weak<ObjectSpecification>>,
    ) -> Self {
        Self {
            index,
            name,
            type_ref,
            facets,
            spec,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn identifier(&self) -> &Identifier {
        self.facets.identifier()
    }

    pub fn facets(&self) -> &FacetHolder {
        &self.facets
    }

    pub fn get_facet(&self, facet_type: FacetType) -> Option<&Facet> {
        self.facets.get_facet(facet_type)
    }

    pub fn is_mandatory(&self) -> bool {
        flag(&self.facets, FacetType::MANDATORY)
    }

    /// Specification of the parameter's type
    pub fn spec(&self) -> Option<Arc<ObjectSpecification>> {
        self.spec.as_ref().and_then(Weak::upgrade)
    }
}

/// A property, collection or action of an object specification
///
/// Members are assembled completely before they are published on their
/// specification, so their facets are read without locking.
#[derive(Debug)]
pub struct ObjectMember {
    kind: MemberKind,
    id: String,
    method: String,
    type_ref: TypeRef,
    facets: FacetHolder,
    element_spec: Option<Weak<ObjectSpecification>>,
    parameters: Vec<ActionParameter>,
}

impl ObjectMember {
    pub(crate) fn new(
        kind: MemberKind,
        id: String,
        method: String,
        type_ref: TypeRef,
        facets: FacetHolder,
        element_spec: Option<Weak<ObjectSpecification>>,
        parameters: Vec<ActionParameter>,
    ) -> Self {
        Self {
            kind,
            id,
            method,
            type_ref,
            facets,
            element_spec,
            parameters,
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the method the member was discovered from
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Declared type: the property type, collection type or action return type
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn identifier(&self) -> &Identifier {
        self.facets.identifier()
    }

    pub fn facets(&self) -> &FacetHolder {
        &self.facets
    }

    pub fn get_facet(&self, facet_type: FacetType) -> Option<&Facet> {
        self.facets.get_facet(facet_type)
    }

    pub fn contains_facet(&self, facet_type: FacetType) -> bool {
        self.facets.contains_facet(facet_type)
    }

    /// Specification of the property type or collection element type
    pub fn element_spec(&self) -> Option<Arc<ObjectSpecification>> {
        self.element_spec.as_ref().and_then(Weak::upgrade)
    }

    pub fn parameters(&self) -> &[ActionParameter] {
        &self.parameters
    }

    pub fn is_property(&self) -> bool {
        self.kind == MemberKind::Property
    }

    pub fn is_collection(&self) -> bool {
        self.kind == MemberKind::Collection
    }

    pub fn is_action(&self) -> bool {
        self.kind == MemberKind::Action
    }

    /// The display name, falling back to the id
    pub fn name(&self) -> &str {
        self.get_facet(FacetType::NAMED)
            .and_then(Facet::as_text)
            .unwrap_or(&self.id)
    }

    pub fn is_mandatory(&self) -> bool {
        flag(&self.facets, FacetType::MANDATORY)
    }

    pub fn is_hidden(&self) -> bool {
        self.contains_facet(FacetType::HIDDEN)
    }

    pub fn is_disabled(&self) -> bool {
        self.contains_facet(FacetType::DISABLED)
    }

    pub fn action_semantics(&self) -> Option<ActionSemantics> {
        self.get_facet(FacetType::ACTION_SEMANTICS)
            .and_then(Facet::as_action_semantics)
    }

    /// The dotted-decimal sequence from a member-order facet
    pub fn sequence(&self) -> Option<&str> {
        match self.get_facet(FacetType::MEMBER_ORDER)?.value() {
            FacetValue::MemberOrder { sequence, .. } => Some(sequence),
            _ => None,
        }
    }
}

fn flag(facets: &FacetHolder, facet_type: FacetType) -> bool {
    facets
        .get_facet(facet_type)
        .and_then(Facet::as_flag)
        .unwrap_or(false)
}

/// Order members by member-order sequence; unordered members keep their
/// discovery order after all ordered ones
pub(crate) fn sort_members(members: &mut [Arc<ObjectMember>]) {
    members.sort_by(|a, b| match (a.sequence(), b.sequence()) {
        (Some(x), Some(y)) => compare_sequences(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Compare dotted-decimal sequences component by component, so `1.2` sorts before `1.10`
pub fn compare_sequences(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
