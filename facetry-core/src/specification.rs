//! Object specifications
//!
//! An [`ObjectSpecification`] is the metamodel of one domain type. It is
//! created as a placeholder the moment introspection starts and is filled
//! in place, so references handed out during a cyclic load stay valid once
//! introspection completes.
//!
//! Supertype and element-type references are weak: the loader's cache owns
//! every specification, and a cycle of strong references would keep a whole
//! graph alive after a reset.

use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::facet::{Facet, FacetType};
use crate::holder::FacetHolder;
use crate::member::{MemberKind, ObjectMember};
use facetry_types::{Identifier, LogicalType};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// How far introspection of a specification has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntrospectionState {
    NotIntrospected,
    /// Object-level facets and supertypes are known
    TypeIntrospected,
    /// Members are known as well
    FullyIntrospected,
}

impl fmt::Display for IntrospectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntrospectionState::NotIntrospected => write!(f, "not introspected"),
            IntrospectionState::TypeIntrospected => write!(f, "type introspected"),
            IntrospectionState::FullyIntrospected => write!(f, "fully introspected"),
        }
    }
}

pub struct ObjectSpecification {
    identifier: Identifier,
    descriptor: Arc<TypeDescriptor>,
    state: RwLock<IntrospectionState>,
    facets: RwLock<FacetHolder>,
    supertypes: OnceCell<Vec<Weak<ObjectSpecification>>>,
    members: OnceCell<Vec<Arc<ObjectMember>>>,
    in_progress: AtomicBool,
    rejected: AtomicBool,
}

impl ObjectSpecification {
    pub(crate) fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        let identifier = Identifier::for_type(descriptor.logical_type.clone());
        Self {
            facets: RwLock::new(FacetHolder::new(identifier.clone())),
            identifier,
            descriptor,
            state: RwLock::new(IntrospectionState::NotIntrospected),
            supertypes: OnceCell::new(),
            members: OnceCell::new(),
            in_progress: AtomicBool::new(false),
            rejected: AtomicBool::new(false),
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.identifier.logical_type
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn kind(&self) -> TypeKind {
        self.descriptor.kind
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind().is_instantiable() && self.get_local_facet(FacetType::NON_INSTANTIABLE).is_none()
    }

    pub fn is_value(&self) -> bool {
        self.kind() == TypeKind::Value
    }

    pub fn state(&self) -> IntrospectionState {
        *self.state.read()
    }

    pub fn is_fully_introspected(&self) -> bool {
        self.state() == IntrospectionState::FullyIntrospected
    }

    /// Whether validation found problems with this type or its members
    pub fn is_rejected(&self) -> bool {
        self.rejected.load(Ordering::Acquire)
    }

    /// The display name, falling back to the simple type name
    pub fn name(&self) -> String {
        self.get_facet(FacetType::NAMED)
            .and_then(|f| f.as_text().map(str::to_string))
            .unwrap_or_else(|| self.logical_type().simple_name().to_string())
    }

    /// Look up a facet, consulting supertypes when it is absent locally
    ///
    /// Supertypes are searched breadth-first, nearest first, superclass
    /// before interfaces; each ancestor is visited once.
    pub fn get_facet(&self, facet_type: FacetType) -> Option<Facet> {
        if let Some(facet) = self.get_local_facet(facet_type) {
            return Some(facet);
        }
        if !facet_type.is_inherited() {
            return None;
        }
        self.ancestors()
            .into_iter()
            .find_map(|ancestor| ancestor.get_local_facet(facet_type))
    }

    pub fn get_local_facet(&self, facet_type: FacetType) -> Option<Facet> {
        self.facets.read().get_facet(facet_type).cloned()
    }

    pub fn contains_facet(&self, facet_type: FacetType) -> bool {
        self.get_facet(facet_type).is_some()
    }

    /// Local facets only
    pub fn local_facets(&self) -> FacetHolder {
        self.facets.read().clone()
    }

    /// Local facets merged with those inherited from supertypes
    pub fn effective_facets(&self) -> FacetHolder {
        let mut holder = self.local_facets();
        for ancestor in self.ancestors() {
            for facet in ancestor.facets.read().facets() {
                if facet.facet_type().is_inherited() && !holder.contains_facet(facet.facet_type()) {
                    holder.inherit(facet.clone());
                }
            }
        }
        holder
    }

    /// Direct supertypes: superclass first, then interfaces
    pub fn supertypes(&self) -> Vec<Arc<ObjectSpecification>> {
        self.supertypes
            .get()
            .map(|weak| weak.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    pub fn superclass(&self) -> Option<Arc<ObjectSpecification>> {
        let superclass = self.descriptor.superclass.as_ref()?;
        self.supertypes()
            .into_iter()
            .find(|s| s.logical_type() == superclass)
    }

    pub fn interfaces(&self) -> Vec<Arc<ObjectSpecification>> {
        self.supertypes()
            .into_iter()
            .filter(|s| self.descriptor.interfaces.contains(s.logical_type()))
            .collect()
    }

    /// Every transitive supertype, breadth-first, each once
    pub fn ancestors(&self) -> Vec<Arc<ObjectSpecification>> {
        let mut visited: HashSet<LogicalType> = HashSet::new();
        visited.insert(self.logical_type().clone());
        let mut queue: VecDeque<Arc<ObjectSpecification>> = self.supertypes().into();
        let mut ancestors = Vec::new();
        while let Some(spec) = queue.pop_front() {
            if !visited.insert(spec.logical_type().clone()) {
                continue;
            }
            queue.extend(spec.supertypes());
            ancestors.push(spec);
        }
        ancestors
    }

    /// Whether `other` is this type or one of its ancestors
    pub fn is_of_type(&self, other: &LogicalType) -> bool {
        self.logical_type() == other || self.ancestors().iter().any(|a| a.logical_type() == other)
    }

    /// Members in display order; empty until fully introspected
    pub fn members(&self) -> &[Arc<ObjectMember>] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member(&self, id: &str) -> Option<&Arc<ObjectMember>> {
        self.members().iter().find(|m| m.id() == id)
    }

    pub fn members_of_kind(&self, kind: MemberKind) -> impl Iterator<Item = &Arc<ObjectMember>> {
        self.members().iter().filter(move |m| m.kind() == kind)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Arc<ObjectMember>> {
        self.members_of_kind(MemberKind::Property)
    }

    pub fn collections(&self) -> impl Iterator<Item = &Arc<ObjectMember>> {
        self.members_of_kind(MemberKind::Collection)
    }

    pub fn actions(&self) -> impl Iterator<Item = &Arc<ObjectMember>> {
        self.members_of_kind(MemberKind::Action)
    }

    pub(crate) fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub(crate) fn set_in_progress(&self, in_progress: bool) {
        self.in_progress.store(in_progress, Ordering::Release);
    }

    pub(crate) fn set_state(&self, state: IntrospectionState) {
        *self.state.write() = state;
    }

    pub(crate) fn replace_facets(&self, facets: FacetHolder) {
        *self.facets.write() = facets;
    }

    pub(crate) fn set_supertypes(&self, supertypes: Vec<Weak<ObjectSpecification>>) {
        // a retried introspection keeps the first resolution
        let _ = self.supertypes.set(supertypes);
    }

    pub(crate) fn set_members(&self, members: Vec<Arc<ObjectMember>>) {
        let _ = self.members.set(members);
    }

    pub(crate) fn mark_rejected(&self) {
        self.rejected.store(true, Ordering::Release);
    }
}

impl fmt::Debug for ObjectSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSpecification")
            .field("logical_type", self.logical_type())
            .field("kind", &self.kind())
            .field("state", &self.state())
            .field(
                "supertypes",
                &self
                    .supertypes()
                    .iter()
                    .map(|s| s.logical_type().clone())
                    .collect::<Vec<_>>(),
            )
            .field(
                "members",
                &self.members().iter().map(|m| m.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
