//! Facet factories
//!
//! A [`FacetFactory`] inspects one feature (a type, a member or an action
//! parameter) through a [`ProcessContext`] and may contribute facets to its
//! holder. Factories are grouped into [`ProcessingPhase`]s by the
//! programming model; every factory sees the facets installed by the
//! factories that ran before it.

use crate::descriptor::{MethodDescriptor, ParameterDescriptor, TypeDescriptor};
use crate::facet::{Facet, FacetError, FacetType};
use crate::holder::FacetHolder;
use facetry_types::{FeatureType, Identifier, Marker};
use serde::Serialize;
use std::fmt;

/// Processing phases, run strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingPhase {
    StructuralDefaults,
    AnnotationDriven,
    ConventionDerived,
    CrossCuttingFallback,
    PostValidationRefinement,
}

impl ProcessingPhase {
    pub const ALL: &'static [ProcessingPhase] = &[
        ProcessingPhase::StructuralDefaults,
        ProcessingPhase::AnnotationDriven,
        ProcessingPhase::ConventionDerived,
        ProcessingPhase::CrossCuttingFallback,
        ProcessingPhase::PostValidationRefinement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingPhase::StructuralDefaults => "structural-defaults",
            ProcessingPhase::AnnotationDriven => "annotation-driven",
            ProcessingPhase::ConventionDerived => "convention-derived",
            ProcessingPhase::CrossCuttingFallback => "cross-cutting-fallback",
            ProcessingPhase::PostValidationRefinement => "post-validation-refinement",
        }
    }
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance tag used to filter factories when building a programming model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactoryMarker {
    Builtin,
    Extension,
    Incubating,
    Deprecated,
}

/// Error returned from [`FacetFactory::process`]
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Facet(#[from] FacetError),

    #[error("factory panicked: {0}")]
    Panicked(String),
}

impl FactoryError {
    pub fn failed(message: impl Into<String>) -> Self {
        FactoryError::Failed(message.into())
    }
}

/// Extracts facets from one kind of feature
pub trait FacetFactory: Send + Sync + 'static {
    /// Stable, unique identifier of this factory
    fn id(&self) -> &'static str;

    /// The features this factory is run against
    fn feature_types(&self) -> &'static [FeatureType];

    /// Every facet type this factory may install
    fn facet_types(&self) -> &'static [FacetType];

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError>;
}

/// The feature currently being introspected
#[derive(Debug, Clone, Copy)]
pub enum Feature<'a> {
    Type(&'a TypeDescriptor),
    Member {
        owner: &'a TypeDescriptor,
        method: &'a MethodDescriptor,
        feature_type: FeatureType,
        /// Id of the member, e.g. `firstName` for `getFirstName`
        member_id: &'a str,
    },
    Parameter {
        owner: &'a TypeDescriptor,
        action: &'a MethodDescriptor,
        parameter: &'a ParameterDescriptor,
        index: usize,
    },
}

impl<'a> Feature<'a> {
    pub fn feature_type(&self) -> FeatureType {
        match *self {
            Feature::Type(_) => FeatureType::Object,
            Feature::Member { feature_type, .. } => feature_type,
            Feature::Parameter { .. } => FeatureType::ActionParameter,
        }
    }

    /// The type descriptor that owns this feature
    pub fn owner(&self) -> &'a TypeDescriptor {
        match *self {
            Feature::Type(descriptor) => descriptor,
            Feature::Member { owner, .. } => owner,
            Feature::Parameter { owner, .. } => owner,
        }
    }

    pub fn markers(&self) -> &'a [Marker] {
        match *self {
            Feature::Type(descriptor) => &descriptor.markers,
            Feature::Member { method, .. } => &method.markers,
            Feature::Parameter { parameter, .. } => &parameter.markers,
        }
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.markers().iter().any(|m| m.name() == name)
    }

    /// The name used for derived naming and supporting-method lookup
    pub fn name(&self) -> &'a str {
        match *self {
            Feature::Type(descriptor) => descriptor.logical_type.simple_name(),
            Feature::Member { member_id, .. } => member_id,
            Feature::Parameter { parameter, .. } => &parameter.name,
        }
    }
}

/// What a factory gets to see and touch while processing one feature
pub struct ProcessContext<'a> {
    factory: &'static str,
    declared: &'static [FacetType],
    feature: Feature<'a>,
    holder: &'a mut FacetHolder,
    owner_facets: Option<&'a FacetHolder>,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        factory: &dyn FacetFactory,
        feature: Feature<'a>,
        holder: &'a mut FacetHolder,
        owner_facets: Option<&'a FacetHolder>,
    ) -> Self {
        Self {
            factory: factory.id(),
            declared: factory.facet_types(),
            feature,
            holder,
            owner_facets,
        }
    }

    pub fn feature(&self) -> Feature<'a> {
        self.feature
    }

    pub fn feature_type(&self) -> FeatureType {
        self.feature.feature_type()
    }

    pub fn identifier(&self) -> &Identifier {
        self.holder.identifier()
    }

    /// Facets installed on this feature so far
    pub fn holder(&self) -> &FacetHolder {
        self.holder
    }

    /// Facets of the owning type, for member and parameter features
    pub fn owner_facets(&self) -> Option<&FacetHolder> {
        self.owner_facets
    }

    /// Attach a facet declared by the running factory
    ///
    /// Returns whether the facet became visible; a facet of a type the
    /// factory did not declare is an error.
    pub fn add_facet(&mut self, facet: Facet) -> Result<bool, FacetError> {
        let facet_type = facet.facet_type();
        if !self.declared.contains(&facet_type) {
            return Err(FacetError::Undeclared {
                factory: self.factory,
                facet_type,
            });
        }
        Ok(self.holder.add_facet(facet.contributed(self.factory)))
    }

    /// Attach a facet only if none of that type is present yet
    pub fn add_fallback(&mut self, facet: Facet) -> Result<bool, FacetError> {
        if self.holder.contains_facet(facet.facet_type()) {
            return Ok(false);
        }
        self.add_facet(facet)
    }
}
