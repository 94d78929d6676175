//! Facetry metamodel engine
//!
//! This crate derives a runtime metamodel from typed descriptions of domain
//! types. Each type is introspected once into an [`ObjectSpecification`]
//! carrying **facets** - small tagged capabilities such as "mandatory",
//! "disabled" or "action-semantics" - and a list of [`ObjectMember`]s
//! (properties, collections, actions) carrying facets of their own.
//!
//! # Architecture
//!
//! ```text
//! DescriptorSource ─┐
//!                   ├─> SpecificationLoader ──> ObjectSpecification ──> ObjectMember
//! ProgrammingModel ─┘        (cache)               (FacetHolder)         (FacetHolder)
//! ```
//!
//! - **Facets and holders**: a holder keeps at most one facet per tag; a
//!   newcomer replaces the held facet unless its [`Precedence`] is lower.
//! - **Factories**: [`FacetFactory`] implementations inspect one feature and
//!   contribute facets. They are grouped into [`ProcessingPhase`]s.
//! - **Programming model**: the closed, ordered registry of factories and
//!   validators, assembled once through a [`ProgrammingModelBuilder`].
//! - **Loader**: caches specifications, guards against cyclic type graphs
//!   and serializes concurrent first use.
//!
//! # Example
//!
//! ```rust,ignore
//! use facetry_core::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = DescriptorRegistry::new().with(
//!     TypeDescriptor::new("Node")
//!         .method(MethodDescriptor::getter("parent", "Node".parse()?))
//!         .method(MethodDescriptor::getter("children", "list:Node".parse()?)),
//! );
//! let loader = SpecificationLoader::with_builtins(Arc::new(registry), MetamodelConfig::default());
//!
//! let node = loader.load_specification(&LogicalType::new("Node"))?;
//! assert_eq!(node.members().len(), 2);
//! ```

pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod facet;
pub mod factories;
pub mod factory;
pub mod holder;
pub mod loader;
pub mod member;
pub mod metrics;
pub mod precedence;
pub mod programming_model;
pub mod specification;
pub mod validation;

pub use config::{ConfigError, IntrospectionMode, MetamodelConfig};
pub use descriptor::{
    DescriptorError, DescriptorRegistry, DescriptorSource, DomainDescription, MethodDescriptor,
    ParameterDescriptor, TypeDescriptor, TypeKind,
};
pub use error::{DeploymentError, MetamodelError, Result};
pub use facet::{Facet, FacetError, FacetType, FacetValue};
pub use factory::{FacetFactory, FactoryError, FactoryMarker, Feature, ProcessContext, ProcessingPhase};
pub use holder::FacetHolder;
pub use loader::{BootstrapSummary, SpecificationLoader};
pub use member::{ActionParameter, MemberKind, ObjectMember};
pub use metrics::{LoaderMetrics, MetricsSnapshot};
pub use precedence::Precedence;
pub use programming_model::{
    ProgrammingModel, ProgrammingModelBuilder, ProgrammingModelError, RegisteredFactory,
};
pub use specification::{IntrospectionState, ObjectSpecification};
pub use validation::{
    IntrospectionFailure, IntrospectionFailureKind, MetaModelValidator, ValidationFailure,
    ValidationReport,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::MetamodelConfig;
    pub use crate::descriptor::{
        DescriptorRegistry, DescriptorSource, MethodDescriptor, ParameterDescriptor,
        TypeDescriptor, TypeKind,
    };
    pub use crate::facet::{Facet, FacetType};
    pub use crate::factory::{FacetFactory, FactoryError, ProcessContext, ProcessingPhase};
    pub use crate::loader::SpecificationLoader;
    pub use crate::precedence::Precedence;
    pub use crate::programming_model::{ProgrammingModel, ProgrammingModelBuilder};
    pub use crate::specification::{IntrospectionState, ObjectSpecification};
    pub use facetry_types::{FeatureType, Identifier, LogicalType, Marker, TypeRef};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_basic_usage() {
        let loader = SpecificationLoader::with_builtins(
            Arc::new(DescriptorRegistry::new()),
            MetamodelConfig::default(),
        );
        assert!(loader.is_empty());
        assert!(!loader.programming_model().is_empty());
    }
}
