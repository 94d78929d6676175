//! The programming model - the ordered registry of facet factories
//!
//! Extension modules register factories into named phases through a
//! [`ProgrammingModelBuilder`]. Registration checks each factory's
//! declarations up front, so a malformed factory fails at bootstrap rather
//! than during introspection. Building closes the registry: the resulting
//! [`ProgrammingModel`] is immutable and can be shared across threads
//! without locking.

use crate::config::ProgrammingModelConfig;
use crate::facet::FacetType;
use crate::factories;
use crate::factory::{FacetFactory, FactoryMarker, ProcessingPhase};
use crate::validation::{self, MetaModelValidator};
use facetry_types::FeatureType;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgrammingModelError {
    #[error("factory id must not be empty")]
    EmptyId,

    #[error("factory '{0}' is already registered")]
    DuplicateFactory(String),

    #[error("validator '{0}' is already registered")]
    DuplicateValidator(String),

    #[error("factory '{0}' declares no feature types")]
    NoFeatureTypes(String),

    #[error("factory '{0}' declares no facet types")]
    NoFacetTypes(String),

    #[error("factory '{factory}' declares malformed facet type '{facet_type}'")]
    MalformedFacetType {
        factory: String,
        facet_type: FacetType,
    },

    #[error("factory '{factory}' declares facet type '{facet_type}' twice")]
    DuplicateFacetType {
        factory: String,
        facet_type: FacetType,
    },
}

/// A factory together with its placement in the model
#[derive(Clone)]
pub struct RegisteredFactory {
    phase: ProcessingPhase,
    marker: FactoryMarker,
    factory: Arc<dyn FacetFactory>,
}

impl RegisteredFactory {
    pub fn phase(&self) -> ProcessingPhase {
        self.phase
    }

    pub fn marker(&self) -> FactoryMarker {
        self.marker
    }

    pub fn id(&self) -> &'static str {
        self.factory.id()
    }

    pub fn factory(&self) -> &dyn FacetFactory {
        self.factory.as_ref()
    }

    pub fn applies_to(&self, feature_type: FeatureType) -> bool {
        self.factory.feature_types().contains(&feature_type)
    }
}

impl fmt::Debug for RegisteredFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFactory")
            .field("id", &self.id())
            .field("phase", &self.phase)
            .field("marker", &self.marker)
            .finish()
    }
}

/// Collects factories and validators before the model is closed
#[derive(Default)]
pub struct ProgrammingModelBuilder {
    factories: Vec<RegisteredFactory>,
    validators: Vec<Arc<dyn MetaModelValidator>>,
}

impl ProgrammingModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the built-in factories and validators
    pub fn with_builtins() -> Self {
        let mut builder = Self::new();
        factories::register_builtins(&mut builder);
        validation::register_builtins(&mut builder);
        builder
    }

    /// Register an extension factory into `phase`
    pub fn add_factory<F: FacetFactory>(
        &mut self,
        phase: ProcessingPhase,
        factory: F,
    ) -> Result<&mut Self, ProgrammingModelError> {
        self.add_factory_with_marker(phase, FactoryMarker::Extension, factory)
    }

    pub fn add_factory_with_marker<F: FacetFactory>(
        &mut self,
        phase: ProcessingPhase,
        marker: FactoryMarker,
        factory: F,
    ) -> Result<&mut Self, ProgrammingModelError> {
        check_declarations(&factory)?;
        if self.contains_factory(factory.id()) {
            return Err(ProgrammingModelError::DuplicateFactory(factory.id().to_string()));
        }
        self.factories.push(RegisteredFactory {
            phase,
            marker,
            factory: Arc::new(factory),
        });
        Ok(self)
    }

    pub fn add_validator<V: MetaModelValidator>(
        &mut self,
        validator: V,
    ) -> Result<&mut Self, ProgrammingModelError> {
        if self.validators.iter().any(|v| v.id() == validator.id()) {
            return Err(ProgrammingModelError::DuplicateValidator(validator.id().to_string()));
        }
        self.validators.push(Arc::new(validator));
        Ok(self)
    }

    /// Remove a previously registered factory; returns whether it was present
    pub fn remove_factory(&mut self, id: &str) -> bool {
        let before = self.factories.len();
        self.factories.retain(|f| f.id() != id);
        before != self.factories.len()
    }

    pub fn contains_factory(&self, id: &str) -> bool {
        self.factories.iter().any(|f| f.id() == id)
    }

    /// Close the registry, applying the marker and exclusion filters
    pub fn build(self, config: &ProgrammingModelConfig) -> ProgrammingModel {
        let excluded: HashSet<&str> = config.exclude.iter().map(String::as_str).collect();
        let mut factories: Vec<RegisteredFactory> = self
            .factories
            .into_iter()
            .filter(|f| match f.marker {
                FactoryMarker::Deprecated => !config.ignore_deprecated,
                FactoryMarker::Incubating => config.include_incubating,
                FactoryMarker::Builtin | FactoryMarker::Extension => true,
            })
            .filter(|f| !excluded.contains(f.id()))
            .collect();

        // stable: registration order is kept within a phase
        factories.sort_by_key(|f| f.phase);

        let mut by_feature: HashMap<FeatureType, Vec<usize>> = HashMap::new();
        for (index, registered) in factories.iter().enumerate() {
            for feature_type in registered.factory.feature_types() {
                by_feature.entry(*feature_type).or_default().push(index);
            }
        }

        tracing::debug!(
            factories = factories.len(),
            validators = self.validators.len(),
            "programming model closed"
        );

        ProgrammingModel {
            factories,
            by_feature,
            validators: self.validators,
        }
    }
}

fn check_declarations(factory: &dyn FacetFactory) -> Result<(), ProgrammingModelError> {
    let id = factory.id();
    if id.is_empty() {
        return Err(ProgrammingModelError::EmptyId);
    }
    if factory.feature_types().is_empty() {
        return Err(ProgrammingModelError::NoFeatureTypes(id.to_string()));
    }
    let facet_types = factory.facet_types();
    if facet_types.is_empty() {
        return Err(ProgrammingModelError::NoFacetTypes(id.to_string()));
    }
    let mut seen = HashSet::new();
    for facet_type in facet_types {
        if !facet_type.is_well_formed() {
            return Err(ProgrammingModelError::MalformedFacetType {
                factory: id.to_string(),
                facet_type: *facet_type,
            });
        }
        if !seen.insert(*facet_type) {
            return Err(ProgrammingModelError::DuplicateFacetType {
                factory: id.to_string(),
                facet_type: *facet_type,
            });
        }
    }
    Ok(())
}

/// The closed, immutable set of factories and validators
pub struct ProgrammingModel {
    factories: Vec<RegisteredFactory>,
    by_feature: HashMap<FeatureType, Vec<usize>>,
    validators: Vec<Arc<dyn MetaModelValidator>>,
}

impl ProgrammingModel {
    /// The built-in model with default filtering
    pub fn builtin() -> Self {
        ProgrammingModelBuilder::with_builtins().build(&ProgrammingModelConfig::default())
    }

    /// All factories in execution order
    pub fn factories(&self) -> &[RegisteredFactory] {
        &self.factories
    }

    /// Factories applying to `feature_type`, in execution order
    pub fn factories_for(
        &self,
        feature_type: FeatureType,
    ) -> impl Iterator<Item = &RegisteredFactory> + '_ {
        self.by_feature
            .get(&feature_type)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |i| &self.factories[*i])
    }

    pub fn factories_in(
        &self,
        phase: ProcessingPhase,
    ) -> impl Iterator<Item = &RegisteredFactory> + '_ {
        self.factories.iter().filter(move |f| f.phase == phase)
    }

    pub fn validators(&self) -> &[Arc<dyn MetaModelValidator>] {
        &self.validators
    }

    pub fn contains_factory(&self, id: &str) -> bool {
        self.factories.iter().any(|f| f.id() == id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ProgrammingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgrammingModel")
            .field("factories", &self.factories)
            .field(
                "validators",
                &self.validators.iter().map(|v| v.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
