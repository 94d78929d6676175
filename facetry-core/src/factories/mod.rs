//! Built-in facet factories
//!
//! - [`defaults`]: structural defaults and cross-cutting fallbacks
//! - [`markers`]: one factory per explicit marker
//! - [`conventions`]: facets derived from types, names and supporting
//!   methods, plus refinements derived from already-installed facets

pub mod conventions;
pub mod defaults;
pub mod markers;

use crate::factory::{FacetFactory, FactoryMarker, ProcessingPhase};
use crate::programming_model::ProgrammingModelBuilder;

fn register<F: FacetFactory>(builder: &mut ProgrammingModelBuilder, phase: ProcessingPhase, factory: F) {
    let id = factory.id();
    if let Err(err) = builder.add_factory_with_marker(phase, FactoryMarker::Builtin, factory) {
        tracing::warn!(factory = id, error = %err, "built-in factory not registered");
    }
}

/// Register every built-in factory into its phase
pub fn register_builtins(builder: &mut ProgrammingModelBuilder) {
    use ProcessingPhase::*;

    register(builder, StructuralDefaults, defaults::NamedDefaultFactory);
    register(builder, StructuralDefaults, defaults::NonInstantiableFactory);

    register(builder, AnnotationDriven, markers::NamedMarkerFactory);
    register(builder, AnnotationDriven, markers::DescribedAsMarkerFactory);
    register(builder, AnnotationDriven, markers::MandatoryMarkerFactory);
    register(builder, AnnotationDriven, markers::DisabledMarkerFactory);
    register(builder, AnnotationDriven, markers::HiddenMarkerFactory);
    register(builder, AnnotationDriven, markers::ImmutableMarkerFactory);
    register(builder, AnnotationDriven, markers::MemberOrderMarkerFactory);
    register(builder, AnnotationDriven, markers::MaxLengthMarkerFactory);
    register(builder, AnnotationDriven, markers::RegExMarkerFactory);
    register(builder, AnnotationDriven, markers::ActionSemanticsMarkerFactory);

    register(builder, ConventionDerived, conventions::OptionalWrapperFactory);
    register(builder, ConventionDerived, conventions::PrimitiveMandatoryFactory);
    register(builder, ConventionDerived, conventions::SupportingMethodsFactory);
    register(builder, ConventionDerived, conventions::ActionSemanticsNamingFactory);
    register(builder, ConventionDerived, conventions::TitleMethodFactory);

    register(builder, CrossCuttingFallback, defaults::MandatoryFallbackFactory);
    register(builder, CrossCuttingFallback, defaults::ActionSemanticsFallbackFactory);

    register(builder, PostValidationRefinement, conventions::ImmutableDisablesMembersFactory);
}
