//! Structural defaults and cross-cutting fallbacks

use crate::descriptor::humanize;
use crate::facet::{Facet, FacetType};
use crate::factory::{FacetFactory, FactoryError, Feature, ProcessContext};
use crate::precedence::Precedence;
use facetry_types::{ActionSemantics, FeatureType};

/// Names every feature after its identifier: `firstName` becomes `First Name`
pub struct NamedDefaultFactory;

impl FacetFactory for NamedDefaultFactory {
    fn id(&self) -> &'static str {
        "named-default"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::ALL
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::NAMED]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let name = match ctx.feature() {
            // type names are already in display case
            Feature::Type(descriptor) => descriptor.logical_type.simple_name().to_string(),
            feature => humanize(feature.name()),
        };
        ctx.add_facet(Facet::named(name, Precedence::Fallback))?;
        Ok(())
    }
}

/// Abstract types and interfaces cannot be instantiated
pub struct NonInstantiableFactory;

impl FacetFactory for NonInstantiableFactory {
    fn id(&self) -> &'static str {
        "non-instantiable"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Object]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::NON_INSTANTIABLE]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        if let Feature::Type(descriptor) = ctx.feature() {
            if !descriptor.kind.is_instantiable() {
                ctx.add_facet(Facet::non_instantiable(Precedence::Default))?;
            }
        }
        Ok(())
    }
}

/// Properties and parameters are mandatory, collections optional, unless
/// something earlier said otherwise
pub struct MandatoryFallbackFactory;

impl FacetFactory for MandatoryFallbackFactory {
    fn id(&self) -> &'static str {
        "mandatory-fallback"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[
            FeatureType::Property,
            FeatureType::Collection,
            FeatureType::ActionParameter,
        ]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MANDATORY]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let mandatory = ctx.feature_type() != FeatureType::Collection;
        ctx.add_fallback(Facet::mandatory(mandatory, Precedence::Fallback))?;
        Ok(())
    }
}

/// Actions with no declared or inferred semantics are assumed to change state
pub struct ActionSemanticsFallbackFactory;

impl FacetFactory for ActionSemanticsFallbackFactory {
    fn id(&self) -> &'static str {
        "action-semantics-fallback"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Action]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::ACTION_SEMANTICS]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        ctx.add_fallback(Facet::action_semantics(
            ActionSemantics::NonIdempotent,
            Precedence::Fallback,
        ))?;
        Ok(())
    }
}
