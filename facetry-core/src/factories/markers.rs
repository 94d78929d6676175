//! Factories driven by explicit markers
//!
//! Each factory turns one kind of [`Marker`] into its facet at
//! [`Precedence::Default`]. Explicit markers therefore win over inferred
//! and fallback facets but can still be overridden by a high-precedence
//! convention.

use crate::facet::{Facet, FacetType};
use crate::factory::{FacetFactory, FactoryError, ProcessContext};
use crate::precedence::Precedence;
use facetry_types::{FeatureType, Marker};

/// The first marker on the current feature `pick` accepts
fn first_marker<T>(ctx: &ProcessContext<'_>, pick: impl Fn(&Marker) -> Option<T>) -> Option<T> {
    ctx.feature().markers().iter().find_map(pick)
}

pub struct NamedMarkerFactory;

impl FacetFactory for NamedMarkerFactory {
    fn id(&self) -> &'static str {
        "named-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::ALL
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::NAMED]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let name = first_marker(ctx, |m| match m {
            Marker::Named(name) => Some(name.clone()),
            _ => None,
        });
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(FactoryError::failed("named marker with an empty name"));
            }
            ctx.add_facet(Facet::named(name, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct DescribedAsMarkerFactory;

impl FacetFactory for DescribedAsMarkerFactory {
    fn id(&self) -> &'static str {
        "described-as-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::ALL
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::DESCRIBED_AS]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let text = first_marker(ctx, |m| match m {
            Marker::DescribedAs(text) => Some(text.clone()),
            _ => None,
        });
        if let Some(text) = text {
            ctx.add_facet(Facet::described_as(text, Precedence::Default))?;
        }
        Ok(())
    }
}

/// `Mandatory` and `Optional` markers
pub struct MandatoryMarkerFactory;

impl FacetFactory for MandatoryMarkerFactory {
    fn id(&self) -> &'static str {
        "mandatory-marker"
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
        let mandatory = first_marker(ctx, |m| match m {
            Marker::Mandatory => Some(true),
            Marker::Optional => Some(false),
            _ => None,
        });
        if let Some(mandatory) = mandatory {
            ctx.add_facet(Facet::mandatory(mandatory, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct DisabledMarkerFactory;

impl FacetFactory for DisabledMarkerFactory {
    fn id(&self) -> &'static str {
        "disabled-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::MEMBERS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::DISABLED]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let reason = first_marker(ctx, |m| match m {
            Marker::Disabled(reason) => Some(reason.clone()),
            _ => None,
        });
        if let Some(reason) = reason {
            ctx.add_facet(Facet::disabled(reason, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct HiddenMarkerFactory;

impl FacetFactory for HiddenMarkerFactory {
    fn id(&self) -> &'static str {
        "hidden-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[
            FeatureType::Object,
            FeatureType::Property,
            FeatureType::Collection,
            FeatureType::Action,
        ]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::HIDDEN]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        if ctx.feature().has_marker("hidden") {
            ctx.add_facet(Facet::hidden(Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct ImmutableMarkerFactory;

impl FacetFactory for ImmutableMarkerFactory {
    fn id(&self) -> &'static str {
        "immutable-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Object]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::IMMUTABLE]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let reason = first_marker(ctx, |m| match m {
            Marker::Immutable(reason) => Some(reason.clone()),
            _ => None,
        });
        if let Some(reason) = reason {
            ctx.add_facet(Facet::immutable(reason, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct MemberOrderMarkerFactory;

impl FacetFactory for MemberOrderMarkerFactory {
    fn id(&self) -> &'static str {
        "member-order-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::MEMBERS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MEMBER_ORDER]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let order = first_marker(ctx, |m| match m {
            Marker::MemberOrder { sequence, group } => Some((sequence.clone(), group.clone())),
            _ => None,
        });
        if let Some((sequence, group)) = order {
            let well_formed = !sequence.is_empty()
                && sequence
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
            if !well_formed {
                return Err(FactoryError::failed(format!(
                    "member order sequence '{}' is not dotted-decimal",
                    sequence
                )));
            }
            ctx.add_facet(Facet::member_order(sequence, group, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct MaxLengthMarkerFactory;

impl FacetFactory for MaxLengthMarkerFactory {
    fn id(&self) -> &'static str {
        "max-length-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::PROPERTIES_AND_PARAMETERS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MAX_LENGTH]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let len = first_marker(ctx, |m| match m {
            Marker::MaxLength(len) => Some(*len),
            _ => None,
        });
        if let Some(len) = len {
            if len == 0 {
                return Err(FactoryError::failed("max length must be positive"));
            }
            ctx.add_facet(Facet::max_length(len, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct RegExMarkerFactory;

impl FacetFactory for RegExMarkerFactory {
    fn id(&self) -> &'static str {
        "regex-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::PROPERTIES_AND_PARAMETERS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::REGEX]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let pattern = first_marker(ctx, |m| match m {
            Marker::RegEx(pattern) => Some(pattern.clone()),
            _ => None,
        });
        if let Some(pattern) = pattern {
            regex::Regex::new(&pattern)
                .map_err(|e| FactoryError::failed(format!("invalid pattern: {}", e)))?;
            ctx.add_facet(Facet::regex(pattern, Precedence::Default))?;
        }
        Ok(())
    }
}

pub struct ActionSemanticsMarkerFactory;

impl FacetFactory for ActionSemanticsMarkerFactory {
    fn id(&self) -> &'static str {
        "action-semantics-marker"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Action]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::ACTION_SEMANTICS]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let semantics = first_marker(ctx, |m| match m {
            Marker::ActionSemantics(semantics) => Some(*semantics),
            _ => None,
        });
        if let Some(semantics) = semantics {
            ctx.add_facet(Facet::action_semantics(semantics, Precedence::Default))?;
        }
        Ok(())
    }
}
