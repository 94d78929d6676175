//! Facets derived from declared types, naming conventions and supporting
//! methods, and refinements of facets installed by earlier phases

use crate::descriptor::TypeDescriptor;
use crate::discovery::{parameter_supporting_method_name, supporting_method_name};
use crate::facet::{Facet, FacetType};
use crate::factory::{FacetFactory, FactoryError, Feature, ProcessContext};
use crate::precedence::Precedence;
use facetry_types::{ActionSemantics, FeatureType, TypeRef};

fn declared_type<'a>(feature: &Feature<'a>) -> Option<&'a TypeRef> {
    match *feature {
        Feature::Type(_) => None,
        Feature::Member { method, .. } => Some(&method.returns),
        Feature::Parameter { parameter, .. } => Some(&parameter.type_ref),
    }
}

/// A wrapper-typed property explicitly marked optional is not mandatory,
/// whatever else says so
pub struct OptionalWrapperFactory;

impl FacetFactory for OptionalWrapperFactory {
    fn id(&self) -> &'static str {
        "optional-wrapper"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::PROPERTIES_AND_PARAMETERS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MANDATORY]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let feature = ctx.feature();
        let is_wrapper = declared_type(&feature).is_some_and(TypeRef::is_wrapper);
        if is_wrapper && feature.has_marker("optional") {
            ctx.add_facet(Facet::mandatory(false, Precedence::High))?;
        }
        Ok(())
    }
}

/// Primitives can never be absent
pub struct PrimitiveMandatoryFactory;

impl FacetFactory for PrimitiveMandatoryFactory {
    fn id(&self) -> &'static str {
        "primitive-mandatory"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::PROPERTIES_AND_PARAMETERS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::MANDATORY]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        if declared_type(&ctx.feature()).is_some_and(TypeRef::is_primitive) {
            ctx.add_facet(Facet::mandatory(true, Precedence::Inferred))?;
        }
        Ok(())
    }
}

/// Members backed by `hideX`, `disableX`, `validateX`, `defaultX`,
/// `choicesX` or `autoCompleteX`; parameters by `choices0X` and friends
pub struct SupportingMethodsFactory;

const MEMBER_SUPPORT: &[(&str, FacetType)] = &[
    ("hide", FacetType::HIDDEN),
    ("disable", FacetType::DISABLED),
    ("validate", FacetType::VALIDATE),
    ("default", FacetType::DEFAULT),
    ("choices", FacetType::CHOICES),
    ("autoComplete", FacetType::CHOICES),
];

const PARAMETER_SUPPORT: &[(&str, FacetType)] = &[
    ("validate", FacetType::VALIDATE),
    ("default", FacetType::DEFAULT),
    ("choices", FacetType::CHOICES),
    ("autoComplete", FacetType::CHOICES),
];

impl SupportingMethodsFactory {
    fn install(
        ctx: &mut ProcessContext<'_>,
        owner: &TypeDescriptor,
        support: &[(&str, FacetType)],
        method_name: impl Fn(&str) -> String,
    ) -> Result<(), FactoryError> {
        for (prefix, facet_type) in support {
            let name = method_name(prefix);
            if owner.find_method(&name).is_none() {
                continue;
            }
            if ctx.holder().contains_facet(*facet_type)
                && *facet_type == FacetType::CHOICES
            {
                // choices already supplied by the preferred prefix
                continue;
            }
            ctx.add_facet(Facet::via_method(*facet_type, name, Precedence::Default)?)?;
        }
        Ok(())
    }
}

impl FacetFactory for SupportingMethodsFactory {
    fn id(&self) -> &'static str {
        "supporting-methods"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[
            FeatureType::Property,
            FeatureType::Collection,
            FeatureType::Action,
            FeatureType::ActionParameter,
        ]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[
            FacetType::HIDDEN,
            FacetType::DISABLED,
            FacetType::VALIDATE,
            FacetType::DEFAULT,
            FacetType::CHOICES,
        ]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        match ctx.feature() {
            Feature::Type(_) => Ok(()),
            Feature::Member {
                owner, member_id, ..
            } => {
                let support = match ctx.feature_type() {
                    // default and choices only make sense for a single value
                    FeatureType::Property => MEMBER_SUPPORT,
                    _ => &MEMBER_SUPPORT[..3],
                };
                Self::install(ctx, owner, support, |prefix| {
                    supporting_method_name(prefix, member_id)
                })
            }
            Feature::Parameter {
                owner,
                action,
                index,
                ..
            } => Self::install(ctx, owner, PARAMETER_SUPPORT, |prefix| {
                parameter_supporting_method_name(prefix, index, &action.name)
            }),
        }
    }
}

/// Actions whose names say they only read are safe
pub struct ActionSemanticsNamingFactory;

const SAFE_PREFIXES: &[&str] = &["find", "list", "get", "search"];

impl FacetFactory for ActionSemanticsNamingFactory {
    fn id(&self) -> &'static str {
        "action-semantics-naming"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Action]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::ACTION_SEMANTICS]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let name = ctx.feature().name();
        let safe = SAFE_PREFIXES.iter().any(|prefix| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.chars().next())
                .is_some_and(char::is_uppercase)
        });
        if safe {
            ctx.add_facet(Facet::action_semantics(ActionSemantics::Safe, Precedence::Inferred))?;
        }
        Ok(())
    }
}

/// Types with a `title()` method are titled by it
pub struct TitleMethodFactory;

impl FacetFactory for TitleMethodFactory {
    fn id(&self) -> &'static str {
        "title-method"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Object]
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::TITLE]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        if let Feature::Type(descriptor) = ctx.feature() {
            if let Some(method) = descriptor.find_method("title") {
                if !method.parameters.is_empty() || method.returns.is_void() {
                    return Err(FactoryError::failed(
                        "title() must take no parameters and return a value",
                    ));
                }
                ctx.add_facet(Facet::via_method(FacetType::TITLE, "title", Precedence::Default)?)?;
            }
        }
        Ok(())
    }
}

/// Associations of an immutable object are disabled
pub struct ImmutableDisablesMembersFactory;

impl FacetFactory for ImmutableDisablesMembersFactory {
    fn id(&self) -> &'static str {
        "immutable-disables-members"
    }

    fn feature_types(&self) -> &'static [FeatureType] {
        FeatureType::ASSOCIATIONS
    }

    fn facet_types(&self) -> &'static [FacetType] {
        &[FacetType::DISABLED]
    }

    fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), FactoryError> {
        let reason = ctx
            .owner_facets()
            .and_then(|owner| owner.get_facet(FacetType::IMMUTABLE))
            .map(|immutable| {
                immutable
                    .as_text()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Object is immutable".to_string())
            });
        if let Some(reason) = reason {
            ctx.add_facet(Facet::disabled(Some(reason), Precedence::Inferred))?;
        }
        Ok(())
    }
}
