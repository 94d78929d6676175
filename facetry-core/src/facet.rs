//! Facets - tagged capabilities attached to metamodel elements
//!
//! A facet pairs a stable tag ([`FacetType`]) with a [`Precedence`] and a
//! payload ([`FacetValue`]). The payload variant determines which tags it
//! may be declared under; constructing a facet whose payload does not fit
//! its tag is rejected.

use crate::precedence::Precedence;
use facetry_types::{ActionSemantics, Identifier};
use serde::Serialize;
use std::fmt;

/// Stable tag identifying one kind of capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FacetType(&'static str);

impl FacetType {
    pub const NAMED: FacetType = FacetType("named");
    pub const DESCRIBED_AS: FacetType = FacetType("described-as");
    pub const MANDATORY: FacetType = FacetType("mandatory");
    pub const DISABLED: FacetType = FacetType("disabled");
    pub const HIDDEN: FacetType = FacetType("hidden");
    pub const IMMUTABLE: FacetType = FacetType("immutable");
    pub const ACTION_SEMANTICS: FacetType = FacetType("action-semantics");
    pub const MEMBER_ORDER: FacetType = FacetType("member-order");
    pub const MAX_LENGTH: FacetType = FacetType("max-length");
    pub const REGEX: FacetType = FacetType("regex");
    pub const CHOICES: FacetType = FacetType("choices");
    pub const DEFAULT: FacetType = FacetType("default");
    pub const VALIDATE: FacetType = FacetType("validate");
    pub const TITLE: FacetType = FacetType("title");
    pub const NON_INSTANTIABLE: FacetType = FacetType("non-instantiable");

    /// A tag for facets contributed by extension modules
    pub const fn custom(tag: &'static str) -> Self {
        FacetType(tag)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Lowercase ascii words separated by single dashes
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && !self.0.starts_with('-')
            && !self.0.ends_with('-')
            && !self.0.contains("--")
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    /// Whether subtypes see this facet when they lack one of their own
    pub fn is_inherited(&self) -> bool {
        *self != FacetType::NON_INSTANTIABLE
    }

    fn is_builtin(&self) -> bool {
        BUILTIN_TAGS.contains(self)
    }
}

impl fmt::Display for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

const BUILTIN_TAGS: &[FacetType] = &[
    FacetType::NAMED,
    FacetType::DESCRIBED_AS,
    FacetType::MANDATORY,
    FacetType::DISABLED,
    FacetType::HIDDEN,
    FacetType::IMMUTABLE,
    FacetType::ACTION_SEMANTICS,
    FacetType::MEMBER_ORDER,
    FacetType::MAX_LENGTH,
    FacetType::REGEX,
    FacetType::CHOICES,
    FacetType::DEFAULT,
    FacetType::VALIDATE,
    FacetType::TITLE,
    FacetType::NON_INSTANTIABLE,
];

/// Tags whose behaviour can be supplied by a supporting method
const METHOD_TAGS: &[FacetType] = &[
    FacetType::HIDDEN,
    FacetType::DISABLED,
    FacetType::CHOICES,
    FacetType::DEFAULT,
    FacetType::VALIDATE,
    FacetType::TITLE,
];

/// Payload of a facet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FacetValue {
    Text(String),
    Flag(bool),
    /// Present without further data
    Marker,
    Reason(Option<String>),
    ActionSemantics(ActionSemantics),
    MemberOrder {
        sequence: String,
        group: Option<String>,
    },
    MaxLength(usize),
    Pattern(String),
    /// Behaviour delegated to a supporting method on the domain type
    Method(String),
    /// Opaque payload of an extension facet
    Custom(serde_json::Value),
}

impl FacetValue {
    fn kind(&self) -> &'static str {
        match self {
            FacetValue::Text(_) => "text",
            FacetValue::Flag(_) => "flag",
            FacetValue::Marker => "marker",
            FacetValue::Reason(_) => "reason",
            FacetValue::ActionSemantics(_) => "action_semantics",
            FacetValue::MemberOrder { .. } => "member_order",
            FacetValue::MaxLength(_) => "max_length",
            FacetValue::Pattern(_) => "pattern",
            FacetValue::Method(_) => "method",
            FacetValue::Custom(_) => "custom",
        }
    }

    /// Whether this payload may be declared under `tag`
    pub fn fits(&self, tag: FacetType) -> bool {
        match self {
            FacetValue::Text(_) => tag == FacetType::NAMED || tag == FacetType::DESCRIBED_AS,
            FacetValue::Flag(_) => tag == FacetType::MANDATORY,
            FacetValue::Marker => tag == FacetType::HIDDEN || tag == FacetType::NON_INSTANTIABLE,
            FacetValue::Reason(_) => tag == FacetType::DISABLED || tag == FacetType::IMMUTABLE,
            FacetValue::ActionSemantics(_) => tag == FacetType::ACTION_SEMANTICS,
            FacetValue::MemberOrder { .. } => tag == FacetType::MEMBER_ORDER,
            FacetValue::MaxLength(_) => tag == FacetType::MAX_LENGTH,
            FacetValue::Pattern(_) => tag == FacetType::REGEX,
            FacetValue::Method(_) => METHOD_TAGS.contains(&tag),
            FacetValue::Custom(_) => !tag.is_builtin(),
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetValue::Text(text) => write!(f, "{:?}", text),
            FacetValue::Flag(flag) => write!(f, "{}", flag),
            FacetValue::Marker => write!(f, "present"),
            FacetValue::Reason(Some(reason)) => write!(f, "{:?}", reason),
            FacetValue::Reason(None) => write!(f, "present"),
            FacetValue::ActionSemantics(semantics) => write!(f, "{}", semantics),
            FacetValue::MemberOrder {
                sequence,
                group: Some(group),
            } => write!(f, "{} in {}", sequence, group),
            FacetValue::MemberOrder { sequence, .. } => write!(f, "{}", sequence),
            FacetValue::MaxLength(len) => write!(f, "{}", len),
            FacetValue::Pattern(pattern) => write!(f, "/{}/", pattern),
            FacetValue::Method(method) => write!(f, "via {}()", method),
            FacetValue::Custom(value) => write!(f, "{}", value),
        }
    }
}

/// Errors constructing or attaching facets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FacetError {
    #[error("facet payload '{value_kind}' cannot be declared as '{declared}'")]
    TagMismatch {
        declared: FacetType,
        value_kind: &'static str,
    },

    #[error("factory '{factory}' does not declare facet type '{facet_type}'")]
    Undeclared {
        factory: &'static str,
        facet_type: FacetType,
    },

    #[error("malformed facet type '{0}'")]
    MalformedType(FacetType),
}

/// A single capability attached to a facet holder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    facet_type: FacetType,
    precedence: Precedence,
    value: FacetValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    holder: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contributed_by: Option<&'static str>,
}

impl Facet {
    /// Create a facet, checking that the payload fits the tag
    pub fn new(
        facet_type: FacetType,
        precedence: Precedence,
        value: FacetValue,
    ) -> Result<Self, FacetError> {
        if !facet_type.is_well_formed() {
            return Err(FacetError::MalformedType(facet_type));
        }
        if !value.fits(facet_type) {
            return Err(FacetError::TagMismatch {
                declared: facet_type,
                value_kind: value.kind(),
            });
        }
        Ok(Self::unchecked(facet_type, precedence, value))
    }

    fn unchecked(facet_type: FacetType, precedence: Precedence, value: FacetValue) -> Self {
        Self {
            facet_type,
            precedence,
            value,
            holder: None,
            contributed_by: None,
        }
    }

    pub fn named(name: impl Into<String>, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::NAMED, precedence, FacetValue::Text(name.into()))
    }

    pub fn described_as(text: impl Into<String>, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::DESCRIBED_AS, precedence, FacetValue::Text(text.into()))
    }

    pub fn mandatory(mandatory: bool, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::MANDATORY, precedence, FacetValue::Flag(mandatory))
    }

    pub fn disabled(reason: Option<String>, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::DISABLED, precedence, FacetValue::Reason(reason))
    }

    pub fn hidden(precedence: Precedence) -> Self {
        Self::unchecked(FacetType::HIDDEN, precedence, FacetValue::Marker)
    }

    pub fn immutable(reason: Option<String>, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::IMMUTABLE, precedence, FacetValue::Reason(reason))
    }

    pub fn action_semantics(semantics: ActionSemantics, precedence: Precedence) -> Self {
        Self::unchecked(
            FacetType::ACTION_SEMANTICS,
            precedence,
            FacetValue::ActionSemantics(semantics),
        )
    }

    pub fn member_order(
        sequence: impl Into<String>,
        group: Option<String>,
        precedence: Precedence,
    ) -> Self {
        Self::unchecked(
            FacetType::MEMBER_ORDER,
            precedence,
            FacetValue::MemberOrder {
                sequence: sequence.into(),
                group,
            },
        )
    }

    pub fn max_length(len: usize, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::MAX_LENGTH, precedence, FacetValue::MaxLength(len))
    }

    pub fn regex(pattern: impl Into<String>, precedence: Precedence) -> Self {
        Self::unchecked(FacetType::REGEX, precedence, FacetValue::Pattern(pattern.into()))
    }

    pub fn non_instantiable(precedence: Precedence) -> Self {
        Self::unchecked(FacetType::NON_INSTANTIABLE, precedence, FacetValue::Marker)
    }

    /// A facet whose behaviour is supplied by a supporting method
    pub fn via_method(
        facet_type: FacetType,
        method: impl Into<String>,
        precedence: Precedence,
    ) -> Result<Self, FacetError> {
        Self::new(facet_type, precedence, FacetValue::Method(method.into()))
    }

    pub fn facet_type(&self) -> FacetType {
        self.facet_type
    }

    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    pub fn value(&self) -> &FacetValue {
        &self.value
    }

    /// The holder this facet was attached to, if any
    pub fn holder(&self) -> Option<&Identifier> {
        self.holder.as_ref()
    }

    /// Id of the factory that contributed this facet
    pub fn contributed_by(&self) -> Option<&'static str> {
        self.contributed_by
    }

    /// The flag of a `mandatory` facet
    pub fn as_flag(&self) -> Option<bool> {
        match self.value {
            FacetValue::Flag(flag) => Some(flag),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FacetValue::Text(text) => Some(text),
            FacetValue::Pattern(text) => Some(text),
            FacetValue::Method(text) => Some(text),
            FacetValue::Reason(reason) => reason.as_deref(),
            _ => None,
        }
    }

    pub fn as_action_semantics(&self) -> Option<ActionSemantics> {
        match self.value {
            FacetValue::ActionSemantics(semantics) => Some(semantics),
            _ => None,
        }
    }

    pub(crate) fn attach(&mut self, holder: &Identifier) {
        self.holder = Some(holder.clone());
    }

    pub(crate) fn contributed(mut self, factory: &'static str) -> Self {
        self.contributed_by = Some(factory);
        self
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} [{}]", self.facet_type, self.value, self.precedence)
    }
}
