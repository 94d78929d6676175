//! Shared types for facetry
//!
//! This crate provides the value types used across the facetry ecosystem:
//! logical type names, feature types, identifiers of metamodel elements,
//! declared type references and the marker metadata attached to features.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fully-qualified identity of a domain type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalType(pub String);

impl LogicalType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last dotted segment (`com.acme.Customer` -> `Customer`)
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LogicalType {
    fn from(name: &str) -> Self {
        LogicalType(name.to_string())
    }
}

/// The closed set of features a facet factory can apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Object,
    Property,
    Collection,
    Action,
    ActionParameter,
}

impl FeatureType {
    pub const ALL: &'static [FeatureType] = &[
        FeatureType::Object,
        FeatureType::Property,
        FeatureType::Collection,
        FeatureType::Action,
        FeatureType::ActionParameter,
    ];

    /// Properties, collections and actions
    pub const MEMBERS: &'static [FeatureType] = &[
        FeatureType::Property,
        FeatureType::Collection,
        FeatureType::Action,
    ];

    /// Properties and collections
    pub const ASSOCIATIONS: &'static [FeatureType] =
        &[FeatureType::Property, FeatureType::Collection];

    /// Properties and action parameters
    pub const PROPERTIES_AND_PARAMETERS: &'static [FeatureType] =
        &[FeatureType::Property, FeatureType::ActionParameter];

    pub fn is_member(&self) -> bool {
        matches!(
            self,
            FeatureType::Property | FeatureType::Collection | FeatureType::Action
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Object => "object",
            FeatureType::Property => "property",
            FeatureType::Collection => "collection",
            FeatureType::Action => "action",
            FeatureType::ActionParameter => "action-parameter",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one metamodel element: a type, a member of it, or a parameter of an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub logical_type: LogicalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<usize>,
}

impl Identifier {
    pub fn for_type(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            member: None,
            parameter: None,
        }
    }

    pub fn for_member(logical_type: LogicalType, member: impl Into<String>) -> Self {
        Self {
            logical_type,
            member: Some(member.into()),
            parameter: None,
        }
    }

    /// Identifier of the parameter at `index` of this action
    pub fn parameter(&self, index: usize) -> Self {
        Self {
            logical_type: self.logical_type.clone(),
            member: self.member.clone(),
            parameter: Some(index),
        }
    }

    pub fn is_type(&self) -> bool {
        self.member.is_none()
    }

    /// The most specific name: parameter index, member id or simple type name
    pub fn local_name(&self) -> String {
        match (&self.member, self.parameter) {
            (Some(member), Some(index)) => format!("{}[{}]", member, index),
            (Some(member), None) => member.clone(),
            (None, _) => self.logical_type.simple_name().to_string(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_type)?;
        if let Some(member) = &self.member {
            write!(f, "#{}", member)?;
        }
        if let Some(index) = self.parameter {
            write!(f, "({})", index)?;
        }
        Ok(())
    }
}

/// Error parsing a [`TypeRef`] from its textual form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference '{0}'")]
pub struct TypeRefParseError(pub String);

/// The declared type of a method return or a parameter
///
/// Textual form: `void`, `prim:int`, `boxed:int`, `list:Order`, or a bare
/// logical type name for a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Void,
    /// A primitive that can never be absent
    Primitive(LogicalType),
    /// A boxed primitive that may be absent
    Wrapper(LogicalType),
    Reference(LogicalType),
    /// A collection of the given element type
    Collection(LogicalType),
}

impl TypeRef {
    /// The type a member of this shape refers to: the element type for collections
    pub fn element_type(&self) -> Option<&LogicalType> {
        match self {
            TypeRef::Void => None,
            TypeRef::Primitive(t)
            | TypeRef::Wrapper(t)
            | TypeRef::Reference(t)
            | TypeRef::Collection(t) => Some(t),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::Collection(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, TypeRef::Wrapper(_))
    }

    pub fn is_boolean(&self) -> bool {
        match self {
            TypeRef::Primitive(t) | TypeRef::Wrapper(t) => t.as_str() == "bool",
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Primitive(t) => write!(f, "prim:{}", t),
            TypeRef::Wrapper(t) => write!(f, "boxed:{}", t),
            TypeRef::Reference(t) => write!(f, "{}", t),
            TypeRef::Collection(t) => write!(f, "list:{}", t),
        }
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeRefParseError(s.to_string()));
        }
        if s == "void" {
            return Ok(TypeRef::Void);
        }
        let (kind, name) = match s.split_once(':') {
            Some((kind, name)) => (Some(kind), name),
            None => (None, s),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(TypeRefParseError(s.to_string()));
        }
        let t = LogicalType::new(name);
        match kind {
            None => Ok(TypeRef::Reference(t)),
            Some("prim") => Ok(TypeRef::Primitive(t)),
            Some("boxed") => Ok(TypeRef::Wrapper(t)),
            Some("list") => Ok(TypeRef::Collection(t)),
            Some(_) => Err(TypeRefParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

/// How an action affects the state of the objects it is invoked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSemantics {
    /// Query only, no side effects
    Safe,
    /// Side effects, but invoking twice is the same as invoking once
    Idempotent,
    NonIdempotent,
}

impl ActionSemantics {
    pub fn is_safe(&self) -> bool {
        matches!(self, ActionSemantics::Safe)
    }
}

impl fmt::Display for ActionSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSemantics::Safe => write!(f, "safe"),
            ActionSemantics::Idempotent => write!(f, "idempotent"),
            ActionSemantics::NonIdempotent => write!(f, "non-idempotent"),
        }
    }
}

/// Declarative metadata attached to a type, method or parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "marker", content = "value", rename_all = "snake_case")]
pub enum Marker {
    Optional,
    Mandatory,
    Disabled(Option<String>),
    Hidden,
    Immutable(Option<String>),
    Named(String),
    DescribedAs(String),
    MemberOrder {
        sequence: String,
        #[serde(default)]
        group: Option<String>,
    },
    MaxLength(usize),
    RegEx(String),
    ActionSemantics(ActionSemantics),
    /// Excludes a method from member discovery
    Programmatic,
    /// Extension metadata for factories registered by other modules
    Custom {
        name: String,
        #[serde(default)]
        value: Option<String>,
    },
}

impl Marker {
    pub fn name(&self) -> &str {
        match self {
            Marker::Optional => "optional",
            Marker::Mandatory => "mandatory",
            Marker::Disabled(_) => "disabled",
            Marker::Hidden => "hidden",
            Marker::Immutable(_) => "immutable",
            Marker::Named(_) => "named",
            Marker::DescribedAs(_) => "described_as",
            Marker::MemberOrder { .. } => "member_order",
            Marker::MaxLength(_) => "max_length",
            Marker::RegEx(_) => "reg_ex",
            Marker::ActionSemantics(_) => "action_semantics",
            Marker::Programmatic => "programmatic",
            Marker::Custom { name, .. } => name,
        }
    }
}
