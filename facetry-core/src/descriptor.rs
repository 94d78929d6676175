//! Typed feature descriptors
//!
//! A [`TypeDescriptor`] lists everything introspection needs to know about
//! one domain type: its kind, supertypes, markers and methods. Factories
//! only ever see descriptors, never the mechanism that produced them, so a
//! hand-written registry, a YAML domain description or generated code can
//! all feed the same loader through [`DescriptorSource`].

use facetry_types::{LogicalType, Marker, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Built-in value types known to every registry
pub const VALUE_TYPES: &[&str] = &["string", "int", "long", "double", "bool", "decimal", "date"];

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("type {0} is described more than once")]
    Duplicate(LogicalType),

    #[error("Failed to read domain description: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse domain description: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// What kind of type a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Concrete,
    Abstract,
    Interface,
    /// Scalar values such as strings and numbers
    Value,
}

impl TypeKind {
    pub fn is_instantiable(&self) -> bool {
        matches!(self, TypeKind::Concrete | TypeKind::Value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            markers: Vec::new(),
        }
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

fn void() -> TypeRef {
    TypeRef::Void
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default = "void")]
    pub returns: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
}

impl MethodDescriptor {
    /// A method returning nothing and taking no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            returns: TypeRef::Void,
            parameters: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// An accessor `get<Property>` returning `returns`
    pub fn getter(property: &str, returns: TypeRef) -> Self {
        let mut method = Self::new(format!("get{}", capitalize(property)));
        method.returns = returns;
        method
    }

    pub fn returns(mut self, returns: TypeRef) -> Self {
        self.returns = returns;
        self
    }

    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.iter().any(|m| m.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(rename = "name")]
    pub logical_type: LogicalType,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<LogicalType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<LogicalType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    pub fn new(logical_type: impl Into<LogicalType>) -> Self {
        Self {
            logical_type: logical_type.into(),
            kind: TypeKind::Concrete,
            superclass: None,
            interfaces: Vec::new(),
            markers: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn value(name: &str) -> Self {
        Self::new(name).kind(TypeKind::Value)
    }

    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn extends(mut self, superclass: impl Into<LogicalType>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<LogicalType>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Direct supertypes: superclass first, then interfaces in declaration order
    pub fn supertypes(&self) -> impl Iterator<Item = &LogicalType> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Supplies descriptors to the specification loader
pub trait DescriptorSource: Send + Sync {
    fn describe(&self, logical_type: &LogicalType) -> Option<Arc<TypeDescriptor>>;

    /// Every type this source can describe, in a stable order
    fn known_types(&self) -> Vec<LogicalType>;
}

/// Serialized form of a set of domain types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainDescription {
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

impl DomainDescription {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DescriptorError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DescriptorError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }
}

/// In-memory descriptor source
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    types: HashMap<LogicalType, Arc<TypeDescriptor>>,
    order: Vec<LogicalType>,
}

impl DescriptorRegistry {
    /// A registry holding only the built-in value types
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for name in VALUE_TYPES {
            registry.insert(TypeDescriptor::value(name));
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn from_description(description: DomainDescription) -> Result<Self, DescriptorError> {
        let mut registry = Self::new();
        for descriptor in description.types {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Register a descriptor; each logical type may be described once
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), DescriptorError> {
        if self.types.contains_key(&descriptor.logical_type) {
            return Err(DescriptorError::Duplicate(descriptor.logical_type));
        }
        self.insert(descriptor);
        Ok(())
    }

    /// Builder-style registration; a later descriptor for the same type replaces the earlier one
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    fn insert(&mut self, descriptor: TypeDescriptor) {
        let name = descriptor.logical_type.clone();
        if self.types.insert(name.clone(), Arc::new(descriptor)).is_none() {
            self.order.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorSource for DescriptorRegistry {
    fn describe(&self, logical_type: &LogicalType) -> Option<Arc<TypeDescriptor>> {
        self.types.get(logical_type).cloned()
    }

    fn known_types(&self) -> Vec<LogicalType> {
        self.order.clone()
    }
}

/// `firstName` -> `FirstName`
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `FirstName` -> `firstName`
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `firstName` -> `First Name`
pub fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_value_types() {
        let registry = DescriptorRegistry::new();
        let string = registry.describe(&LogicalType::new("string")).unwrap();
        assert_eq!(string.kind, TypeKind::Value);
        assert_eq!(registry.len(), VALUE_TYPES.len());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = DescriptorRegistry::new();
        registry.register(TypeDescriptor::new("Customer")).unwrap();
        let err = registry.register(TypeDescriptor::new("Customer")).unwrap_err();
        assert!(matches!(err, DescriptorError::Duplicate(t) if t.as_str() == "Customer"));
    }

    #[test]
    fn test_known_types_in_registration_order() {
        let registry = DescriptorRegistry::empty()
            .with(TypeDescriptor::new("B"))
            .with(TypeDescriptor::new("A"));
        assert_eq!(
            registry.known_types(),
            vec![LogicalType::new("B"), LogicalType::new("A")]
        );
    }

    #[test]
    fn test_supertypes_order() {
        let descriptor = TypeDescriptor::new("Customer")
            .extends("Party")
            .implements("Auditable")
            .implements("Named");
        let supertypes: Vec<_> = descriptor.supertypes().map(|t| t.as_str()).collect();
        assert_eq!(supertypes, vec!["Party", "Auditable", "Named"]);
    }

    #[test]
    fn test_getter_name() {
        let getter = MethodDescriptor::getter("firstName", "string".parse().unwrap());
        assert_eq!(getter.name, "getFirstName");
    }

    #[test]
    fn test_naming_helpers() {
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(decapitalize("FirstName"), "firstName");
        assert_eq!(humanize("firstName"), "First Name");
        assert_eq!(humanize("placeOrder"), "Place Order");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_domain_description_from_yaml() {
        let yaml = r#"
types:
  - name: Node
    methods:
      - name: getParent
        returns: Node
      - name: getChildren
        returns: "list:Node"
      - name: rename
        parameters:
          - name: newName
            type: string
            markers:
              - marker: max_length
                value: 40
"#;
        let description = DomainDescription::from_yaml_str(yaml).unwrap();
        let node = &description.types[0];
        assert_eq!(node.logical_type.as_str(), "Node");
        assert_eq!(node.kind, TypeKind::Concrete);
        assert_eq!(node.methods.len(), 3);
        assert!(node.methods[1].returns.is_collection());
        assert_eq!(node.methods[2].returns, TypeRef::Void);
        assert_eq!(node.methods[2].parameters[0].markers, vec![Marker::MaxLength(40)]);
    }
}
