//! Member discovery
//!
//! Turns the methods of a type descriptor into properties, collections and
//! actions. Accessors (`getX`, or `isX` returning a boolean) become
//! associations; methods that support another member (`hideX`,
//! `choices0PlaceOrder`, ...) are consumed; framework methods and methods
//! marked programmatic are skipped; everything else is an action.

use crate::descriptor::{capitalize, decapitalize, MethodDescriptor, TypeDescriptor};
use crate::member::MemberKind;
use std::collections::HashSet;

/// Prefixes of methods that supply behaviour for another member
pub const SUPPORTING_PREFIXES: &[&str] = &[
    "hide",
    "disable",
    "validate",
    "default",
    "choices",
    "autoComplete",
    "set",
    "modify",
    "clear",
];

/// Methods every domain type may have that never become members
pub const FRAMEWORK_METHODS: &[&str] = &[
    "title",
    "iconName",
    "cssClass",
    "toString",
    "equals",
    "hashCode",
];

#[derive(Debug, Clone)]
pub struct DiscoveredMember<'a> {
    pub kind: MemberKind,
    pub id: String,
    pub method: &'a MethodDescriptor,
}

/// Discover members in declaration order
pub fn discover_members(descriptor: &TypeDescriptor) -> Vec<DiscoveredMember<'_>> {
    let candidates: Vec<&MethodDescriptor> = descriptor
        .methods
        .iter()
        .filter(|m| !m.has_marker("programmatic") && !FRAMEWORK_METHODS.contains(&m.name.as_str()))
        .collect();

    // every name a supporting method could refer to
    let mut targets: HashSet<String> = HashSet::new();
    for method in &candidates {
        match accessor_id(method) {
            Some(id) => targets.insert(id),
            None => targets.insert(method.name.clone()),
        };
    }

    let mut members = Vec::new();
    for method in candidates {
        if let Some(id) = accessor_id(method) {
            let kind = if method.returns.is_collection() {
                MemberKind::Collection
            } else {
                MemberKind::Property
            };
            members.push(DiscoveredMember { kind, id, method });
        } else if supported_member(&method.name, &targets).is_none() {
            members.push(DiscoveredMember {
                kind: MemberKind::Action,
                id: method.name.clone(),
                method,
            });
        }
    }
    members
}

/// `getFirstName` -> `firstName`; `isActive` -> `active` when it returns a boolean
pub fn accessor_id(method: &MethodDescriptor) -> Option<String> {
    if !method.parameters.is_empty() || method.returns.is_void() {
        return None;
    }
    if let Some(rest) = capitalized_suffix(&method.name, "get") {
        return Some(decapitalize(rest));
    }
    if method.returns.is_boolean() {
        if let Some(rest) = capitalized_suffix(&method.name, "is") {
            return Some(decapitalize(rest));
        }
    }
    None
}

/// The member a supporting method refers to, if `name` is one
///
/// Parameter-level supporting methods carry the parameter index between
/// prefix and member name, e.g. `default0PlaceOrder`.
fn supported_member(name: &str, targets: &HashSet<String>) -> Option<String> {
    SUPPORTING_PREFIXES.iter().find_map(|prefix| {
        let rest = name.strip_prefix(prefix)?;
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
        let rest = capitalized_suffix(rest, "")?;
        let target = decapitalize(rest);
        (target != name && targets.contains(&target)).then_some(target)
    })
}

fn capitalized_suffix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    rest.chars()
        .next()
        .filter(|c| c.is_uppercase())
        .map(|_| rest)
}

/// Name of the supporting method `prefix` for a member, e.g. `hideName`
pub fn supporting_method_name(prefix: &str, member_id: &str) -> String {
    format!("{}{}", prefix, capitalize(member_id))
}

/// Name of the supporting method `prefix` for parameter `index` of an action
pub fn parameter_supporting_method_name(prefix: &str, index: usize, action: &str) -> String {
    format!("{}{}{}", prefix, index, capitalize(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facetry_types::{Marker, TypeRef};

    fn ty(s: &str) -> TypeRef {
        s.parse().unwrap()
    }

    fn discover(descriptor: &TypeDescriptor) -> Vec<(MemberKind, String)> {
        discover_members(descriptor)
            .into_iter()
            .map(|m| (m.kind, m.id))
            .collect()
    }

    #[test]
    fn test_accessors_become_associations() {
        let descriptor = TypeDescriptor::new("Node")
            .method(MethodDescriptor::getter("parent", ty("Node")))
            .method(MethodDescriptor::getter("children", ty("list:Node")))
            .method(MethodDescriptor::new("isLeaf").returns(ty("prim:bool")));

        assert_eq!(
            discover(&descriptor),
            vec![
                (MemberKind::Property, "parent".to_string()),
                (MemberKind::Collection, "children".to_string()),
                (MemberKind::Property, "leaf".to_string()),
            ]
        );
    }

    #[test]
    fn test_is_prefix_requires_boolean() {
        let descriptor =
            TypeDescriptor::new("Order").method(MethodDescriptor::new("isbn").returns(ty("string")));
        assert_eq!(discover(&descriptor), vec![(MemberKind::Action, "isbn".to_string())]);

        let descriptor = TypeDescriptor::new("Order")
            .method(MethodDescriptor::new("isShipped").returns(ty("string")));
        assert_eq!(
            discover(&descriptor),
            vec![(MemberKind::Action, "isShipped".to_string())]
        );
    }

    #[test]
    fn test_supporting_methods_are_consumed() {
        let descriptor = TypeDescriptor::new("Customer")
            .method(MethodDescriptor::getter("country", ty("string")))
            .method(MethodDescriptor::new("hideCountry").returns(ty("prim:bool")))
            .method(MethodDescriptor::new("choicesCountry").returns(ty("list:string")))
            .method(MethodDescriptor::new("placeOrder"))
            .method(MethodDescriptor::new("disablePlaceOrder").returns(ty("string")))
            .method(MethodDescriptor::new("default0PlaceOrder").returns(ty("int")))
            .method(MethodDescriptor::new("clearAll"));

        assert_eq!(
            discover(&descriptor),
            vec![
                (MemberKind::Property, "country".to_string()),
                (MemberKind::Action, "placeOrder".to_string()),
                (MemberKind::Action, "clearAll".to_string()),
            ]
        );
    }

    #[test]
    fn test_framework_and_programmatic_methods_skipped() {
        let descriptor = TypeDescriptor::new("Customer")
            .method(MethodDescriptor::new("title").returns(ty("string")))
            .method(MethodDescriptor::new("toString").returns(ty("string")))
            .method(MethodDescriptor::new("recalculate").marker(Marker::Programmatic))
            .method(MethodDescriptor::new("archive"));

        assert_eq!(discover(&descriptor), vec![(MemberKind::Action, "archive".to_string())]);
    }

    #[test]
    fn test_getter_with_parameters_is_an_action() {
        let descriptor = TypeDescriptor::new("Catalog").method(
            MethodDescriptor::new("getProduct")
                .returns(ty("Product"))
                .param(crate::descriptor::ParameterDescriptor::new("sku", ty("string"))),
        );
        assert_eq!(
            discover(&descriptor),
            vec![(MemberKind::Action, "getProduct".to_string())]
        );
    }

    #[test]
    fn test_supporting_method_names() {
        assert_eq!(supporting_method_name("hide", "country"), "hideCountry");
        assert_eq!(
            parameter_supporting_method_name("choices", 1, "placeOrder"),
            "choices1PlaceOrder"
        );
    }
}
