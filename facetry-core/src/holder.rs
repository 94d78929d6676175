//! Facet holders
//!
//! A holder stores at most one facet per tag. Adding a facet replaces the
//! held one unless the newcomer's precedence is strictly lower, in which
//! case it is dropped.

use crate::facet::{Facet, FacetType};
use facetry_types::Identifier;
use std::collections::BTreeMap;

/// Container of facets for one metamodel element
#[derive(Debug, Clone)]
pub struct FacetHolder {
    identifier: Identifier,
    facets: BTreeMap<FacetType, Facet>,
}

impl FacetHolder {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            facets: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Attach a facet, honouring precedence
    ///
    /// Returns true if the facet is now the visible one for its tag.
    pub fn add_facet(&mut self, mut facet: Facet) -> bool {
        let facet_type = facet.facet_type();
        if let Some(existing) = self.facets.get(&facet_type) {
            if !facet.precedence().overrides(existing.precedence()) {
                tracing::trace!(
                    holder = %self.identifier,
                    facet_type = %facet_type,
                    held = %existing.precedence(),
                    dropped = %facet.precedence(),
                    "lower precedence facet dropped"
                );
                return false;
            }
        }
        facet.attach(&self.identifier);
        self.facets.insert(facet_type, facet);
        true
    }

    /// Insert a facet inherited from a supertype, keeping its original holder
    pub(crate) fn inherit(&mut self, facet: Facet) {
        self.facets.entry(facet.facet_type()).or_insert(facet);
    }

    pub fn get_facet(&self, facet_type: FacetType) -> Option<&Facet> {
        self.facets.get(&facet_type)
    }

    pub fn contains_facet(&self, facet_type: FacetType) -> bool {
        self.facets.contains_key(&facet_type)
    }

    /// All held facets, ordered by tag
    pub fn facets(&self) -> impl Iterator<Item = &Facet> {
        self.facets.values()
    }

    pub fn facet_types(&self) -> impl Iterator<Item = FacetType> + '_ {
        self.facets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precedence::Precedence;
    use facetry_types::LogicalType;

    fn holder() -> FacetHolder {
        FacetHolder::new(Identifier::for_member(LogicalType::new("Customer"), "name"))
    }

    #[test]
    fn test_empty_holder() {
        let h = holder();
        assert!(h.is_empty());
        assert!(h.get_facet(FacetType::MANDATORY).is_none());
        assert!(!h.contains_facet(FacetType::MANDATORY));
    }

    #[test]
    fn test_higher_precedence_replaces() {
        let mut h = holder();
        assert!(h.add_facet(Facet::mandatory(true, Precedence::Default)));
        assert!(h.add_facet(Facet::mandatory(false, Precedence::High)));

        let facet = h.get_facet(FacetType::MANDATORY).unwrap();
        assert_eq!(facet.as_flag(), Some(false));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_equal_precedence_replaces() {
        let mut h = holder();
        h.add_facet(Facet::named("First", Precedence::Default));
        assert!(h.add_facet(Facet::named("Second", Precedence::Default)));
        assert_eq!(h.get_facet(FacetType::NAMED).unwrap().as_text(), Some("Second"));
    }

    #[test]
    fn test_lower_precedence_dropped() {
        let mut h = holder();
        h.add_facet(Facet::mandatory(false, Precedence::High));
        assert!(!h.add_facet(Facet::mandatory(true, Precedence::Fallback)));
        assert_eq!(h.get_facet(FacetType::MANDATORY).unwrap().as_flag(), Some(false));
    }

    #[test]
    fn test_attached_facet_knows_holder() {
        let mut h = holder();
        h.add_facet(Facet::hidden(Precedence::Default));
        let facet = h.get_facet(FacetType::HIDDEN).unwrap();
        assert_eq!(facet.holder(), Some(h.identifier()));
    }

    #[test]
    fn test_tags_are_independent() {
        let mut h = holder();
        h.add_facet(Facet::mandatory(true, Precedence::Event));
        assert!(h.add_facet(Facet::hidden(Precedence::Fallback)));
        assert_eq!(h.facet_types().collect::<Vec<_>>(), vec![FacetType::HIDDEN, FacetType::MANDATORY]);
    }
}
