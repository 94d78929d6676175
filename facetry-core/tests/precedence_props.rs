//! Property-based tests for facet precedence.
//!
//! Whatever order facets of one tag arrive in, the holder ends up with the
//! last of those carrying the highest precedence.

use facetry_core::{Facet, FacetHolder, FacetType, Precedence};
use facetry_types::Identifier;
use facetry_types::LogicalType;
use proptest::prelude::*;

fn precedence_strategy() -> impl Strategy<Value = Precedence> {
    prop::sample::select(Precedence::ALL.to_vec())
}

fn contributions() -> impl Strategy<Value = Vec<(Precedence, bool)>> {
    prop::collection::vec((precedence_strategy(), any::<bool>()), 1..24)
}

fn holder() -> FacetHolder {
    FacetHolder::new(Identifier::for_member(LogicalType::new("Customer"), "name"))
}

proptest! {
    #[test]
    fn last_of_highest_precedence_wins(adds in contributions()) {
        let mut holder = holder();
        for (precedence, flag) in &adds {
            holder.add_facet(Facet::mandatory(*flag, *precedence));
        }

        let highest = adds.iter().map(|(p, _)| *p).max().unwrap();
        let expected = adds.iter().rev().find(|(p, _)| *p == highest).unwrap().1;

        let held = holder.get_facet(FacetType::MANDATORY).unwrap();
        prop_assert_eq!(held.precedence(), highest);
        prop_assert_eq!(held.as_flag(), Some(expected));
        prop_assert_eq!(holder.len(), 1);
    }

    #[test]
    fn precedence_never_decreases(adds in contributions()) {
        let mut holder = holder();
        let mut seen = Precedence::Fallback;
        for (precedence, flag) in adds {
            holder.add_facet(Facet::mandatory(flag, precedence));
            let held = holder.get_facet(FacetType::MANDATORY).unwrap().precedence();
            prop_assert!(held >= seen);
            seen = held;
        }
    }

    #[test]
    fn add_reports_replacement(adds in contributions()) {
        let mut holder = holder();
        for (precedence, flag) in adds {
            let before = holder.get_facet(FacetType::MANDATORY).map(Facet::precedence);
            let replaced = holder.add_facet(Facet::mandatory(flag, precedence));
            prop_assert_eq!(replaced, before.map_or(true, |held| precedence >= held));
        }
    }
}
