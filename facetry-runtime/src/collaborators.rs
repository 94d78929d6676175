//! Hooks into the persistence layer
//!
//! The session never talks to a backing store itself. Demand-loading a ghost
//! goes through a [`PojoRecreator`] and persisting a transient object asks an
//! [`OidGenerator`] for its persistent identity.

use crate::adapter::Pojo;
use crate::error::{OidError, RecreateError};
use crate::oid::Oid;
use crate::session::InteractionSession;
use dashmap::DashMap;
use facetry_core::ObjectSpecification;
use facetry_types::LogicalType;

/// Loads the live object behind a persistent Oid
pub trait PojoRecreator: Send + Sync {
    /// Called synchronously while resolving a ghost
    ///
    /// The session is handed in so the recreator can adapt referenced
    /// objects; resolving the ghost being loaded fails with
    /// [`AdapterError::ReentrantResolve`](crate::AdapterError::ReentrantResolve).
    fn recreate(
        &self,
        oid: &Oid,
        specification: &ObjectSpecification,
        session: &InteractionSession,
    ) -> Result<Pojo, RecreateError>;
}

/// Mints persistent Oids for transient objects at save time
pub trait OidGenerator: Send + Sync {
    fn next_oid(&self, transient: &Oid, pojo: &Pojo) -> Result<Oid, OidError>;
}

/// Per-type counter starting at 1
#[derive(Debug, Default)]
pub struct SequentialOidGenerator {
    counters: DashMap<LogicalType, u64>,
}

impl SequentialOidGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering `logical_type` after `last`
    pub fn starting_after(self, logical_type: LogicalType, last: u64) -> Self {
        self.counters.insert(logical_type, last);
        self
    }
}

impl OidGenerator for SequentialOidGenerator {
    fn next_oid(&self, transient: &Oid, _pojo: &Pojo) -> Result<Oid, OidError> {
        let logical_type = transient.logical_type().clone();
        let next = {
            let mut counter = self.counters.entry(logical_type.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        Oid::persistent(logical_type, next.to_string())
    }
}
