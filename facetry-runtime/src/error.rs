//! Error types for the adapter layer

use crate::adapter::{AdapterId, ResolveState};
use crate::oid::Oid;
use facetry_core::MetamodelError;
use facetry_types::LogicalType;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by an [`InteractionSession`](crate::InteractionSession)
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The Oid is already adapted to a different pojo
    #[error("oid {0} is already adapted to a different object")]
    DuplicateOid(Oid),

    /// The pojo is already adapted under another Oid
    #[error("object is already adapted as {existing}, cannot adapt it as {requested}")]
    PojoAlreadyAdapted { existing: Oid, requested: Oid },

    #[error("{oid}: illegal resolve-state transition {from} -> {to}")]
    IllegalTransition {
        oid: Oid,
        from: ResolveState,
        to: ResolveState,
    },

    /// Demand-load of an adapter that is already being loaded
    #[error("{0} is already being resolved")]
    ReentrantResolve(Oid),

    #[error("oid {oid} does not match object of type {actual}")]
    TypeMismatch { oid: Oid, actual: LogicalType },

    #[error("{0} is not instantiable")]
    NotInstantiable(LogicalType),

    #[error("cannot recreate transient oid {0}")]
    TransientOid(Oid),

    #[error("oid generator returned {generated} for {transient}")]
    InvalidGeneratedOid { generated: Oid, transient: Oid },

    #[error("{oid} has no member '{member}'")]
    UnknownMember { oid: Oid, member: String },

    #[error("{oid}: '{member}' is an action, not a property or collection")]
    NotAnAssociation { oid: Oid, member: String },

    /// The adapter belongs to another session
    #[error("adapter {0} belongs to another session")]
    ForeignAdapter(AdapterId),

    #[error("no adapter {0} in this session")]
    UnknownAdapter(AdapterId),

    #[error("{0} has been destroyed")]
    Destroyed(Oid),

    #[error("session {0} is closed")]
    SessionClosed(Uuid),

    /// The backing store no longer holds the object
    #[error("object {0} no longer exists")]
    ObjectNotFound(Oid),

    #[error("failed to recreate {oid}: {message}")]
    RecreationFailed { oid: Oid, message: String },

    #[error(transparent)]
    Oid(#[from] OidError),

    #[error(transparent)]
    Metamodel(#[from] MetamodelError),
}

impl AdapterError {
    /// Whether this error signals misuse of the session lifecycle
    ///
    /// Integrity violations are programming errors; callers should not try
    /// to recover from them.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            AdapterError::DuplicateOid(_)
                | AdapterError::PojoAlreadyAdapted { .. }
                | AdapterError::IllegalTransition { .. }
                | AdapterError::ReentrantResolve(_)
                | AdapterError::TypeMismatch { .. }
                | AdapterError::InvalidGeneratedOid { .. }
                | AdapterError::ForeignAdapter(_)
                | AdapterError::Destroyed(_)
        )
    }
}

/// Failure reported by a [`PojoRecreator`](crate::PojoRecreator)
#[derive(Debug, Error)]
pub enum RecreateError {
    #[error("not found in the backing store")]
    NotFound,

    #[error("{0}")]
    Failed(String),
}

/// Errors parsing an [`Oid`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OidError {
    #[error("malformed oid '{0}', expected <type>:<key>")]
    Malformed(String),

    #[error("oid '{0}' has an empty type")]
    EmptyType(String),

    #[error("oid '{0}' has an empty key")]
    EmptyKey(String),

    #[error("invalid transient key in '{input}': {message}")]
    InvalidTransientKey { input: String, message: String },

    /// Persistent keys may not start with the transient marker
    #[error("persistent key '{0}' starts with '~'")]
    ReservedKey(String),
}

/// Result type using AdapterError
pub type Result<T> = std::result::Result<T, AdapterError>;
