//! Object adapters and the resolve-state machine

use crate::error::AdapterError;
use crate::oid::Oid;
use facetry_core::ObjectSpecification;
use facetry_types::LogicalType;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A live domain object
pub trait DomainObject: Any + Send + Sync + fmt::Debug {
    /// The logical type this object is an instance of
    fn logical_type(&self) -> LogicalType;
}

/// Shared handle to a domain object
pub type Pojo = Arc<dyn DomainObject>;

/// Identity of a pojo within a session: the address of its allocation
pub(crate) fn pojo_key(pojo: &Pojo) -> usize {
    Arc::as_ptr(pojo) as *const () as usize
}

/// Lifecycle of an adapted object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolveState {
    /// Created in this session, not yet saved
    Transient,
    /// Persistent identity known, object not yet loaded
    Ghost,
    /// Object loaded and live
    Resolved,
    /// Removed from the backing store; terminal
    Destroyed,
}

impl ResolveState {
    /// Whether moving from this state to `next` is allowed
    pub fn can_transition_to(self, next: ResolveState) -> bool {
        matches!(
            (self, next),
            (ResolveState::Transient, ResolveState::Resolved)
                | (ResolveState::Ghost, ResolveState::Resolved)
                | (ResolveState::Resolved, ResolveState::Destroyed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ResolveState::Destroyed
    }
}

impl fmt::Display for ResolveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveState::Transient => write!(f, "TRANSIENT"),
            ResolveState::Ghost => write!(f, "GHOST"),
            ResolveState::Resolved => write!(f, "RESOLVED"),
            ResolveState::Destroyed => write!(f, "DESTROYED"),
        }
    }
}

/// Handle of an adapter within the session that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterId {
    pub(crate) session: Uuid,
    pub(crate) index: usize,
}

impl AdapterId {
    pub fn session(&self) -> Uuid {
        self.session
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", &self.session.to_string()[..8], self.index)
    }
}

#[derive(Debug)]
struct AdapterState {
    oid: Oid,
    pojo: Option<Pojo>,
    resolve_state: ResolveState,
}

/// Pairs one pojo with one Oid and one resolve state
///
/// Adapters are created and owned by an
/// [`InteractionSession`](crate::InteractionSession); state changes go
/// through the session.
pub struct ObjectAdapter {
    id: AdapterId,
    specification: Arc<ObjectSpecification>,
    state: RwLock<AdapterState>,
    load_lock: ReentrantMutex<()>,
    loading: AtomicBool,
}

impl ObjectAdapter {
    pub(crate) fn new(
        id: AdapterId,
        specification: Arc<ObjectSpecification>,
        oid: Oid,
        pojo: Option<Pojo>,
        resolve_state: ResolveState,
    ) -> Self {
        Self {
            id,
            specification,
            state: RwLock::new(AdapterState {
                oid,
                pojo,
                resolve_state,
            }),
            load_lock: ReentrantMutex::new(()),
            loading: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> AdapterId {
        self.id
    }

    pub fn specification(&self) -> &Arc<ObjectSpecification> {
        &self.specification
    }

    pub fn logical_type(&self) -> &LogicalType {
        self.specification.logical_type()
    }

    pub fn oid(&self) -> Oid {
        self.state.read().oid.clone()
    }

    /// The adapted object; `None` while the adapter is a ghost
    pub fn object(&self) -> Option<Pojo> {
        self.state.read().pojo.clone()
    }

    pub fn resolve_state(&self) -> ResolveState {
        self.state.read().resolve_state
    }

    pub fn is_transient(&self) -> bool {
        self.resolve_state() == ResolveState::Transient
    }

    pub fn is_ghost(&self) -> bool {
        self.resolve_state() == ResolveState::Ghost
    }

    pub fn is_resolved(&self) -> bool {
        self.resolve_state() == ResolveState::Resolved
    }

    pub fn is_destroyed(&self) -> bool {
        self.resolve_state() == ResolveState::Destroyed
    }

    /// Whether a demand-load is running for this adapter
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub(crate) fn holds(&self, pojo: &Pojo) -> bool {
        self.state
            .read()
            .pojo
            .as_ref()
            .is_some_and(|held| pojo_key(held) == pojo_key(pojo))
    }

    /// Move to `next`, rejecting transitions the state machine forbids
    pub(crate) fn transition(&self, next: ResolveState) -> Result<ResolveState, AdapterError> {
        let mut state = self.state.write();
        let from = state.resolve_state;
        if !from.can_transition_to(next) {
            return Err(AdapterError::IllegalTransition {
                oid: state.oid.clone(),
                from,
                to: next,
            });
        }
        state.resolve_state = next;
        Ok(from)
    }

    /// Install the loaded object and resolve the ghost
    pub(crate) fn complete_load(&self, pojo: Pojo) -> Result<(), AdapterError> {
        let mut state = self.state.write();
        if !state.resolve_state.can_transition_to(ResolveState::Resolved) {
            return Err(AdapterError::IllegalTransition {
                oid: state.oid.clone(),
                from: state.resolve_state,
                to: ResolveState::Resolved,
            });
        }
        state.pojo = Some(pojo);
        state.resolve_state = ResolveState::Resolved;
        Ok(())
    }

    /// Persist a transient adapter under its new Oid
    pub(crate) fn complete_persist(&self, oid: Oid) -> Result<Oid, AdapterError> {
        let mut state = self.state.write();
        if state.resolve_state != ResolveState::Transient {
            return Err(AdapterError::IllegalTransition {
                oid: state.oid.clone(),
                from: state.resolve_state,
                to: ResolveState::Resolved,
            });
        }
        state.resolve_state = ResolveState::Resolved;
        Ok(std::mem::replace(&mut state.oid, oid))
    }

    /// Serialize demand-loads of this adapter
    ///
    /// Other threads block until the running load finishes; the loading
    /// thread itself re-enters and is caught by [`Self::begin_loading`].
    pub(crate) fn lock_load(&self) -> ReentrantMutexGuard<'_, ()> {
        self.load_lock.lock()
    }

    /// Claim the loading flag; false if a load is already running
    pub(crate) fn begin_loading(&self) -> bool {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_loading(&self) {
        self.loading.store(false, Ordering::Release);
    }
}

impl fmt::Debug for ObjectAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ObjectAdapter")
            .field("id", &self.id)
            .field("oid", &state.oid)
            .field("state", &state.resolve_state)
            .field("loaded", &state.pojo.is_some())
            .finish()
    }
}

/// Clears an adapter's loading flag when dropped
pub(crate) struct LoadingGuard<'a>(pub(crate) &'a ObjectAdapter);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.end_loading();
    }
}
