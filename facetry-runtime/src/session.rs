//! Interaction sessions
//!
//! A session is one unit of work for one user. It owns every adapter created
//! within it together with two identity maps, by Oid and by pojo, so that
//! each domain object is adapted at most once per session.
//!
//! The session lock is never held while a collaborator runs. A recreator may
//! therefore call back into the session, for example to adapt objects
//! referenced by the one it is loading.

use crate::adapter::{pojo_key, AdapterId, LoadingGuard, ObjectAdapter, Pojo, ResolveState};
use crate::collaborators::{OidGenerator, PojoRecreator};
use crate::error::{AdapterError, RecreateError, Result};
use crate::oid::Oid;
use facetry_core::{ObjectMember, ObjectSpecification, SpecificationLoader};
use facetry_types::LogicalType;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

/// Who the session acts for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionContext {
    pub user: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl InteractionContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// A property or collection read through its adapter
#[derive(Debug, Clone)]
pub struct MemberAccess {
    pub member: Arc<ObjectMember>,
    pub object: Pojo,
}

#[derive(Default)]
struct SessionState {
    adapters: Vec<Arc<ObjectAdapter>>,
    by_oid: HashMap<Oid, usize>,
    by_pojo: HashMap<usize, usize>,
    closed: bool,
}

/// One unit of work and its adapter identity map
pub struct InteractionSession {
    id: Uuid,
    context: InteractionContext,
    loader: Arc<SpecificationLoader>,
    recreator: Arc<dyn PojoRecreator>,
    oid_generator: Arc<dyn OidGenerator>,
    state: Mutex<SessionState>,
}

impl InteractionSession {
    pub fn new(
        context: InteractionContext,
        loader: Arc<SpecificationLoader>,
        recreator: Arc<dyn PojoRecreator>,
        oid_generator: Arc<dyn OidGenerator>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, user = %context.user, "session opened");
        Self {
            id,
            context,
            loader,
            recreator,
            oid_generator,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &InteractionContext {
        &self.context
    }

    pub fn loader(&self) -> &Arc<SpecificationLoader> {
        &self.loader
    }

    /// Adapt `pojo` under `oid`
    ///
    /// Adapting an already adapted pojo again, under any Oid, returns its
    /// existing adapter unchanged. Reusing an adapted Oid for a different
    /// pojo is an integrity violation.
    #[instrument(level = "debug", skip_all, fields(session = %self.id, oid = %oid))]
    pub fn create_adapter(&self, pojo: Pojo, oid: Oid) -> Result<Arc<ObjectAdapter>> {
        let actual = pojo.logical_type();
        if &actual != oid.logical_type() {
            return Err(AdapterError::TypeMismatch { oid, actual });
        }
        let specification = self.instantiable_specification(oid.logical_type())?;

        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        if let Some(&index) = state.by_oid.get(&oid) {
            let existing = Arc::clone(&state.adapters[index]);
            if existing.holds(&pojo) {
                trace!("oid already adapted");
                return Ok(existing);
            }
            warn!("oid already adapted to a different object");
            return Err(AdapterError::DuplicateOid(oid));
        }
        if let Some(&index) = state.by_pojo.get(&pojo_key(&pojo)) {
            let existing = Arc::clone(&state.adapters[index]);
            trace!(existing = %existing.oid(), "object already adapted");
            return Ok(existing);
        }

        let resolve_state = if oid.is_transient() {
            ResolveState::Transient
        } else {
            ResolveState::Resolved
        };
        Ok(self.insert(&mut state, specification, oid, Some(pojo), resolve_state))
    }

    /// The adapter for `pojo`, adapting it as a new transient object if unknown
    pub fn adapter_for_pojo(&self, pojo: Pojo) -> Result<Arc<ObjectAdapter>> {
        if let Some(existing) = self.lookup_pojo(&pojo) {
            return Ok(existing);
        }
        let oid = Oid::transient(pojo.logical_type());
        self.create_adapter(pojo, oid)
    }

    /// A ghost adapter for a persistent object, or the existing adapter
    #[instrument(level = "debug", skip_all, fields(session = %self.id, oid = %oid))]
    pub fn recreate_adapter(&self, oid: Oid) -> Result<Arc<ObjectAdapter>> {
        if oid.is_transient() {
            return Err(AdapterError::TransientOid(oid));
        }
        let specification = self.instantiable_specification(oid.logical_type())?;

        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        if let Some(&index) = state.by_oid.get(&oid) {
            return Ok(Arc::clone(&state.adapters[index]));
        }
        Ok(self.insert(&mut state, specification, oid, None, ResolveState::Ghost))
    }

    /// The live object behind an adapter, demand-loading a ghost
    ///
    /// Resolving an adapter that is already resolved returns the loaded
    /// object without calling the recreator again. Concurrent resolves of the
    /// same ghost wait for the first load and share its result; a resolve
    /// issued from inside that load fails with
    /// [`AdapterError::ReentrantResolve`].
    #[instrument(level = "debug", skip_all, fields(session = %self.id, adapter = %id))]
    pub fn resolve(&self, id: AdapterId) -> Result<Pojo> {
        let adapter = self.adapter(id)?;
        match adapter.resolve_state() {
            ResolveState::Destroyed => return Err(AdapterError::Destroyed(adapter.oid())),
            ResolveState::Transient | ResolveState::Resolved => {
                if let Some(pojo) = adapter.object() {
                    return Ok(pojo);
                }
            }
            ResolveState::Ghost => {}
        }
        self.demand_load(&adapter)
    }

    /// Read a property or collection, loading the object first if needed
    pub fn access_member(&self, id: AdapterId, member_id: &str) -> Result<MemberAccess> {
        let adapter = self.adapter(id)?;
        let member = adapter
            .specification()
            .member(member_id)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownMember {
                oid: adapter.oid(),
                member: member_id.to_string(),
            })?;
        if member.is_action() {
            return Err(AdapterError::NotAnAssociation {
                oid: adapter.oid(),
                member: member_id.to_string(),
            });
        }
        let object = self.resolve(id)?;
        Ok(MemberAccess { member, object })
    }

    /// Save a transient object, re-keying its adapter under a persistent Oid
    #[instrument(level = "debug", skip_all, fields(session = %self.id, adapter = %id))]
    pub fn persist(&self, id: AdapterId) -> Result<Oid> {
        let adapter = self.adapter(id)?;
        let transient = adapter.oid();
        let from = adapter.resolve_state();
        let pojo = match (from, adapter.object()) {
            (ResolveState::Transient, Some(pojo)) => pojo,
            _ => {
                return Err(AdapterError::IllegalTransition {
                    oid: transient,
                    from,
                    to: ResolveState::Resolved,
                })
            }
        };

        let persistent = self.oid_generator.next_oid(&transient, &pojo)?;
        if persistent.is_transient() || persistent.logical_type() != transient.logical_type() {
            return Err(AdapterError::InvalidGeneratedOid {
                generated: persistent,
                transient,
            });
        }

        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        if state.by_oid.contains_key(&persistent) {
            return Err(AdapterError::DuplicateOid(persistent));
        }
        adapter.complete_persist(persistent.clone())?;
        state.by_oid.remove(&transient);
        state.by_oid.insert(persistent.clone(), id.index);
        debug!(from = %transient, to = %persistent, "persisted");
        Ok(persistent)
    }

    /// Mark a resolved object as removed from the backing store
    #[instrument(level = "debug", skip_all, fields(session = %self.id, adapter = %id))]
    pub fn destroy(&self, id: AdapterId) -> Result<()> {
        let adapter = self.adapter(id)?;
        adapter.transition(ResolveState::Destroyed)?;
        debug!(oid = %adapter.oid(), "destroyed");
        Ok(())
    }

    pub fn adapter(&self, id: AdapterId) -> Result<Arc<ObjectAdapter>> {
        if id.session != self.id {
            return Err(AdapterError::ForeignAdapter(id));
        }
        let state = self.state.lock();
        self.ensure_open(&state)?;
        state
            .adapters
            .get(id.index)
            .cloned()
            .ok_or(AdapterError::UnknownAdapter(id))
    }

    pub fn lookup_oid(&self, oid: &Oid) -> Option<Arc<ObjectAdapter>> {
        let state = self.state.lock();
        state
            .by_oid
            .get(oid)
            .map(|&index| Arc::clone(&state.adapters[index]))
    }

    pub fn lookup_pojo(&self, pojo: &Pojo) -> Option<Arc<ObjectAdapter>> {
        let state = self.state.lock();
        state
            .by_pojo
            .get(&pojo_key(pojo))
            .map(|&index| Arc::clone(&state.adapters[index]))
    }

    /// Every adapter in creation order
    pub fn adapters(&self) -> Vec<Arc<ObjectAdapter>> {
        self.state.lock().adapters.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// End the unit of work, releasing every adapter
    ///
    /// Returns the number of adapters released. Any later operation fails
    /// with [`AdapterError::SessionClosed`].
    pub fn close(&self) -> usize {
        let mut state = self.state.lock();
        let released = state.adapters.len();
        state.adapters.clear();
        state.by_oid.clear();
        state.by_pojo.clear();
        state.closed = true;
        debug!(session = %self.id, released, "session closed");
        released
    }

    fn ensure_open(&self, state: &SessionState) -> Result<()> {
        if state.closed {
            return Err(AdapterError::SessionClosed(self.id));
        }
        Ok(())
    }

    fn instantiable_specification(&self, logical_type: &LogicalType) -> Result<Arc<ObjectSpecification>> {
        let specification = self.loader.load_specification(logical_type)?;
        if !specification.is_instantiable() {
            return Err(AdapterError::NotInstantiable(logical_type.clone()));
        }
        Ok(specification)
    }

    fn insert(
        &self,
        state: &mut SessionState,
        specification: Arc<ObjectSpecification>,
        oid: Oid,
        pojo: Option<Pojo>,
        resolve_state: ResolveState,
    ) -> Arc<ObjectAdapter> {
        let index = state.adapters.len();
        let id = AdapterId {
            session: self.id,
            index,
        };
        if let Some(pojo) = &pojo {
            state.by_pojo.insert(pojo_key(pojo), index);
        }
        state.by_oid.insert(oid.clone(), index);
        let adapter = Arc::new(ObjectAdapter::new(id, specification, oid, pojo, resolve_state));
        state.adapters.push(Arc::clone(&adapter));
        debug!(adapter = %id, state = %resolve_state, "adapter created");
        adapter
    }

    fn demand_load(&self, adapter: &Arc<ObjectAdapter>) -> Result<Pojo> {
        let _serialized = adapter.lock_load();
        let oid = adapter.oid();
        // another thread may have finished loading while we waited
        match adapter.resolve_state() {
            ResolveState::Destroyed => return Err(AdapterError::Destroyed(oid)),
            ResolveState::Ghost => {}
            _ => {
                if let Some(pojo) = adapter.object() {
                    return Ok(pojo);
                }
            }
        }
        if !adapter.begin_loading() {
            warn!(oid = %oid, "reentrant demand-load");
            return Err(AdapterError::ReentrantResolve(oid));
        }
        let _loading = LoadingGuard(adapter);

        debug!(oid = %oid, "demand-loading ghost");
        let pojo = self
            .recreator
            .recreate(&oid, adapter.specification(), self)
            .map_err(|err| match err {
                RecreateError::NotFound => AdapterError::ObjectNotFound(oid.clone()),
                RecreateError::Failed(message) => AdapterError::RecreationFailed {
                    oid: oid.clone(),
                    message,
                },
            })?;
        let actual = pojo.logical_type();
        if &actual != oid.logical_type() {
            return Err(AdapterError::TypeMismatch { oid, actual });
        }

        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        let key = pojo_key(&pojo);
        if let Some(&index) = state.by_pojo.get(&key) {
            if index != adapter.id().index {
                return Err(AdapterError::PojoAlreadyAdapted {
                    existing: state.adapters[index].oid(),
                    requested: oid,
                });
            }
        }
        adapter.complete_load(Arc::clone(&pojo))?;
        state.by_pojo.insert(key, adapter.id().index);
        Ok(pojo)
    }
}

impl fmt::Debug for InteractionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionSession")
            .field("id", &self.id)
            .field("user", &self.context.user)
            .field("adapters", &self.len())
            .finish()
    }
}
