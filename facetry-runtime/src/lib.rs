//! Facetry runtime - object identity and adapters
//!
//! Domain objects are never handled directly once they enter a session.
//! Each one is wrapped in an [`ObjectAdapter`] that pairs it with an
//! [`Oid`], its [`ObjectSpecification`](facetry_core::ObjectSpecification)
//! and a [`ResolveState`]:
//!
//! ```text
//!   TRANSIENT ──persist──> RESOLVED ──destroy──> DESTROYED
//!                             ^
//!   GHOST ───demand-load──────┘
//! ```
//!
//! Adapters live in an [`InteractionSession`], which keeps at most one
//! adapter per Oid and per pojo. Loading and saving are delegated to the
//! [`PojoRecreator`] and [`OidGenerator`] collaborators.

pub mod adapter;
pub mod collaborators;
pub mod error;
pub mod oid;
pub mod session;

pub use adapter::{AdapterId, DomainObject, ObjectAdapter, Pojo, ResolveState};
pub use collaborators::{OidGenerator, PojoRecreator, SequentialOidGenerator};
pub use error::{AdapterError, OidError, RecreateError, Result};
pub use oid::{Oid, OidKey};
pub use session::{InteractionContext, InteractionSession, MemberAccess};
