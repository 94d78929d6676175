//! Object identifiers
//!
//! An [`Oid`] is the identity of one domain object: its logical type plus a
//! key. Transient objects get a random key until they are persisted, at
//! which point an [`OidGenerator`](crate::OidGenerator) mints the persistent
//! one.
//!
//! The string form is `<type>:<key>` for persistent Oids and
//! `<type>:~<uuid>` for transient ones. The type never contains a colon, so
//! everything after the first colon is the key.

use crate::error::OidError;
use facetry_types::LogicalType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const TRANSIENT_MARKER: char = '~';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OidKey {
    /// Not yet saved; unique for the lifetime of the process
    Transient(Uuid),
    /// Assigned by the backing store
    Persistent(String),
}

/// Identity of a domain object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid {
    logical_type: LogicalType,
    key: OidKey,
}

impl Oid {
    /// A fresh transient Oid
    pub fn transient(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            key: OidKey::Transient(Uuid::new_v4()),
        }
    }

    /// A persistent Oid with the given store key
    pub fn persistent(logical_type: LogicalType, key: impl Into<String>) -> Result<Self, OidError> {
        let key = key.into();
        if key.is_empty() {
            return Err(OidError::EmptyKey(format!("{}:", logical_type)));
        }
        if key.starts_with(TRANSIENT_MARKER) {
            return Err(OidError::ReservedKey(key));
        }
        if logical_type.as_str().is_empty() || logical_type.as_str().contains(':') {
            return Err(OidError::Malformed(format!("{}:{}", logical_type, key)));
        }
        Ok(Self {
            logical_type,
            key: OidKey::Persistent(key),
        })
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    pub fn key(&self) -> &OidKey {
        &self.key
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.key, OidKey::Transient(_))
    }

    pub fn is_persistent(&self) -> bool {
        !self.is_transient()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            OidKey::Transient(uuid) => write!(f, "{}:{}{}", self.logical_type, TRANSIENT_MARKER, uuid),
            OidKey::Persistent(key) => write!(f, "{}:{}", self.logical_type, key),
        }
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, key) = s
            .split_once(':')
            .ok_or_else(|| OidError::Malformed(s.to_string()))?;
        if ty.is_empty() {
            return Err(OidError::EmptyType(s.to_string()));
        }
        if key.is_empty() {
            return Err(OidError::EmptyKey(s.to_string()));
        }

        let logical_type = LogicalType::new(ty);
        match key.strip_prefix(TRANSIENT_MARKER) {
            Some(uuid) => {
                let uuid = Uuid::parse_str(uuid).map_err(|e| OidError::InvalidTransientKey {
                    input: s.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Self {
                    logical_type,
                    key: OidKey::Transient(uuid),
                })
            }
            None => Self::persistent(logical_type, key),
        }
    }
}

impl TryFrom<String> for Oid {
    type Error = OidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.to_string()
    }
}
