//! Sync metadata carried by every syncable row.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use tillsync_codec::{CodecError, CodecResult, WireField};
use uuid::Uuid;

/// Longest external id accepted from the wire.
pub const MAX_EXTERNAL_ID_LEN: usize = 64;

/// Cross-node identity of a row.
///
/// Locally generated ids are UUID v4 strings. Ids received from a peer are
/// kept verbatim so rows created by other tools keep their identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalId(String);

impl ExternalId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validates and wraps an id received from elsewhere.
    pub fn parse(text: &str) -> CodecResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CodecError::invalid_value("external_id is empty"));
        }
        if text.len() > MAX_EXTERNAL_ID_LEN {
            return Err(CodecError::invalid_value(format!(
                "external_id longer than {MAX_EXTERNAL_ID_LEN} characters"
            )));
        }
        Ok(Self(text.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is a well-formed UUID.
    pub fn is_uuid(&self) -> bool {
        Uuid::parse_str(&self.0).is_ok()
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for ExternalId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl WireField for ExternalId {
    fn to_wire(&self) -> Value {
        Value::String(self.0.clone())
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            other => Err(CodecError::invalid_value(format!(
                "expected external_id string, got {other}"
            ))),
        }
    }
}

/// Direction a class of entities flows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    /// Created at the Edge, pushed to the Cloud.
    Transactional,
    /// Managed at the Cloud, pulled by the Edge.
    Reference,
}

impl EntityClass {
    /// Returns a short lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Transactional => "transactional",
            EntityClass::Reference => "reference",
        }
    }
}

/// Sync bookkeeping for a row.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncMeta {
    /// Node-local primary key. Never transmitted.
    pub id: Option<i64>,
    /// Cross-node identity, assigned lazily before the first push.
    pub external_id: Option<ExternalId>,
    /// Time of the last local mutation.
    pub updated_at: DateTime<Utc>,
    /// Time the row last matched its peer copy.
    pub synced_at: Option<DateTime<Utc>>,
}

impl SyncMeta {
    /// Metadata for a row created now.
    pub fn new() -> Self {
        Self {
            id: None,
            external_id: None,
            updated_at: tillsync_codec::now(),
            synced_at: None,
        }
    }

    /// Returns true if the latest local mutation has not reached the peer.
    pub fn needs_push(&self) -> bool {
        match self.synced_at {
            None => true,
            Some(synced_at) => self.updated_at > synced_at,
        }
    }

    /// Records a local mutation.
    pub fn touch(&mut self) {
        self.updated_at = tillsync_codec::now();
    }

    /// Assigns an external id if there is none. Returns true if one was assigned.
    pub fn ensure_external_id(&mut self) -> bool {
        if self.external_id.is_some() {
            return false;
        }
        self.external_id = Some(ExternalId::generate());
        true
    }
}

impl Default for SyncMeta {
    fn default() -> Self {
        Self::new()
    }
}
