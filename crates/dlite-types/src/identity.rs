use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Identity of an instance: a UUID and, when the instance was created from
/// a human-readable id, the URI it was derived from.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl InstanceId {
    /// A fresh random identity.
    pub fn random() -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            uri: None,
        }
    }

    /// The URI if present, otherwise the UUID.
    pub fn preferred(&self) -> &str {
        self.uri.as_deref().unwrap_or(&self.uuid)
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uri {
            Some(uri) => write!(f, "InstanceId({} <{}>)", self.uuid, uri),
            None => write!(f, "InstanceId({})", self.uuid),
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.preferred())
    }
}

/// Derive the identity of an instance from an optional user-supplied id.
///
/// - `None` yields a random (v4) UUID.
/// - A string that parses as a UUID is normalised to lower-case hyphenated
///   form and used as is.
/// - Any other string is treated as a URI: the UUID is the deterministic v5
///   UUID of the string and the string is kept as `uri`.
pub fn derive_uuid(id: Option<&str>) -> Result<InstanceId, TypeError> {
    let Some(id) = id else {
        return Ok(InstanceId::random());
    };
    let id = id.trim();
    if id.is_empty() {
        return Err(TypeError::InvalidId("empty id".to_string()));
    }
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(InstanceId {
            uuid: uuid.hyphenated().to_string(),
            uri: None,
        });
    }
    Ok(InstanceId {
        uuid: Uuid::new_v5(&Uuid::NAMESPACE_DNS, id.as_bytes()).to_string(),
        uri: Some(id.to_string()),
    })
}
