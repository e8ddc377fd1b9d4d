use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DownholeError, Result};

/// Identifies one object (optionally one version of it) within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    pub workspace_id: Uuid,
    pub object_id: Uuid,
    /// Version identifier; `None` means latest.
    pub version: Option<String>,
}

impl ObjectReference {
    /// Creates a reference to the latest version of an object.
    pub fn new(workspace_id: Uuid, object_id: Uuid) -> Self {
        Self {
            workspace_id,
            object_id,
            version: None,
        }
    }

    /// Parses string identifiers. An empty version string means latest.
    pub fn parse(workspace_id: &str, object_id: &str, version: &str) -> Result<Self> {
        let workspace_id = parse_uuid("workspace_id", workspace_id)?;
        let object_id = parse_uuid("object_id", object_id)?;
        let version = match version.trim() {
            "" => None,
            v => Some(v.to_string()),
        };
        Ok(Self {
            workspace_id,
            object_id,
            version,
        })
    }

    /// Pins the reference to a specific version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Creates a reference with random identifiers.
    pub fn random() -> Self {
        Self::new(Uuid::new_v4(), Uuid::new_v4())
    }
}

impl std::fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.workspace_id, self.object_id)?;
        if let Some(ref version) = self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|e| {
        DownholeError::InvalidArgument(format!("{field} '{value}' is not a valid UUID: {e}"))
    })
}
