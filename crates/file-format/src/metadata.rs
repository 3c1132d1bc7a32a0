use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookkeeping stored alongside a case's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    /// Fresh for every generator run, shared by the files that run writes.
    pub build_id: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Name and version of the program that wrote the file.
    #[serde(default)]
    pub generator: String,
}

impl ProjectMetadata {
    /// Metadata stamped with the current time and a new build id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            build_id: Uuid::new_v4(),
            created: now,
            modified: now,
            generator: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Same build, touched now.
    pub fn touched(&self) -> Self {
        Self {
            modified: Utc::now(),
            ..self.clone()
        }
    }
}
