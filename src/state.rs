//! JSON state file holding the last known data of each managed resource.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::KeycloakResult;
use crate::provider::ResourceData;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,
    /// Local name the resource is addressed by
    pub name: String,
    #[serde(flatten)]
    pub data: ResourceData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: Vec::new(),
        }
    }
}

impl StateFile {
    /// Reads state; a missing file is an empty state
    pub fn load(path: &Path) -> KeycloakResult<Self> {
        if !path.exists() {
            log::debug!("No state at {:?}, starting empty", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes state through a temporary file so a failed write never truncates it
    pub fn save(&self, path: &Path) -> KeycloakResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp_path, path)?;
        log::debug!("Saved {} resource(s) to {:?}", self.resources.len(), path);
        Ok(())
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Inserts, replaces, or with `None` removes the entry for `resource_type.name`
    pub fn put(&mut self, resource_type: &str, name: &str, data: Option<ResourceData>) {
        self.resources
            .retain(|r| !(r.resource_type == resource_type && r.name == name));
        if let Some(data) = data {
            self.resources.push(ResourceState {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
                data,
            });
            self.resources
                .sort_by(|a, b| (&a.resource_type, &a.name).cmp(&(&b.resource_type, &b.name)));
        }
    }
}
