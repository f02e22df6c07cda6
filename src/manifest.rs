//! Desired-resource manifest.
//!
//! ```toml
//! [resource.keycloak_account.acme]
//! realm_id = "test"
//! name = "Acme"
//! apps = ["portal"]
//!
//! [resource.keycloak_account.acme.attrs]
//! tier = "gold"
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{KeycloakError, KeycloakResult};

/// `resource_type.name`, e.g. `keycloak_account.acme`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub resource_type: String,
    pub name: String,
}

impl Address {
    pub fn parse(address: &str) -> KeycloakResult<Self> {
        match address.split_once('.') {
            Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
                Ok(Self {
                    resource_type: resource_type.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(KeycloakError::InvalidArgument(format!(
                "resource address must be <type>.<name>, got \"{address}\""
            ))),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    resource: BTreeMap<String, BTreeMap<String, toml::Table>>,
}

/// Desired attributes of every configured resource, keyed by address.
#[derive(Debug, Default)]
pub struct Manifest {
    resources: BTreeMap<Address, BTreeMap<String, Value>>,
}

impl Manifest {
    pub fn load(path: &Path) -> KeycloakResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> KeycloakResult<Self> {
        let raw: RawManifest = toml::from_str(content)?;
        let mut resources = BTreeMap::new();

        for (resource_type, instances) in raw.resource {
            for (name, table) in instances {
                let attributes = table
                    .into_iter()
                    .map(|(key, value)| Ok((key, serde_json::to_value(value)?)))
                    .collect::<KeycloakResult<BTreeMap<_, _>>>()?;
                resources.insert(
                    Address {
                        resource_type: resource_type.clone(),
                        name,
                    },
                    attributes,
                );
            }
        }

        Ok(Self { resources })
    }

    pub fn get(&self, address: &Address) -> Option<&BTreeMap<String, Value>> {
        self.resources.get(address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.resources.keys()
    }
}
