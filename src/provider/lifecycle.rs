//! Plan and apply: diff desired configuration against state, then run handlers.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::diagnostics::Diagnostics;
use super::resource_data::ResourceData;
use super::schema::{SchemaMap, ValueType, validate_config};
use super::Resource;
use crate::api::KeycloakClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    NoOp,
    Create,
    Update,
    /// Delete then create, because a force-new attribute changed
    Replace,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub name: String,
    pub before: Value,
    pub after: Value,
    pub force_new: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub action: Action,
    pub changes: Vec<AttributeChange>,
    /// State the resource should have once applied; `None` for deletes
    #[serde(skip)]
    pub planned: Option<ResourceData>,
}

/// Result of applying a plan: the new state (`None` when the resource is gone)
/// and whatever the handlers reported.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub state: Option<ResourceData>,
    pub diagnostics: Diagnostics,
}

/// Zero values of each type compare equal to an absent attribute.
fn normalize(value_type: ValueType, value: Option<&Value>) -> Value {
    match (value_type, value) {
        (ValueType::Set, Some(Value::Array(items))) => {
            let members: BTreeSet<&str> = items.iter().filter_map(Value::as_str).collect();
            Value::from(members.into_iter().collect::<Vec<_>>())
        }
        (_, Some(v)) if !v.is_null() => v.clone(),
        (ValueType::String, _) => Value::from(""),
        (ValueType::Int, _) => Value::from(0),
        (ValueType::Map, _) => Value::Object(Default::default()),
        (ValueType::Set, _) => Value::Array(Vec::new()),
    }
}

/// Computes the action needed to move from `prior` state to `config`.
///
/// `config == None` means the resource was removed from configuration.
pub fn plan(
    schema: &SchemaMap,
    prior: Option<&ResourceData>,
    config: Option<&BTreeMap<String, Value>>,
) -> Result<Plan, Diagnostics> {
    let prior = prior.filter(|p| !p.is_gone());

    let config = match (prior, config) {
        (None, None) => {
            return Ok(Plan {
                action: Action::NoOp,
                changes: Vec::new(),
                planned: None,
            });
        }
        (Some(_), None) => {
            return Ok(Plan {
                action: Action::Delete,
                changes: Vec::new(),
                planned: None,
            });
        }
        (_, Some(config)) => config,
    };

    let problems = validate_config(schema, config);
    if !problems.is_empty() {
        let mut diags = Diagnostics::new();
        for problem in problems {
            diags.extend(Diagnostics::error("invalid configuration", problem));
        }
        return Err(diags);
    }

    let Some(prior) = prior else {
        return Ok(Plan {
            action: Action::Create,
            changes: config
                .iter()
                .map(|(name, value)| AttributeChange {
                    name: name.clone(),
                    before: Value::Null,
                    after: value.clone(),
                    force_new: false,
                })
                .collect(),
            planned: Some(ResourceData::from_config(config.clone())),
        });
    };

    let mut planned = prior.clone();
    let mut changes = Vec::new();

    for (name, attr) in schema {
        if attr.is_computed_only() {
            continue;
        }
        let desired = config.get(name).filter(|v| !v.is_null());
        // Optional+computed attributes left out of config keep the server's value
        if desired.is_none() && attr.computed {
            continue;
        }

        let before = normalize(attr.value_type, prior.get(name));
        let after = normalize(attr.value_type, desired);
        if before != after {
            changes.push(AttributeChange {
                name: name.clone(),
                before,
                after: after.clone(),
                force_new: attr.force_new,
            });
        }

        match desired {
            Some(_) => planned.set(name.clone(), after),
            None => {
                planned.remove(name);
            }
        }
    }

    let action = if changes.iter().any(|c| c.force_new) {
        Action::Replace
    } else if changes.is_empty() {
        Action::NoOp
    } else {
        Action::Update
    };

    if action == Action::Replace {
        planned = ResourceData::from_config(config.clone());
    }

    Ok(Plan {
        action,
        changes,
        planned: Some(planned),
    })
}

/// Runs the handlers a plan calls for.
pub async fn apply(
    resource: &dyn Resource,
    client: &KeycloakClient,
    prior: Option<&ResourceData>,
    plan: Plan,
) -> ApplyOutcome {
    let prior = prior.filter(|p| !p.is_gone()).cloned();

    match (plan.action, prior, plan.planned) {
        (Action::NoOp, prior, _) => ApplyOutcome {
            state: prior,
            diagnostics: Diagnostics::new(),
        },
        (Action::Create, _, Some(mut data)) => {
            let diagnostics = resource.create(client, &mut data).await;
            ApplyOutcome {
                state: (!data.is_gone()).then_some(data),
                diagnostics,
            }
        }
        (Action::Update, Some(prior), Some(mut data)) => {
            let diagnostics = resource.update(client, &prior, &mut data).await;
            let state = if diagnostics.has_errors() { prior } else { data };
            ApplyOutcome {
                state: Some(state),
                diagnostics,
            }
        }
        (Action::Replace, Some(mut prior), Some(mut data)) => {
            let snapshot = prior.clone();
            let mut diagnostics = resource.delete(client, &mut prior).await;
            if diagnostics.has_errors() {
                return ApplyOutcome {
                    state: Some(snapshot),
                    diagnostics,
                };
            }
            diagnostics.extend(resource.create(client, &mut data).await);
            ApplyOutcome {
                state: (!data.is_gone()).then_some(data),
                diagnostics,
            }
        }
        (Action::Delete, Some(mut prior), _) => {
            let snapshot = prior.clone();
            let diagnostics = resource.delete(client, &mut prior).await;
            let state = diagnostics.has_errors().then_some(snapshot);
            ApplyOutcome { state, diagnostics }
        }
        (action, _, _) => ApplyOutcome {
            state: None,
            diagnostics: Diagnostics::error(
                "inconsistent plan",
                format!("{action:?} cannot be applied to the current state"),
            ),
        },
    }
}

/// Re-reads a resource; `None` when it no longer exists remotely.
pub async fn refresh(
    resource: &dyn Resource,
    client: &KeycloakClient,
    mut data: ResourceData,
) -> ApplyOutcome {
    let snapshot = data.clone();
    let diagnostics = resource.read(client, &mut data).await;
    let state = if diagnostics.has_errors() {
        Some(snapshot)
    } else {
        (!data.is_gone()).then_some(data)
    };
    ApplyOutcome { state, diagnostics }
}

/// Imports an existing object and reads it into state.
pub async fn import(
    resource: &dyn Resource,
    client: &KeycloakClient,
    import_id: &str,
) -> ApplyOutcome {
    let data = match resource.import(import_id) {
        Ok(data) => data,
        Err(diagnostics) => {
            return ApplyOutcome {
                state: None,
                diagnostics,
            };
        }
    };

    let mut outcome = refresh(resource, client, data).await;
    if outcome.state.is_none() && !outcome.diagnostics.has_errors() {
        outcome.diagnostics.extend(Diagnostics::error(
            "cannot import non-existent remote object",
            format!("{} {} was not found", resource.type_name(), import_id),
        ));
    }
    if outcome.diagnostics.has_errors() {
        outcome.state = None;
    }
    outcome
}
