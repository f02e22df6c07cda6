use anyhow::{Context as _, Result, bail};
use log::{debug, info};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use keycloak_account_provider::config::ProviderConfig;
use keycloak_account_provider::manifest::{Address, Manifest};
use keycloak_account_provider::provider::lifecycle::{self, ApplyOutcome, Plan};
use keycloak_account_provider::provider::{
    Action, Diagnostics, Provider, Resource, builtin_resources,
};
use keycloak_account_provider::state::StateFile;

use super::app::OutputFormat;
use super::output;

/// Global options shared by every command
pub struct Context {
    pub config: Option<PathBuf>,
    pub state: PathBuf,
    pub output: OutputFormat,
}

impl Context {
    fn load_state(&self) -> Result<StateFile> {
        StateFile::load(&self.state)
            .with_context(|| format!("Failed to read state file {:?}", self.state))
    }

    fn save_state(&self, state: &StateFile) -> Result<()> {
        state
            .save(&self.state)
            .with_context(|| format!("Failed to write state file {:?}", self.state))
    }

    async fn provider(&self) -> Result<Provider> {
        let config = ProviderConfig::load(self.config.as_deref())
            .context("Failed to load provider configuration")?;
        debug!("Connecting to {}", config.server_url());
        Provider::configure(&config)
            .await
            .context("Failed to configure Keycloak provider")
    }
}

fn lookup<'a>(resources: &'a [Box<dyn Resource>], resource_type: &str) -> Result<&'a dyn Resource> {
    resources
        .iter()
        .find(|r| r.type_name() == resource_type)
        .map(|r| r.as_ref())
        .with_context(|| format!("Unknown resource type '{}'", resource_type))
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("Failed to read manifest {:?}", path))
}

/// Plans every address present in the manifest or in state
fn compute_plans(
    resources: &[Box<dyn Resource>],
    manifest: &Manifest,
    state: &StateFile,
) -> Result<Vec<(Address, Plan)>> {
    let mut addresses: BTreeSet<Address> = manifest.addresses().cloned().collect();
    addresses.extend(state.resources.iter().map(|r| Address {
        resource_type: r.resource_type.clone(),
        name: r.name.clone(),
    }));

    let mut plans = Vec::new();
    let mut invalid = false;
    for address in addresses {
        let resource = lookup(resources, &address.resource_type)?;
        let prior = state
            .get(&address.resource_type, &address.name)
            .map(|r| &r.data);

        match lifecycle::plan(&resource.schema(), prior, manifest.get(&address)) {
            Ok(plan) => plans.push((address, plan)),
            Err(diags) => {
                output::diagnostics(&address, &diags);
                invalid = true;
            }
        }
    }

    if invalid {
        bail!("Manifest has invalid resources");
    }
    Ok(plans)
}

fn summary(plans: &[(Address, Plan)]) -> String {
    let count = |f: fn(Action) -> bool| plans.iter().filter(|(_, p)| f(p.action)).count();
    format!(
        "Plan: {} to add, {} to change, {} to destroy.",
        count(|a| matches!(a, Action::Create | Action::Replace)),
        count(|a| a == Action::Update),
        count(|a| matches!(a, Action::Delete | Action::Replace)),
    )
}

pub fn plan_command(ctx: &Context, manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let state = ctx.load_state()?;
    let resources = builtin_resources();
    let plans = compute_plans(&resources, &manifest, &state)?;

    match ctx.output {
        OutputFormat::Json => {
            let body: Vec<_> = plans
                .iter()
                .map(|(address, plan)| {
                    json!({ "address": address.to_string(), "action": plan.action, "changes": plan.changes })
                })
                .collect();
            output::json(&body)
        }
        OutputFormat::Table => {
            if plans.iter().all(|(_, p)| p.action == Action::NoOp) {
                output::success("No changes. Keycloak matches the manifest.");
                return Ok(());
            }
            for (address, plan) in &plans {
                output::plan(address, plan);
            }
            println!();
            println!("{}", summary(&plans));
            Ok(())
        }
    }
}

/// Records an outcome in state, saves it and reports diagnostics.
/// Returns true when the step failed.
fn record(
    ctx: &Context,
    state: &mut StateFile,
    address: &Address,
    outcome: ApplyOutcome,
) -> Result<bool> {
    output::diagnostics(address, &outcome.diagnostics);
    state.put(&address.resource_type, &address.name, outcome.state);
    ctx.save_state(state)?;
    Ok(outcome.diagnostics.has_errors())
}

/// How a step that finished without errors is reported
#[derive(Debug, PartialEq)]
enum Completion {
    Clean(String),
    Warned(String),
}

impl Completion {
    fn new(address: &Address, action: Action, diagnostics: &Diagnostics) -> Self {
        if diagnostics.warnings().next().is_some() {
            Self::Warned(format!("{}: {:?} finished with warnings", address, action))
        } else {
            Self::Clean(format!("{}: {:?} complete", address, action))
        }
    }

    fn print(&self) {
        match self {
            Self::Clean(message) => output::success(message),
            Self::Warned(message) => output::info(message),
        }
    }
}

pub async fn apply_command(ctx: &Context, manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let mut state = ctx.load_state()?;
    let resources = builtin_resources();
    let plans = compute_plans(&resources, &manifest, &state)?;

    if plans.iter().all(|(_, p)| p.action == Action::NoOp) {
        output::success("No changes. Keycloak matches the manifest.");
        return Ok(());
    }

    let provider = ctx.provider().await?;
    let mut failures = 0;

    for (address, plan) in plans {
        if plan.action == Action::NoOp {
            continue;
        }
        let resource = provider
            .resource(&address.resource_type)
            .with_context(|| format!("Unknown resource type '{}'", address.resource_type))?;
        let prior = state
            .get(&address.resource_type, &address.name)
            .map(|r| r.data.clone());

        info!("Applying {:?} to {}", plan.action, address);
        let action = plan.action;
        let outcome = lifecycle::apply(resource, provider.client(), prior.as_ref(), plan).await;
        let completion = Completion::new(&address, action, &outcome.diagnostics);
        if record(ctx, &mut state, &address, outcome)? {
            failures += 1;
        } else {
            completion.print();
        }
    }

    if failures > 0 {
        bail!("{} resource(s) failed to apply", failures);
    }
    Ok(())
}

pub async fn refresh_command(ctx: &Context) -> Result<()> {
    let mut state = ctx.load_state()?;
    if state.resources.is_empty() {
        output::info("State is empty, nothing to refresh.");
        return Ok(());
    }

    let provider = ctx.provider().await?;
    let mut failures = 0;

    for entry in state.resources.clone() {
        let address = Address {
            resource_type: entry.resource_type.clone(),
            name: entry.name.clone(),
        };
        let resource = provider
            .resource(&address.resource_type)
            .with_context(|| format!("Unknown resource type '{}'", address.resource_type))?;

        let outcome = lifecycle::refresh(resource, provider.client(), entry.data).await;
        let gone = outcome.state.is_none();
        if record(ctx, &mut state, &address, outcome)? {
            failures += 1;
        } else if gone {
            output::info(&format!("{} no longer exists and was removed from state", address));
        }
    }

    if failures > 0 {
        bail!("{} resource(s) failed to refresh", failures);
    }
    output::success("State refreshed.");
    Ok(())
}

pub async fn destroy_command(ctx: &Context) -> Result<()> {
    let mut state = ctx.load_state()?;
    if state.resources.is_empty() {
        output::info("State is empty, nothing to destroy.");
        return Ok(());
    }

    let provider = ctx.provider().await?;
    let mut failures = 0;

    for entry in state.resources.clone() {
        let address = Address {
            resource_type: entry.resource_type.clone(),
            name: entry.name.clone(),
        };
        let resource = provider
            .resource(&address.resource_type)
            .with_context(|| format!("Unknown resource type '{}'", address.resource_type))?;

        let plan = match lifecycle::plan(&resource.schema(), Some(&entry.data), None) {
            Ok(plan) => plan,
            Err(diags) => {
                output::diagnostics(&address, &diags);
                failures += 1;
                continue;
            }
        };
        let outcome = lifecycle::apply(resource, provider.client(), Some(&entry.data), plan).await;
        if record(ctx, &mut state, &address, outcome)? {
            failures += 1;
        } else {
            output::success(&format!("{} destroyed", address));
        }
    }

    if failures > 0 {
        bail!("{} resource(s) failed to destroy", failures);
    }
    Ok(())
}

pub async fn import_command(ctx: &Context, address: &str, import_id: &str) -> Result<()> {
    let address = Address::parse(address)?;
    let mut state = ctx.load_state()?;
    if state.get(&address.resource_type, &address.name).is_some() {
        bail!("{} is already managed; remove it from state first", address);
    }

    let provider = ctx.provider().await?;
    let resource = provider
        .resource(&address.resource_type)
        .with_context(|| format!("Unknown resource type '{}'", address.resource_type))?;

    let outcome = lifecycle::import(resource, provider.client(), import_id).await;
    if record(ctx, &mut state, &address, outcome)? {
        bail!("Import of {} failed", address);
    }
    output::success(&format!("Imported {} as {}", import_id, address));
    Ok(())
}

pub fn show_command(ctx: &Context) -> Result<()> {
    let state = ctx.load_state()?;

    match ctx.output {
        OutputFormat::Json => output::json(&state),
        OutputFormat::Table => {
            if state.resources.is_empty() {
                output::info("State is empty.");
            }
            for entry in &state.resources {
                println!("{}.{} (id: {})", entry.resource_type, entry.name, entry.data.id());
                for (key, value) in entry.data.attributes() {
                    println!("    {} = {}", key, value);
                }
            }
            Ok(())
        }
    }
}

pub fn schema_command(ctx: &Context) -> Result<()> {
    let schemas: BTreeMap<&str, _> = builtin_resources()
        .iter()
        .map(|r| (r.type_name(), r.schema()))
        .collect();

    match ctx.output {
        OutputFormat::Json => output::json(&schemas),
        OutputFormat::Table => {
            for (type_name, schema) in &schemas {
                println!("{}", type_name);
                for (name, attr) in schema {
                    let mut flags = Vec::new();
                    if attr.required {
                        flags.push("required");
                    }
                    if attr.optional {
                        flags.push("optional");
                    }
                    if attr.computed {
                        flags.push("computed");
                    }
                    if attr.force_new {
                        flags.push("force-new");
                    }
                    println!("    {:<12} {:<8} {}", name, format!("{:?}", attr.value_type), flags.join(", "));
                }
            }
            Ok(())
        }
    }
}
