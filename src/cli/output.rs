//! Terminal output for plans, diagnostics and state.

use colored::Colorize;
use serde_json::Value;

use keycloak_account_provider::manifest::Address;
use keycloak_account_provider::provider::lifecycle::Plan;
use keycloak_account_provider::provider::{Action, Diagnostics, Severity};

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn diagnostics(address: &Address, diags: &Diagnostics) {
    for diag in diags {
        match diag.severity {
            Severity::Error => eprintln!("{} {}: {}", "Error:".red().bold(), address, diag),
            Severity::Warning => {
                eprintln!("{} {}: {}", "Warning:".yellow().bold(), address, diag)
            }
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "(null)".dimmed().to_string(),
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

pub fn plan(address: &Address, plan: &Plan) {
    let header = match plan.action {
        Action::NoOp => return,
        Action::Create => format!("+ {address} will be created").green(),
        Action::Update => format!("~ {address} will be updated in-place").yellow(),
        Action::Replace => format!("-/+ {address} must be replaced").red(),
        Action::Delete => format!("- {address} will be destroyed").red(),
    };
    println!("{header}");

    for change in &plan.changes {
        let marker = if change.force_new { " (forces replacement)".red().to_string() } else { String::new() };
        match plan.action {
            Action::Create => println!("    {} = {}", change.name, render(&change.after)),
            _ => println!(
                "    {}: {} -> {}{}",
                change.name,
                render(&change.before),
                render(&change.after),
                marker
            ),
        }
    }
}

pub fn json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
