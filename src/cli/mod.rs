pub mod app;
pub mod commands;
pub mod output;

pub use app::{Cli, Commands};
