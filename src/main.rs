use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;

use cli::commands::{self, Context};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        cli::output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(log_file: Option<&std::path::Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_file.as_deref())?;
    info!("Starting kc-account");

    let ctx = Context {
        config: cli.config,
        state: cli.state,
        output: cli.output,
    };

    match cli.command {
        Commands::Plan { manifest } => commands::plan_command(&ctx, &manifest),
        Commands::Apply { manifest } => commands::apply_command(&ctx, &manifest).await,
        Commands::Refresh => commands::refresh_command(&ctx).await,
        Commands::Destroy => commands::destroy_command(&ctx).await,
        Commands::Import { address, id } => commands::import_command(&ctx, &address, &id).await,
        Commands::Show => commands::show_command(&ctx),
        Commands::Schema => commands::schema_command(&ctx),
    }
}
