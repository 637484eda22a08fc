use clap::Parser;
use std::process::ExitCode;

use issuenav::cli::{Cli, Commands};
use issuenav::commands::{
    cmd_action, cmd_assign, cmd_comment, cmd_delete_comment, cmd_edit_comment, cmd_favorites,
    cmd_filter, cmd_plan, cmd_plans, cmd_rule, cmd_search, cmd_severity, cmd_show,
    cmd_transition, cmd_users, load_config,
};
use issuenav::error::Result;

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            fragment,
            pages,
            json,
        } => cmd_search(&config, fragment.as_deref(), pages, json).await,
        Commands::Show { key, json } => cmd_show(&config, &key, json).await,
        Commands::Rule { key } => cmd_rule(&config, &key).await,
        Commands::Comment { key, text } => cmd_comment(&config, &key, &text).await,
        Commands::EditComment { key, comment, text } => {
            cmd_edit_comment(&config, &key, &comment, &text).await
        }
        Commands::DeleteComment { key, comment } => {
            cmd_delete_comment(&config, &key, &comment).await
        }
        Commands::Assign { key, login, me } => {
            cmd_assign(&config, &key, login.as_deref(), me).await
        }
        Commands::Severity { key, severity } => cmd_severity(&config, &key, severity).await,
        Commands::Plan { key, plan } => cmd_plan(&config, &key, plan.as_deref()).await,
        Commands::Plans { project, json } => cmd_plans(&config, &project, json).await,
        Commands::Transition { key, name } => cmd_transition(&config, &key, &name).await,
        Commands::Action { key, action } => cmd_action(&config, &key, &action).await,
        Commands::Favorites { json } => cmd_favorites(&config, json).await,
        Commands::Filter { id, pages, json } => cmd_filter(&config, id, pages, json).await,
        Commands::Users { term } => cmd_users(&config, &term).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
