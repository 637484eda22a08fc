mod actions;
mod filters;
mod search;
mod show;

pub use actions::{
    cmd_action, cmd_assign, cmd_comment, cmd_delete_comment, cmd_edit_comment, cmd_plan,
    cmd_severity, cmd_transition,
};
pub use filters::{cmd_favorites, cmd_plans, cmd_users};
pub use search::{cmd_filter, cmd_search};
pub use show::{cmd_rule, cmd_show};

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::navigator::IssueNavigator;
use crate::remote::{Config, HttpIssueService, IssueService};

/// Load the config from `path`, or from the default location, with
/// environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::load_file(path)?;
            config.apply_env();
            config
        }
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

pub fn connect(config: &Config) -> Result<Arc<dyn IssueService>> {
    Ok(Arc::new(HttpIssueService::from_config(config)?))
}

pub fn navigator(config: &Config) -> Result<IssueNavigator> {
    Ok(IssueNavigator::new(connect(config)?, config))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
