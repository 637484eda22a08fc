use serde_json::json;

use super::{navigator, print_json};
use crate::display::{IssueJson, print_issue_detail, print_rule};
use crate::error::Result;
use crate::remote::Config;

/// Show an issue with its source context.
pub async fn cmd_show(config: &Config, key: &str, json: bool) -> Result<()> {
    let nav = navigator(config)?;
    let controller = nav.open_detail(key).await?;
    let detail = controller.detail();

    if json {
        return print_json(&json!({
            "issue": IssueJson::from(&detail.issue),
            "source": detail.source,
        }));
    }

    print_issue_detail(detail);
    Ok(())
}

/// Show the rule an issue violates.
pub async fn cmd_rule(config: &Config, key: &str) -> Result<()> {
    let nav = navigator(config)?;
    let mut controller = nav.open_detail(key).await?;
    print_rule(controller.ensure_rule().await?);
    Ok(())
}
