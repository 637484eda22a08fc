use owo_colors::OwoColorize;

use super::navigator;
use crate::detail::{ActionController, ActionForm};
use crate::error::{NavigatorError, Result};
use crate::remote::Config;
use crate::types::Severity;

async fn open(config: &Config, key: &str) -> Result<ActionController> {
    navigator(config)?.open_detail(key).await
}

fn done(controller: &ActionController, what: &str) {
    println!("{} {}", controller.issue().key.cyan(), what);
}

pub async fn cmd_comment(config: &Config, key: &str, text: &str) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.open_comment()?;
    controller.form_mut()?.set_text(text)?;
    controller.submit().await?;
    done(&controller, "commented");
    Ok(())
}

pub async fn cmd_edit_comment(config: &Config, key: &str, comment: &str, text: &str) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.open_edit_comment(comment)?;
    controller.form_mut()?.set_text(text)?;
    controller.submit().await?;
    done(&controller, &format!("comment {comment} updated"));
    Ok(())
}

pub async fn cmd_delete_comment(config: &Config, key: &str, comment: &str) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.delete_comment(comment).await?;
    done(&controller, &format!("comment {comment} deleted"));
    Ok(())
}

/// Assign to `login`, to the current user with `me`, or unassign.
pub async fn cmd_assign(config: &Config, key: &str, login: Option<&str>, me: bool) -> Result<()> {
    let mut controller = open(config, key).await?;
    if me {
        controller.assign_to_me().await?;
    } else {
        controller.open_assign()?;
        if let ActionForm::Assign { assignee, .. } = controller.form_mut()? {
            *assignee = login.map(str::to_string);
        }
        controller.submit().await?;
    }

    let assignee = controller.issue().assignee.as_deref().unwrap_or("nobody");
    done(&controller, &format!("assigned to {assignee}"));
    Ok(())
}

pub async fn cmd_severity(config: &Config, key: &str, severity: Severity) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.open_set_severity()?;
    if let ActionForm::SetSeverity { severity: pending } = controller.form_mut()? {
        *pending = severity;
    }
    controller.submit().await?;
    done(&controller, &format!("severity set to {severity}"));
    Ok(())
}

/// Plan the issue in the plan matching `plan` by key or name, or unplan it.
pub async fn cmd_plan(config: &Config, key: &str, plan: Option<&str>) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.open_plan().await?;
    if let ActionForm::Plan { plans, selected } = controller.form_mut()? {
        *selected = match plan {
            Some(wanted) => {
                let found = plans
                    .iter()
                    .find(|p| p.key == wanted || p.name.eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| NavigatorError::NotFound(format!("action plan '{wanted}'")))?;
                Some(found.key.clone())
            }
            None => None,
        };
    }
    controller.submit().await?;

    match &controller.issue().action_plan {
        Some(plan) => done(&controller, &format!("planned in {plan}")),
        None => done(&controller, "removed from its action plan"),
    }
    Ok(())
}

pub async fn cmd_transition(config: &Config, key: &str, name: &str) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.transition(name).await?;
    let status = controller
        .issue()
        .status
        .map(|s| s.to_string())
        .unwrap_or_default();
    done(&controller, &format!("is now {status}"));
    Ok(())
}

pub async fn cmd_action(config: &Config, key: &str, action: &str) -> Result<()> {
    let mut controller = open(config, key).await?;
    controller.do_action(action).await?;
    done(&controller, &format!("action {action} applied"));
    Ok(())
}
