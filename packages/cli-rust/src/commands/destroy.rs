//! bluechi-provision destroy - Remove BlueChi configuration from a node

use anyhow::{Result, bail};
use bluechi_provision_core::node::destroy_node;
use clap::Args;
use console::style;
use dialoguer::Confirm;

use super::Context;
use crate::output::{CommandSpinner, show_node_error};

/// Arguments for destroy command
#[derive(Args)]
pub struct DestroyArgs {
    /// Name of the node to destroy
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub fn cmd_destroy(args: &DestroyArgs, ctx: &Context) -> Result<()> {
    let mut nodes = ctx.load_nodes()?;
    let node = ctx.node(&nodes, &args.name)?;

    if !args.yes {
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Remove the BlueChi drop-ins from '{}' and stop its services?",
                args.name
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            if !ctx.quiet {
                println!("Cancelled.");
            }
            return Ok(());
        }
    }

    let mut client = ctx.client_for(&node)?;
    let spinner = CommandSpinner::new_maybe(
        &format!("Destroying node {}...", style(&args.name).cyan()),
        ctx.quiet,
    );

    if let Err(e) = destroy_node(client.as_mut(), &node) {
        spinner.fail(&format!("Failed to destroy node {}", args.name));
        if !ctx.quiet {
            show_node_error(&e, &node);
        }
        bail!("Destroy of node '{}' failed", args.name);
    }
    spinner.success(&format!("Destroyed node {}", args.name));

    // Forget the recorded drop-ins; the node stays in the inventory
    if !ctx.use_mock {
        let stored = nodes.get_node_mut(&args.name)?;
        if let Some(controller) = stored.controller.as_mut() {
            controller.config_file = None;
        }
        if let Some(agent) = stored.agent.as_mut() {
            agent.config_file = None;
        }
        ctx.save_nodes(&nodes)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{mock_context, sample_nodes};
    use tempfile::TempDir;

    #[test]
    fn destroy_with_yes_and_mock() {
        let dir = TempDir::new().unwrap();
        let ctx = mock_context(&dir);
        ctx.save_nodes(&sample_nodes()).unwrap();

        let args = DestroyArgs {
            name: "main".to_string(),
            yes: true,
        };
        cmd_destroy(&args, &ctx).unwrap();
        assert!(ctx.load_nodes().unwrap().has_node("main"));
    }
}
