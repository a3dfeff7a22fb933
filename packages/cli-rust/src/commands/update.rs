//! bluechi-provision update - Rewrite the config drop-ins of an applied node

use anyhow::{Result, bail};
use bluechi_provision_core::node::update_node;
use clap::Args;
use console::style;

use super::Context;
use crate::output::{CommandSpinner, show_node_error};

/// Arguments for update command
#[derive(Args)]
pub struct UpdateArgs {
    /// Name of the node to update
    pub name: String,
}

pub fn cmd_update(args: &UpdateArgs, ctx: &Context) -> Result<()> {
    let nodes = ctx.load_nodes()?;
    let node = ctx.node(&nodes, &args.name)?;
    let mut client = ctx.client_for(&node)?;

    let spinner = CommandSpinner::new_maybe(
        &format!("Updating node {}...", style(&args.name).cyan()),
        ctx.quiet,
    );

    match update_node(client.as_mut(), &node) {
        Ok(()) => {
            spinner.success(&format!("Updated node {}", args.name));
            Ok(())
        }
        Err(e) => {
            spinner.fail(&format!("Failed to update node {}", args.name));
            if !ctx.quiet {
                show_node_error(&e, &node);
            }
            bail!("Update of node '{}' failed", args.name);
        }
    }
}
