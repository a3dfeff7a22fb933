//! bluechi-provision apply - Install, configure and start BlueChi on a node

use anyhow::{Result, bail};
use bluechi_provision_core::node::{NodeConfig, NodesFile, apply_node};
use clap::Args;
use console::style;

use super::{Context, roles};
use crate::output::{CommandSpinner, show_node_error};

/// Arguments for apply command
#[derive(Args)]
pub struct ApplyArgs {
    /// Name of the node to apply
    pub name: String,
}

pub fn cmd_apply(args: &ApplyArgs, ctx: &Context) -> Result<()> {
    let mut nodes = ctx.load_nodes()?;
    let mut node = ctx.node(&nodes, &args.name)?;
    let mut client = ctx.client_for(&node)?;

    if ctx.verbose > 0 && !ctx.quiet {
        eprintln!(
            "{} Roles on {}: {}{}",
            style("[info]").cyan(),
            args.name,
            roles(&node),
            if node.install { " (with package install)" } else { "" }
        );
    }

    let spinner = CommandSpinner::new_maybe(
        &format!("Applying node {}...", style(&args.name).cyan()),
        ctx.quiet,
    );

    if let Err(e) = apply_node(client.as_mut(), &mut node) {
        spinner.fail(&format!("Failed to apply node {}", args.name));
        // Drop-ins written before the failure stay recorded
        if !ctx.use_mock {
            if let Err(save_err) = record_applied(ctx, &mut nodes, &args.name, &node) {
                tracing::warn!(
                    "Could not record partial apply of '{}': {:#}",
                    args.name,
                    save_err
                );
            }
        }
        if !ctx.quiet {
            show_node_error(&e, &node);
        }
        bail!("Apply of node '{}' failed", args.name);
    }
    spinner.success(&format!("Applied node {}", args.name));

    // Dry runs leave the inventory untouched
    if !ctx.use_mock {
        record_applied(ctx, &mut nodes, &args.name, &node)?;
    }

    Ok(())
}

/// Store the node, with its recorded drop-in names, back into the inventory
fn record_applied(
    ctx: &Context,
    nodes: &mut NodesFile,
    name: &str,
    node: &NodeConfig,
) -> Result<()> {
    *nodes.get_node_mut(name)? = node.clone();
    ctx.save_nodes(nodes)
}
