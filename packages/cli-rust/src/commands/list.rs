//! bluechi-provision list - List nodes in the inventory

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table};
use console::style;

use super::{Context, roles};

/// Arguments for list command
#[derive(Args)]
pub struct ListArgs {
    /// Show only node names (for scripting)
    #[arg(long)]
    pub names_only: bool,
}

pub fn cmd_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let nodes = ctx.load_nodes()?;

    if nodes.nodes.is_empty() {
        if !ctx.quiet && !args.names_only {
            println!("No nodes configured.");
            println!();
            println!(
                "  {} {}",
                style("Add nodes to:").dim(),
                style(ctx.nodes_path.display()).yellow()
            );
        }
        return Ok(());
    }

    // Names only mode (for scripting)
    if args.names_only || ctx.quiet {
        for name in nodes.nodes.keys() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Host", "User", "Port", "Roles", "Config files"]);

    for (name, node) in &nodes.nodes {
        let (host, port) = node.ssh.target();

        let files: Vec<&str> = node
            .controller
            .as_ref()
            .and_then(|c| c.config_file.as_deref())
            .into_iter()
            .chain(node.agent.as_ref().and_then(|a| a.config_file.as_deref()))
            .collect();
        let files_cell = if files.is_empty() {
            Cell::new("not applied").fg(Color::DarkGrey)
        } else {
            Cell::new(files.join(", ")).fg(Color::Green)
        };

        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(host),
            Cell::new(&node.ssh.user),
            Cell::new(port),
            Cell::new(roles(node)),
            files_cell,
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} {}",
        style("Nodes file:").dim(),
        style(ctx.nodes_path.display()).dim()
    );

    Ok(())
}
