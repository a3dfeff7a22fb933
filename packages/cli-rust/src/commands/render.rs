//! bluechi-provision render - Print the config drop-ins of a node

use anyhow::Result;
use bluechi_provision_core::client::ServiceKind;
use bluechi_provision_core::node::{
    AGENT_FILE_SUFFIX, CONTROLLER_FILE_SUFFIX, NodeConfig, config_file_name,
};
use clap::Args;
use console::style;

use super::Context;

/// Arguments for render command
#[derive(Args)]
pub struct RenderArgs {
    /// Name of the node to render
    pub name: String,
}

/// Remote path and contents of every drop-in the node would receive
pub fn rendered_files(node: &NodeConfig) -> Vec<(String, String)> {
    let mut files = Vec::new();
    if let Some(controller) = &node.controller {
        let file = controller
            .config_file
            .clone()
            .unwrap_or_else(|| config_file_name(CONTROLLER_FILE_SUFFIX));
        files.push((
            ServiceKind::Controller.config_path(&file),
            controller.config.render(),
        ));
    }
    if let Some(agent) = &node.agent {
        let file = agent
            .config_file
            .clone()
            .unwrap_or_else(|| config_file_name(AGENT_FILE_SUFFIX));
        files.push((ServiceKind::Agent.config_path(&file), agent.config.render()));
    }
    files
}

pub fn cmd_render(args: &RenderArgs, ctx: &Context) -> Result<()> {
    let nodes = ctx.load_nodes()?;
    let node = ctx.node(&nodes, &args.name)?;

    let files = rendered_files(&node);
    if files.is_empty() && !ctx.quiet {
        eprintln!(
            "{} Node '{}' has neither a controller nor an agent section.",
            style("Note:").yellow(),
            args.name
        );
    }

    for (i, (path, contents)) in files.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if !ctx.quiet {
            println!("{}", style(format!("# {path}")).dim());
        }
        print!("{contents}");
    }

    Ok(())
}
