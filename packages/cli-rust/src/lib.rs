//! bluechi-provision CLI - Provision BlueChi nodes over SSH
//!
//! This module contains the shared CLI implementation used by the binary.

mod commands;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use bluechi_provision_core::{config, get_version, load_config};
use clap::{Parser, Subcommand};
use console::style;

use commands::Context;

/// Provision BlueChi controllers and agents over SSH
#[derive(Parser)]
#[command(name = "bluechi-provision")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Provision BlueChi controllers and agents over SSH", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use the no-op client; nothing is sent to any node
    #[arg(long, global = true)]
    mock: bool,

    /// Node inventory to use instead of ~/.config/bluechi-provision/nodes.json
    #[arg(long, global = true, value_name = "PATH")]
    nodes_file: Option<PathBuf>,

    /// Give up on a remote command after this long (e.g. "30s", "2m")
    #[arg(long, global = true, value_name = "DURATION")]
    command_timeout: Option<humantime::Duration>,
}

#[derive(Subcommand)]
enum Commands {
    /// List nodes in the inventory
    List(commands::ListArgs),
    /// Print the config drop-ins a node would receive
    Render(commands::RenderArgs),
    /// Test the SSH connection to a node
    Test(commands::TestArgs),
    /// Install, configure and start BlueChi on a node
    Apply(commands::ApplyArgs),
    /// Rewrite a node's config drop-ins and start its services
    Update(commands::UpdateArgs),
    /// Remove a node's config drop-ins and stop its services
    Destroy(commands::DestroyArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet);

    // Configure color output
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let config_path =
        config::get_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    // Load config (creates default if missing)
    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} Configuration error", style("Error:").red().bold());
            eprintln!();
            eprintln!("  {e:#}");
            eprintln!();
            eprintln!("  Config file: {}", style(config_path.display()).yellow());
            eprintln!();
            eprintln!(
                "  {} Check the config file for syntax errors or unknown fields.",
                style("Tip:").cyan()
            );
            std::process::exit(1);
        }
    };

    let nodes_path = match cli.nodes_file {
        Some(path) => path,
        None => config::get_nodes_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine nodes file path"))?,
    };

    if cli.verbose > 0 {
        eprintln!(
            "{} Config: {}",
            style("[info]").cyan(),
            config_path.display()
        );
        eprintln!("{} Nodes: {}", style("[info]").cyan(), nodes_path.display());
    }

    let mut options = settings.client_options()?;
    if let Some(timeout) = cli.command_timeout {
        options.command_timeout = Some(*timeout);
    }

    let ctx = Context {
        use_mock: cli.mock || settings.use_mock,
        options,
        nodes_path,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::List(args)) => commands::cmd_list(&args, &ctx),
        Some(Commands::Render(args)) => commands::cmd_render(&args, &ctx),
        Some(Commands::Test(args)) => commands::cmd_test(&args, &ctx),
        Some(Commands::Apply(args)) => commands::cmd_apply(&args, &ctx),
        Some(Commands::Update(args)) => commands::cmd_update(&args, &ctx),
        Some(Commands::Destroy(args)) => commands::cmd_destroy(&args, &ctx),
        None => {
            // No command - show a welcome message and hint to use --help
            if !cli.quiet {
                println!(
                    "{} {}",
                    style("bluechi-provision").cyan().bold(),
                    style(get_version()).dim()
                );
                println!();
                println!("Run {} for available commands.", style("--help").green());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::Duration;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bluechi-provision",
            "apply",
            "main",
            "--mock",
            "-vv",
            "--command-timeout",
            "90s",
            "--nodes-file",
            "/tmp/nodes.json",
        ])
        .unwrap();

        assert!(cli.mock);
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.command_timeout.map(|d| *d),
            Some(Duration::from_secs(90))
        );
        assert_eq!(cli.nodes_file, Some(PathBuf::from("/tmp/nodes.json")));
        assert!(matches!(cli.command, Some(Commands::Apply(ref a)) if a.name == "main"));
    }

    #[test]
    fn destroy_accepts_yes() {
        let cli = Cli::try_parse_from(["bluechi-provision", "destroy", "main", "--yes"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Destroy(ref a)) if a.yes));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        assert!(
            Cli::try_parse_from(["bluechi-provision", "list", "--command-timeout", "soon"])
                .is_err()
        );
    }
}
