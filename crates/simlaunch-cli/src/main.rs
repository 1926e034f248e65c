mod args_cmd;
mod check_cmd;
mod config;
mod launch_cmd;
mod resolve;
mod show_cmd;

#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use config::SimlaunchConfig;

#[derive(Parser)]
#[command(name = "simlaunch", version, about = "Declarative launch orchestrator for simulation process topologies")]
struct Cli {
    /// Install prefix to search for packages; repeat to add more
    /// (overrides SIMLAUNCH_PREFIX_PATH, AMENT_PREFIX_PATH and the config file)
    #[arg(long = "prefix", global = true, value_name = "DIR")]
    prefixes: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a simlaunch config file listing install prefixes
    Init {
        /// Install prefixes, searched in the given order
        #[arg(required = true, value_name = "PREFIX")]
        install_prefixes: Vec<PathBuf>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Show the arguments a launch description declares
    Args {
        /// `<file>` or `<package> <file>`
        #[arg(required = true, value_name = "TARGET")]
        target: Vec<String>,
    },
    /// Load and validate a launch description without running anything
    Check {
        /// `<file>` or `<package> <file>`, then `name:=value` overrides
        #[arg(required = true, value_name = "TARGET")]
        target: Vec<String>,
        /// Print the assembled plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a launch description and print the processes it would start
    Show {
        /// `<file>` or `<package> <file>`, then `name:=value` overrides
        #[arg(required = true, value_name = "TARGET")]
        target: Vec<String>,
    },
    /// Start every process of a launch description and supervise them
    Launch {
        /// `<file>` or `<package> <file>`, then `name:=value` overrides
        #[arg(required = true, value_name = "TARGET")]
        target: Vec<String>,
        /// Seconds each process gets to exit after SIGTERM before it is killed
        #[arg(long, default_value_t = 5)]
        grace: u64,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Execute the `simlaunch init` command: write config file.
fn cmd_init(install_prefixes: &[PathBuf], force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let prefixes = install_prefixes
        .iter()
        .map(|prefix| {
            std::path::absolute(prefix)
                .with_context(|| format!("invalid install prefix {}", prefix.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for prefix in &prefixes {
        if !prefix.is_dir() {
            tracing::warn!(prefix = %prefix.display(), "install prefix does not exist yet");
        }
    }

    let cfg = config::ConfigFile {
        packages: config::PackagesSection {
            prefixes: prefixes.clone(),
        },
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    for prefix in &prefixes {
        println!("  prefix = {}", prefix.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            install_prefixes,
            force,
        } => {
            cmd_init(&install_prefixes, force)?;
        }
        Commands::Args { target } => {
            let resolved = SimlaunchConfig::resolve(&cli.prefixes)?;
            let target = resolve::resolve_target(&target, &resolved.packages)?;
            args_cmd::run_args(&target, &resolved.packages)?;
        }
        Commands::Check { target, json } => {
            let resolved = SimlaunchConfig::resolve(&cli.prefixes)?;
            let target = resolve::resolve_target(&target, &resolved.packages)?;
            check_cmd::run_check(&target, &resolved.packages, json)?;
        }
        Commands::Show { target } => {
            let resolved = SimlaunchConfig::resolve(&cli.prefixes)?;
            let target = resolve::resolve_target(&target, &resolved.packages)?;
            show_cmd::run_show(&target, &resolved.packages)?;
        }
        Commands::Launch { target, grace } => {
            let resolved = SimlaunchConfig::resolve(&cli.prefixes)?;
            let target = resolve::resolve_target(&target, &resolved.packages)?;
            launch_cmd::run_launch(&target, &resolved.packages, Duration::from_secs(grace)).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "simlaunch", &mut std::io::stdout());
        }
    }

    Ok(())
}
