pub mod config;
pub mod daemon;
pub mod git;
pub mod provision;
pub mod publish;
pub mod schedule;

#[cfg(test)]
mod testutil;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::git::GitCli;
use crate::publish::Publisher;

#[derive(Parser)]
#[command(
    name = "gitpulse",
    about = "Keep a git repository alive with daily heartbeat commits"
)]
struct Cli {
    /// Path to the config file (default: ~/.config/gitpulse/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the working copy and run the scheduler loop
    Run,

    /// Provision the working copy, then exit
    Setup,

    /// Run one publish cycle immediately, then exit
    Publish,

    /// Check dependencies and configuration
    Doctor,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => cmd_run(cli.config.as_deref()),
        Commands::Setup => cmd_setup(cli.config.as_deref()),
        Commands::Publish => cmd_publish(cli.config.as_deref()),
        Commands::Doctor => cmd_doctor(cli.config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(config_path: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    daemon::run(&config)?;
    Ok(())
}

fn cmd_setup(config_path: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    provision::provision(&GitCli::new(), &config.repo_path, &config.remote_url)?;
    println!("Repository ready at {}", config.repo_path.display());
    Ok(())
}

fn cmd_publish(config_path: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    provision::provision(&GitCli::new(), &config.repo_path, &config.remote_url)?;

    let publisher = Publisher::new(config.repo_path.clone(), config.marker_file.clone());
    let summary = publisher.publish()?;

    println!("Published successfully");
    println!("  Timestamp: {}", summary.timestamp);
    println!(
        "  Commit:    {}",
        if summary.commit.len() > 12 {
            &summary.commit[..12]
        } else {
            &summary.commit
        }
    );

    Ok(())
}

fn cmd_doctor(config_path: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("gitpulse system check\n");

    // Check git
    let git_ok = std::process::Command::new("git")
        .args(["--version"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    println!(
        "[{}] git: {}",
        if git_ok { "OK" } else { "FAIL" },
        if git_ok { "available" } else { "not found" }
    );

    // Check config
    let config = Config::load(config_path);
    match &config {
        Ok(c) => {
            println!("[OK] config: remote {}", c.remote_url);
            println!("[OK] schedule: daily at {}", c.commit_time);
        }
        Err(e) => println!("[FAIL] config: {}", e),
    }

    // Check working copy state
    if let Ok(c) = &config {
        let state = if !c.repo_path.exists() {
            "absent (will be cloned on first run)"
        } else if git::repository_exists(&c.repo_path) {
            "valid repository"
        } else {
            "exists but is not a repository (will be REPLACED on first run)"
        };
        println!("[INFO] working copy: {} - {}", c.repo_path.display(), state);
    }

    if !git_ok || config.is_err() {
        std::process::exit(1);
    }

    Ok(())
}
