use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod dispatch;

#[derive(Parser)]
#[command(name = "psh")]
#[command(about = "Run a command or copy a file on every tagged host in parallel", long_about = None)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which hosts a run touches.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Tag filter, e.g. "Name=web,env=prod"
    #[arg(short, long, default_value = "")]
    pub tags: String,

    /// Address to dial: public or private
    #[arg(short, long = "ip-type")]
    pub ip_type: Option<String>,

    /// Inventory file (defaults to the one next to the config file)
    #[arg(long)]
    pub inventory: Option<String>,
}

/// How to log in, and whether to ask first.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Remote username
    #[arg(short, long)]
    pub user: Option<String>,

    /// Path to the private key
    #[arg(short = 'p', long = "private-key")]
    pub private_key: Option<String>,

    /// SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// Verify host keys against ~/.ssh/known_hosts
    #[arg(long)]
    pub strict_host_key: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a shell command on every target
    Ssh {
        #[command(flatten)]
        targets: TargetArgs,

        #[command(flatten)]
        session: SessionArgs,

        /// Command to execute
        #[arg(short, long)]
        command: String,
    },

    /// Copy a local file to every target
    Scp {
        #[command(flatten)]
        targets: TargetArgs,

        #[command(flatten)]
        session: SessionArgs,

        /// Local source file
        #[arg(short, long)]
        source: PathBuf,

        /// Remote destination path
        #[arg(short, long)]
        dest: String,

        /// Octal permission for the remote file
        #[arg(short = 'm', long, default_value = "0644")]
        permission: String,

        /// Decompress the file after copying
        #[arg(short = 'z', long)]
        decompress: bool,

        /// Create the destination directory if it does not exist
        #[arg(short = 'c', long)]
        create_dir: bool,
    },

    /// List the targets a filter resolves to
    Targets {
        #[command(flatten)]
        targets: TargetArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or initialize the config file
    Config {
        /// Print the config file path
        #[arg(long)]
        path: bool,

        /// Write sample config and inventory files
        #[arg(long)]
        init: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    use Commands::*;

    let all_succeeded = match cli.command {
        Ssh {
            targets,
            session,
            command,
        } => {
            let config = dispatch::load_config()?;
            commands::ssh::run(&config, &targets, &session, command).await?
        }
        Scp {
            targets,
            session,
            source,
            dest,
            permission,
            decompress,
            create_dir,
        } => {
            let config = dispatch::load_config()?;
            let options = commands::scp::ScpOptions {
                source,
                dest,
                permission,
                decompress,
                create_dir,
            };
            commands::scp::run(&config, &targets, &session, options).await?
        }
        Targets { targets, json } => {
            let config = dispatch::load_config()?;
            commands::targets::run(&config, &targets, json)?;
            true
        }
        Config { path, init } => {
            commands::config::run(path, init)?;
            true
        }
    };

    if !all_succeeded {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_flags_parse() {
        let cli = Cli::try_parse_from([
            "psh", "ssh", "-t", "env=prod", "-u", "admin", "-p", "~/.ssh/deploy", "-c", "uptime",
        ])
        .unwrap();

        match cli.command {
            Commands::Ssh {
                targets,
                session,
                command,
            } => {
                assert_eq!(targets.tags, "env=prod");
                assert_eq!(session.user.as_deref(), Some("admin"));
                assert_eq!(session.private_key.as_deref(), Some("~/.ssh/deploy"));
                assert_eq!(command, "uptime");
            }
            _ => panic!("expected ssh subcommand"),
        }
    }

    #[test]
    fn test_scp_defaults() {
        let cli = Cli::try_parse_from(["psh", "scp", "-s", "app.tar.gz", "-d", "/opt/app/app.tar.gz", "-z"])
            .unwrap();

        match cli.command {
            Commands::Scp {
                permission,
                decompress,
                create_dir,
                ..
            } => {
                assert_eq!(permission, "0644");
                assert!(decompress);
                assert!(!create_dir);
            }
            _ => panic!("expected scp subcommand"),
        }
    }
}
