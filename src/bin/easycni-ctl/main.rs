use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use easycni::config::{EasyCniConfig, Installer, NetworkConfigList};
use easycni::input;

/// A command line tool to configure, install and exercise the easycni plugin
#[derive(Parser)]
#[command(name = "easycni-ctl", author, version, about)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a network configuration list
    Generate {
        /// Subnet (CIDR notation)
        #[arg(long, default_value = "10.10.0.0/24")]
        subnet: String,

        /// Network name
        #[arg(long, default_value = "easycni")]
        name: String,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Install the plugin binary and its network configuration
    Install {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,

        /// Installation directory
        #[arg(long, default_value = "/opt/cni/bin")]
        bin_dir: PathBuf,

        /// CNI configuration directory
        #[arg(long, default_value = "/etc/cni/net.d")]
        conf_dir: PathBuf,

        /// Plugin binary to install
        #[arg(long, default_value = "target/release/easycni")]
        plugin: PathBuf,

        /// Subnet (CIDR notation)
        #[arg(long, default_value = "10.10.0.0/24")]
        subnet: String,

        /// Network name
        #[arg(long, default_value = "easycni")]
        name: String,
    },

    /// Run a CNI plugin the way a container runtime would
    Invoke {
        /// Plugin executable
        plugin: PathBuf,

        /// CNI_COMMAND
        #[arg(long, default_value = "VERSION")]
        command: String,

        /// CNI_CONTAINERID
        #[arg(long, default_value = "")]
        container_id: String,

        /// CNI_NETNS
        #[arg(long, default_value = "")]
        netns: String,

        /// CNI_IFNAME
        #[arg(long, default_value = "eth0")]
        ifname: String,

        /// CNI_ARGS
        #[arg(long, default_value = "")]
        args: String,

        /// CNI_PATH
        #[arg(long, default_value = "/opt/cni/bin")]
        path: String,

        /// Network configuration piped to the plugin's stdin
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

struct Invocation {
    plugin: PathBuf,
    env: Vec<(&'static str, String)>,
    stdin: Option<Vec<u8>>,
}

fn run_invoke(invocation: Invocation) -> Result<i32> {
    let mut child = Command::new(&invocation.plugin)
        .envs(invocation.env.iter().map(|(k, v)| (*k, v.as_str())))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute {}", invocation.plugin.display()))?;

    {
        let mut stdin = child.stdin.take().context("Plugin stdin unavailable")?;
        if let Some(data) = &invocation.stdin {
            stdin.write_all(data).context("Failed to write plugin stdin")?;
        }
        // Dropping stdin closes the pipe so the plugin's drain ends.
    }

    let output = child.wait_with_output().context("Failed to wait for plugin")?;
    print!("{}", String::from_utf8_lossy(&output.stdout));

    let code = output.status.code().unwrap_or(1);
    debug!("plugin exited with {}", code);
    Ok(code)
}

fn confirm(prompt: &str) -> Result<bool> {
    println!("{}", prompt);
    println!("Continue? [y/N]");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging based on verbosity
    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default subscriber")?;

    match cli.command {
        Commands::Generate { subnet, name, output } => {
            subnet
                .parse::<ipnetwork::Ipv4Network>()
                .with_context(|| format!("Invalid subnet {}", subnet))?;
            let config = NetworkConfigList::new(&name, &subnet);

            if let Some(path) = output {
                config.save(&path)?;
                println!("Network configuration written to {}", path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }

        Commands::Install { yes, bin_dir, conf_dir, plugin, subnet, name } => {
            let prompt = format!(
                "This will install easycni to {} and write its configuration to {}.",
                bin_dir.display(),
                conf_dir.display()
            );
            if !yes && !confirm(&prompt)? {
                println!("Installation aborted.");
                return Ok(());
            }

            let installer = Installer::new(EasyCniConfig {
                cni_bin_dir: bin_dir,
                cni_conf_dir: conf_dir,
                network_name: name,
                subnet,
            });
            let target = installer.install(&plugin)?;
            info!("easycni installed");
            println!("easycni installed to {}", target.display());
        }

        Commands::Invoke { plugin, command, container_id, netns, ifname, args, path, config } => {
            let stdin = config
                .map(|p| fs::read(&p).with_context(|| format!("Failed to read {}", p.display())))
                .transpose()?;

            let code = run_invoke(Invocation {
                plugin,
                env: vec![
                    (input::CNI_COMMAND, command),
                    (input::CNI_CONTAINERID, container_id),
                    (input::CNI_NETNS, netns),
                    (input::CNI_IFNAME, ifname),
                    (input::CNI_ARGS, args),
                    (input::CNI_PATH, path),
                ],
                stdin,
            })?;

            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
