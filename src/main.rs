// Stackwatch - GitOps stack health monitor
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use stackwatch::config::Config;
use stackwatch::monitor::models::format_bytes;
use stackwatch::monitor::Monitor;
use stackwatch::version::build_info;

#[derive(Parser, Debug)]
#[command(name = "stackwatch")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Liveness of the monitor itself
    Check,
    /// Aggregated health snapshot across all subsystems
    Snapshot,
    /// System-wide CPU/memory/disk summary
    Resources,
    /// Top OS processes by CPU usage
    Top {
        /// Number of processes to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Only orchestration-related processes
        #[arg(long)]
        orchestration: bool,
    },
    /// Active threshold alerts
    Alerts,
    /// Managed processes: all of them, or one by name
    Managed { name: Option<String> },
    /// Trailing log lines of a managed process
    Logs {
        name: String,
        /// Number of trailing lines
        #[arg(short, long, default_value_t = 100)]
        tail: usize,
    },
    /// Start a managed process
    Start { name: String },
    /// Stop a managed process
    Stop { name: String },
    /// Restart a managed process
    Restart { name: String },
    /// Terminate-and-relaunch an OS process by pid
    RestartPid { pid: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle version flag
    if cli.version {
        println!("{}", build_info().format_display());
        return Ok(());
    }

    // Logs go to stderr so command output stays pipeable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(cli.config.map(std::path::PathBuf::from))?;
    let monitor = Monitor::new(&config)?;

    match cli.command.unwrap_or(Command::Snapshot) {
        Command::Check => print_json(&monitor.health())?,
        Command::Snapshot => print_json(&monitor.cluster_snapshot().await)?,
        Command::Resources => {
            let resources = monitor.system_resources().await;
            println!(
                "CPU:    {:.1}% across {} cores",
                resources.cpu_percent, resources.cpu_count
            );
            println!(
                "Memory: {} ({:.1}%)",
                resources.memory_formatted(),
                resources.memory_percent
            );
            println!(
                "Disk:   {:.1}% used, {} free",
                resources.disk_usage_percent,
                format_bytes(resources.disk_free_bytes)
            );
            println!(
                "Load:   {:.2} {:.2} {:.2}",
                resources.load_average[0], resources.load_average[1], resources.load_average[2]
            );
        }
        Command::Top {
            limit,
            orchestration,
        } => {
            let processes = if orchestration {
                monitor.orchestration_processes().await
            } else {
                monitor.top_processes(limit).await
            };
            for process in processes.into_iter().take(limit) {
                println!(
                    "{:>8}  {:>6.1}%  {:>12}  {:<24} {}",
                    process.id.to_string(),
                    process.cpu_percent,
                    process.memory_formatted(),
                    process.name,
                    process.state
                );
            }
        }
        Command::Alerts => print_json(&monitor.alerts().await)?,
        Command::Managed { name: Some(name) } => match monitor.managed_process(&name).await? {
            Some(process) => print_json(&process)?,
            None => anyhow::bail!("managed process '{}' not found", name),
        },
        Command::Managed { name: None } => print_json(&monitor.managed_processes().await?)?,
        Command::Logs { name, tail } => {
            for line in monitor.managed_logs(&name, tail).await? {
                println!("{}", line);
            }
        }
        Command::Start { name } => print_json(&monitor.start_managed(&name).await)?,
        Command::Stop { name } => print_json(&monitor.stop_managed(&name).await)?,
        Command::Restart { name } => print_json(&monitor.restart_managed(&name).await)?,
        Command::RestartPid { pid } => print_json(&monitor.restart_os_process(pid).await)?,
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
