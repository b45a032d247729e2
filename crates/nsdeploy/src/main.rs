mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nsdeploy")]
#[command(about = "Deploy SuiteScript files to the NetSuite File Cabinet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files (suitetalk) or deploy a SuiteCloud project (sdf)
    Deploy(DeployArgs),
    /// Inspect or reset the deploy cache
    #[command(subcommand)]
    Cache(CacheCommands),
    /// Show version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    /// Files to upload (suitetalk)
    pub files: Vec<PathBuf>,
    /// Deployment method: suitetalk or sdf
    #[arg(short, long, env = "NSDEPLOY_METHOD")]
    pub method: Option<String>,
    /// Target environment: production, sandbox, beta or eu
    #[arg(short, long, env = "NSDEPLOY_ENVIRONMENT")]
    pub environment: Option<String>,
    /// NetSuite account id
    #[arg(long, env = "NSDEPLOY_ACCOUNT")]
    pub account: Option<String>,
    #[arg(long, env = "NSDEPLOY_EMAIL")]
    pub email: Option<String>,
    #[arg(long, env = "NSDEPLOY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Internal id of the login role
    #[arg(long, env = "NSDEPLOY_ROLE")]
    pub role: Option<String>,
    /// Local directory mirrored at --path
    #[arg(short, long)]
    pub base: Option<PathBuf>,
    /// Destination folder in the File Cabinet (e.g. /SuiteScripts/MyApp)
    #[arg(short, long)]
    pub path: Option<String>,
    /// SuiteCloud project folder (sdf)
    #[arg(long, conflicts_with = "files")]
    pub project: Option<PathBuf>,
    /// Config file (default: nsdeploy.yaml discovery)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub cache_file: Option<PathBuf>,
    /// Fail when sdfcli exits with a non-zero status
    #[arg(long)]
    pub strict_exit: bool,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cached domains and folder ids
    Show {
        /// Only this environment
        #[arg(short, long)]
        environment: Option<String>,
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },
    /// Forget cached domains and folder ids
    Clear {
        /// Only this environment
        #[arg(short, long)]
        environment: Option<String>,
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries sdfcli output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Deploy(args) => commands::deploy::handle(args).await,
        Commands::Cache(CacheCommands::Show {
            environment,
            cache_file,
        }) => commands::cache::handle_show(environment.as_deref(), cache_file).await,
        Commands::Cache(CacheCommands::Clear {
            environment,
            cache_file,
        }) => commands::cache::handle_clear(environment.as_deref(), cache_file).await,
        Commands::Version => {
            println!("nsdeploy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
