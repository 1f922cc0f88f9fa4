use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use lexa_core::LexaError;

mod commands;
mod context;
mod logging;
mod prompt;

use context::AppContext;

#[derive(Parser)]
#[command(name = "lexa")]
#[command(about = "Lexa - draft contracts by chatting with the drafting backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Configuration file (default: ~/.config/lexa/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the configuration
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Bearer token from a previous `lexa login`
    #[arg(long, global = true, env = "LEXA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log in as this user (password from LEXA_PASSWORD or a prompt)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Also write logs to daily files in DIR (default: ~/.config/lexa/logs)
    #[arg(long, global = true, value_name = "DIR", num_args = 0..=1)]
    pub log_dir: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the access token
    Login,
    /// Show the signed-in user
    Profile,
    /// Store the Gemini API key used by the drafting backend
    SetGeminiKey {
        /// The API key
        key: String,
    },
    /// List contract templates
    Templates,
    /// Start an interactive drafting session
    Draft {
        /// Template id, name or list number
        #[arg(long, short = 't')]
        template: Option<String>,
    },
    /// Download a rendered contract by its link
    Download {
        /// Link returned by the drafting backend
        link: String,

        /// Output directory (default: download_dir from the configuration)
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.global.log_dir.as_ref())?;

    let result = run(cli).await;
    if let Err(e) = &result
        && e.downcast_ref::<LexaError>()
            .is_some_and(LexaError::is_unauthorized)
    {
        eprintln!(
            "{}",
            "Your credentials were rejected. Run `lexa --username <name> login` again.".yellow()
        );
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(&cli.global)?;

    match cli.command {
        Commands::Login => commands::auth::login(&ctx, &cli.global).await?,
        Commands::Profile => commands::auth::profile(&ctx, &cli.global).await?,
        Commands::SetGeminiKey { key } => {
            commands::auth::set_gemini_key(&ctx, &cli.global, &key).await?
        }
        Commands::Templates => commands::templates::list(&ctx, &cli.global).await?,
        Commands::Draft { template } => {
            commands::draft::run(&ctx, &cli.global, template.as_deref()).await?
        }
        Commands::Download { link, out } => {
            commands::download::run(&ctx, &cli.global, &link, out).await?
        }
    }

    Ok(())
}
