//! CLI Module
//!
//! Command-line interface for CrabVoice using Clap v4.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::brain::GeminiClient;
use crate::channels::VoiceBotAgent;
use crate::config::Config;
use crate::relay::MediaRelayClient;
use crate::session::SessionGate;
use crate::speech::SpeechSynthesizer;

/// CrabVoice - Telegram Voice-Chat AI Companion Bot
#[derive(Parser, Debug)]
#[command(name = "crabvoice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in .crabvoice/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot (default)
    Run,

    /// Show configuration
    Config {
        /// Show full configuration including secrets
        #[arg(short, long)]
        show_secrets: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Main CLI entry point
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Run) => cmd_run(&config).await,
        Some(Commands::Config { show_secrets }) => cmd_config(&config, show_secrets),
        Some(Commands::Init { force }) => cmd_init(force),
    }
}

/// Load configuration from file or defaults
fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    config.validate()?;
    Ok(config)
}

/// Start the bot
async fn cmd_run(config: &Config) -> Result<()> {
    println!("🦀 Starting CrabVoice...\n");

    // Missing credentials are a startup failure: abort before any network I/O.
    let creds = config
        .credentials()
        .context("Cannot start without required credentials")?;

    let gate = Arc::new(SessionGate::new());

    let relay = Arc::new(MediaRelayClient::new(
        config.relay.base_url.clone(),
        config.relay.keepalive_stream.clone(),
        creds.api_id,
        creds.api_hash.clone(),
        creds.session_string.clone(),
    ));

    let mut brain = GeminiClient::new(creds.gemini_api_key.clone());
    if let Some(ref model) = config.gemini.model {
        brain = brain.with_model(model.clone());
    }

    let speech =
        SpeechSynthesizer::new(config.speech.base_url.clone()).with_voice(config.speech.voice.clone());

    let agent = VoiceBotAgent::new(creds.bot_token.clone(), gate, relay, brain, speech);

    if let Err(e) = agent.run().await {
        tracing::error!(kind = e.kind(), "Fatal: {}", e);
        return Err(e).context("Bot terminated");
    }

    println!("\n👋 Goodbye!");
    Ok(())
}

/// Show configuration
fn cmd_config(config: &Config, show_secrets: bool) -> Result<()> {
    println!("🦀 CrabVoice Configuration\n");

    if show_secrets {
        println!("{:#?}", config);
    } else {
        println!("Relay bridge: {}", config.relay.base_url);
        println!("TTS gateway:  {}", config.speech.base_url);
        println!("TTS voice:    {}", config.speech.voice);
        println!(
            "Gemini model: {}",
            config.gemini.model.as_deref().unwrap_or("gemini-2.5-flash")
        );
        println!("Log level:    {}", config.logging.level);

        println!("\nCredentials:");
        print_presence("TELEGRAM_API_ID", config.telegram.api_id.is_some());
        print_presence("TELEGRAM_API_HASH", config.telegram.api_hash.is_some());
        print_presence("TELEGRAM_SESSION", config.telegram.session_string.is_some());
        print_presence("TELEGRAM_BOT_TOKEN", config.telegram.bot_token.is_some());
        print_presence("GEMINI_API_KEY", config.gemini.api_key.is_some());

        println!("\n💡 Use --show-secrets to display full values");
    }

    Ok(())
}

fn print_presence(name: &str, set: bool) {
    println!("  - {:<20} {}", name, if set { "[SET]" } else { "[NOT SET]" });
}

/// Initialize configuration file
fn cmd_init(force: bool) -> Result<()> {
    println!("🦀 CrabVoice Configuration Initialization\n");

    let config_path = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("crabvoice")
        .join("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    let default_config = Config::default();
    default_config.save(&config_path)?;

    println!("✅ Configuration initialized at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Export TELEGRAM_API_ID, TELEGRAM_API_HASH, TELEGRAM_SESSION");
    println!("   2. Export TELEGRAM_BOT_TOKEN and GEMINI_API_KEY");
    println!("   3. Run 'crabvoice' and send '/Vc on' in your group");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_command_is_run() {
        let cli = Cli::parse_from(["crabvoice"]);
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_config_show_secrets_flag() {
        let cli = Cli::parse_from(["crabvoice", "config", "--show-secrets"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config { show_secrets: true })
        ));
    }
}
