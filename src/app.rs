//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config;
use crate::logging;
use crate::setup;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// Upload audio in the browser and get a transcription from a hosted Whisper model
#[derive(Parser)]
#[command(name = "transcribe")]
#[command(version)]
#[command(about = "Audio-to-text transcription through a hosted Whisper model")]
#[command(long_about = "Audio-to-text transcription through a hosted Whisper model.\n\nServes a small web page where users upload an audio file and receive its\ntranscription. The speech-to-text work is done by openai/whisper on Replicate.\n\nDEFAULT COMMAND:\n    If no command is specified, 'serve' is used.\n\nEXAMPLES:\n    # Start the web UI on the configured address\n    $ transcribe\n\n    # Start the web UI on all interfaces, port 8080\n    $ transcribe serve --host 0.0.0.0 --port 8080\n\n    # Transcribe a German recording from the command line\n    $ transcribe file memo.mp3 --language de --no-translate\n\n    # List supported language codes\n    $ transcribe languages")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/transcribe/transcribe.toml\n    Secrets file:       ~/.config/transcribe/secrets.toml\n    Logs:               ~/.local/state/transcribe/transcribe.log.*\n    API token:          REPLICATE_API_TOKEN overrides the secrets file"
)]
struct Cli {
    /// Use this config file instead of ~/.config/transcribe/transcribe.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web UI (default)
    #[command(visible_alias = "s")]
    Serve {
        /// Interface to bind, overrides [server] host
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides [server] port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Transcribe a local audio file and print the text
    ///
    /// Examples:
    ///   transcribe file recording.wav
    ///   transcribe file memo.mp3 --language de
    ///   transcribe file meeting.wav -o transcript.txt
    #[command(visible_alias = "f")]
    File {
        /// Path to the audio file to transcribe
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Origin language code (see `transcribe languages`)
        #[arg(short, long, value_name = "CODE")]
        language: Option<String>,

        /// Translate into English
        #[arg(long, conflicts_with = "no_translate")]
        translate: bool,

        /// Keep the spoken language
        #[arg(long)]
        no_translate: bool,

        /// Write transcription to file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<String>,
    },

    /// List supported origin language codes
    #[command(visible_alias = "l")]
    Languages,

    /// Open configuration file in your preferred editor
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   transcribe completions bash > transcribe.bash
    ///   transcribe completions zsh > _transcribe
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolves the config file path, writing defaults on first run.
///
/// An explicitly given path is used as-is; only the default location is created.
fn prepare_config(explicit: Option<PathBuf>) -> Result<PathBuf, anyhow::Error> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }
        return Ok(path);
    }

    let config_path = config::get_config_path()?;
    let secrets_path = config::get_config_dir()?.join("secrets.toml");
    if setup::run_setup(&config_path, &secrets_path)? {
        tracing::info!(
            "First run: created {} and {}",
            config_path.display(),
            secrets_path.display()
        );
    }
    Ok(config_path)
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If the config file cannot be prepared
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging or config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "transcribe", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    let serving = matches!(cli.command, None | Some(Commands::Serve { .. }));
    logging::init_logging(serving)?;

    let config_path = prepare_config(cli.config)?;

    match cli.command {
        None => commands::handle_serve(&config_path, None, None).await?,
        Some(Commands::Serve { host, port }) => {
            commands::handle_serve(&config_path, host, port).await?;
        }
        Some(Commands::File {
            file,
            language,
            translate,
            no_translate,
            output,
        }) => {
            let translate = match (translate, no_translate) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::handle_file(&config_path, file, language, translate, output).await?;
        }
        Some(Commands::Languages) => commands::handle_languages(&config_path)?,
        Some(Commands::Config) => commands::handle_config(&config_path)?,
        Some(Commands::Completions { .. }) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
