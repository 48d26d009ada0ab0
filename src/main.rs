// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subtrans::app_config::{self, Config, TranslationProvider};
use subtrans::app_controller::Controller;
use subtrans::language_utils;
use subtrans::providers::{Provider, TranslationBackend};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(alias = "anthropic")]
    Claude,
    #[value(name = "chatgpt", alias = "openai")]
    ChatGpt,
    #[value(name = "deepseek")]
    DeepSeek,
    Ollama,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Claude => TranslationProvider::Claude,
            CliTranslationProvider::ChatGpt => TranslationProvider::ChatGpt,
            CliTranslationProvider::DeepSeek => TranslationProvider::DeepSeek,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an SRT subtitle file
    Translate(TranslateArgs),

    /// View or change the stored configuration
    Config(ConfigArgs),

    /// Check that the configured backend answers
    Check {
        /// Configuration file path
        #[arg(long)]
        config_path: Option<PathBuf>,

        /// Set logging level
        #[arg(long, value_enum)]
        log_level: Option<CliLogLevel>,
    },

    /// Generate shell completions for subtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input SRT file
    #[arg(short, long, value_name = "INPUT")]
    input: PathBuf,

    /// Output SRT file (default: <output dir or input dir>/<stem>.<target>.srt)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Translation provider to use
    #[arg(long, value_enum)]
    llm: Option<CliTranslationProvider>,

    /// API key for the provider
    #[arg(long, env = "SUBTRANS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name to use for translation
    #[arg(long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'bn', 'es', 'fr')
    #[arg(long)]
    target_language: Option<String>,

    /// Subtitle entries per request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Retries per batch after the first attempt
    #[arg(long)]
    max_retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    retry_delay_secs: Option<u64>,

    /// Checkpoint file used to resume interrupted runs
    #[arg(long)]
    checkpoint_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Show the current configuration
    #[arg(long)]
    view: bool,

    /// Delete the stored configuration
    #[arg(long)]
    clear: bool,

    /// Default translation provider
    #[arg(long, value_enum)]
    llm: Option<CliTranslationProvider>,

    /// API key for the provider
    #[arg(long)]
    api_key: Option<String>,

    /// API endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Default output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Default source language code
    #[arg(long)]
    source_language: Option<String>,

    /// Default target language code
    #[arg(long)]
    target_language: Option<String>,

    /// Subtitle entries per request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Retries per batch after the first attempt
    #[arg(long)]
    max_retries: Option<u32>,

    /// Checkpoint file used to resume interrupted runs
    #[arg(long)]
    checkpoint_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    config_path: Option<PathBuf>,
}

/// subtrans - SRT subtitle translation with LLM backends
///
/// Translates subtitle files in batches through Claude, ChatGPT, DeepSeek or a
/// local Ollama server. Interrupted runs resume from a checkpoint.
#[derive(Parser, Debug)]
#[command(name = "subtrans")]
#[command(version)]
#[command(about = "LLM-powered SRT subtitle translation tool")]
#[command(long_about = "subtrans translates SRT subtitle files with LLM providers.

EXAMPLES:
    subtrans translate -i movie.srt                          # Translate using stored config
    subtrans translate -i movie.srt --llm claude --api-key KEY
    subtrans translate -i movie.srt --target-language es     # Translate to Spanish
    subtrans config --llm deepseek --api-key KEY             # Store provider settings
    subtrans config --view                                   # Show stored settings
    subtrans check                                           # Test the configured provider
    subtrans completions bash > subtrans.bash                # Generate bash completions

CONFIGURATION:
    Configuration is stored in ~/.subtranslator/config.json by default. Use
    --config-path to pick another file. Command line options override the
    stored values for a single run.

SUPPORTED PROVIDERS:
    claude    - Anthropic Claude API (requires API key)
    chatgpt   - OpenAI API (requires API key)
    deepseek  - DeepSeek API (requires API key)
    ollama    - Local Ollama server (default: llama3.2:latest)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level), now, Self::get_emoji_for_level(level), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set with set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Translate(args) => run_translate(args).await,
        Commands::Config(args) => run_config(args),
        Commands::Check { config_path, log_level } => run_check(config_path, log_level).await,
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtrans", &mut std::io::stdout());
            Ok(())
        }
    }
}

// @returns: Explicit config path or the default location
fn resolve_config_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => Config::default_path(),
    }
}

// @applies: Log level from the command line, else from the config
fn apply_log_level(cli_level: Option<CliLogLevel>, config: &mut Config) {
    if let Some(level) = cli_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());
}

fn apply_translate_overrides(config: &mut Config, args: &TranslateArgs) {
    if let Some(provider) = &args.llm {
        config.switch_provider(provider.clone().into());
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = api_key.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(source_language) = &args.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &args.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = batch_size;
    }
    if let Some(max_retries) = args.max_retries {
        config.pipeline.max_retries = max_retries;
    }
    if let Some(retry_delay_secs) = args.retry_delay_secs {
        config.pipeline.retry_delay_secs = retry_delay_secs;
    }
    if let Some(checkpoint_path) = &args.checkpoint_path {
        config.pipeline.checkpoint_path = checkpoint_path.clone();
    }
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config_path.clone())?;
    let mut config = Config::load(&config_path);

    apply_translate_overrides(&mut config, &args);
    apply_log_level(args.log_level.clone(), &mut config);

    let controller = Controller::with_config(config)?;
    let output_path = controller.run(&args.input, args.output.clone()).await?;
    info!("Success: {:?}", output_path);
    Ok(())
}

fn run_config(args: ConfigArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config_path.clone())?;

    if args.clear {
        if config_path.exists() {
            std::fs::remove_file(&config_path)
                .with_context(|| format!("Failed to delete config file: {}", config_path.display()))?;
            println!("Configuration cleared: {}", config_path.display());
        } else {
            println!("No configuration to clear at {}", config_path.display());
        }
        return Ok(());
    }

    let mut config = Config::load(&config_path);

    if args.view {
        println!("{}", config);
        println!("\nConfig file: {}", config_path.display());
        return Ok(());
    }

    let mut changed = false;

    if let Some(provider) = &args.llm {
        config.switch_provider(provider.clone().into());
        changed = true;
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = api_key.clone();
        changed = true;
    }
    if let Some(endpoint) = &args.endpoint {
        url::Url::parse(endpoint).map_err(|e| anyhow!("Invalid endpoint URL {}: {}", endpoint, e))?;
        config.endpoint = endpoint.clone();
        changed = true;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
        changed = true;
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = Some(output_dir.clone());
        changed = true;
    }
    if let Some(source_language) = &args.source_language {
        language_utils::get_language_name(source_language)?;
        config.source_language = source_language.clone();
        changed = true;
    }
    if let Some(target_language) = &args.target_language {
        language_utils::get_language_name(target_language)?;
        config.target_language = target_language.clone();
        changed = true;
    }
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }
        config.pipeline.batch_size = batch_size;
        changed = true;
    }
    if let Some(max_retries) = args.max_retries {
        config.pipeline.max_retries = max_retries;
        changed = true;
    }
    if let Some(checkpoint_path) = &args.checkpoint_path {
        config.pipeline.checkpoint_path = checkpoint_path.clone();
        changed = true;
    }

    if !changed {
        println!("No configuration option given. Use --view to see the current configuration or --help for the available options.");
        return Ok(());
    }

    config.save(&config_path)?;
    println!("Configuration saved to {}", config_path.display());
    Ok(())
}

async fn run_check(config_path: Option<PathBuf>, log_level: Option<CliLogLevel>) -> Result<()> {
    let config_path = resolve_config_path(config_path)?;
    let mut config = Config::load(&config_path);
    apply_log_level(log_level, &mut config);

    config.validate().context("Configuration validation failed")?;
    let backend = TranslationBackend::from_config(&config)?;

    info!("Testing {} at {} ({})", backend.name(), config.get_endpoint(), config.get_model());
    match backend.test_connection().await {
        Ok(()) => {
            info!("{} is reachable", backend.name());
            Ok(())
        }
        Err(e) => {
            error!("{} connection test failed: {}", backend.name(), e);
            Err(e.into())
        }
    }
}
