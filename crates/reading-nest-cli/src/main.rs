use clap::{Parser, Subcommand};
use reading_nest_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "reading-nest", version, about = "Sloth Reading Nest: a slow little reading tracker")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shelf management
    Book {
        #[command(subcommand)]
        action: commands::book::BookAction,
    },
    /// Reading timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Session log
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Reading statistics
    Stats,
    /// Cozy reading prompt
    Prompt {
        #[command(subcommand)]
        action: commands::prompt::PromptAction,
    },
    /// Write backup, CSV or reading card files
    Export {
        #[command(subcommand)]
        action: commands::export::ExportAction,
    },
    /// Replace everything with a backup file
    Import {
        /// Path to a sloth-reading-nest export
        file: std::path::PathBuf,
    },
    /// Snapshot share links
    Share {
        #[command(subcommand)]
        action: commands::share::ShareAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Book { action } => commands::book::run(action, &config),
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Session { action } => commands::session::run(action, &config),
        Commands::Stats => commands::stats::run(&config),
        Commands::Prompt { action } => commands::prompt::run(action, &config),
        Commands::Export { action } => commands::export::run(action, &config),
        Commands::Import { file } => commands::export::import(&file, &config),
        Commands::Share { action } => commands::share::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
