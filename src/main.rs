use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

mod commands;

/// OneClick - install a Modrinth modpack into the Minecraft launcher
#[derive(Parser)]
#[command(name = "oneclick")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging (same as RUST_LOG=oneclick=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the latest release of the configured modpack
    Install {
        /// Game directory (defaults to the launcher directory for this OS)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Modpack slug (overrides modpack.slug from the config)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Show the release that would be installed.
    /// "Latest" is the first version the package host lists.
    Info {
        /// Modpack slug (overrides modpack.slug from the config)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., modpack.slug, download.attempts)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Print the config file location
    Path,
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_module("oneclick", log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Install { dir, slug } => commands::install::run(dir, slug),
        Commands::Info { slug } => commands::info::run(slug),
        Commands::Config { action } => commands::config::run(&action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "oneclick", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
