mod commands;

use clap::{Parser, Subcommand};
use lineage_core::{init_logging, LineageError, LoggingConfig, CONFIG_ENV_VAR};
use lineage_orm::MigrationContext;
use std::path::PathBuf;

use commands::*;

#[derive(Parser)]
#[command(name = "lineage")]
#[command(about = "Independent migration lineages for modules sharing one database")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./lineage.toml)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Module to operate on (a section of the configuration file)
    #[arg(short = 'n', long, global = true)]
    name: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new revision file
    Revision {
        /// Revision message
        #[arg(short, long)]
        message: String,

        /// Fill the revision by comparing the module's models with the database
        #[arg(long)]
        autogenerate: bool,
    },

    /// Upgrade to a later revision
    Upgrade {
        /// Target revision: head, an id or prefix, or +N (`from:to` with --sql)
        #[arg(default_value = "head")]
        revision: String,

        /// Print the SQL instead of running it
        #[arg(long)]
        sql: bool,
    },

    /// Revert to a previous revision
    Downgrade {
        /// Target revision: base, an id or prefix, or -N (`from:to` with --sql)
        revision: String,

        /// Print the SQL instead of running it
        #[arg(long)]
        sql: bool,
    },

    /// Show the revision recorded in the module's version table
    Current,

    /// List the module's revisions, base first
    History,

    /// Show the module's head revisions
    Heads,

    /// Record a revision without running any migration
    Stamp {
        /// Target revision
        revision: String,
    },

    /// Fail if autogenerate would produce new operations
    Check,

    /// List configured modules
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig::with_level(cli.log_level.clone()).json(cli.log_json);
    if let Err(e) = init_logging(logging) {
        eprintln!("⚠️  Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), LineageError> {
    let project = Project::load(cli.config.as_deref())?;

    match cli.command {
        Commands::List => status::list(&project),
        command => {
            let context = project.context(cli.name.as_deref())?;
            dispatch(command, &context).await
        }
    }
}

async fn dispatch(command: Commands, context: &MigrationContext) -> Result<(), LineageError> {
    match command {
        Commands::Revision { message, autogenerate } => {
            revision::create(context, &message, autogenerate).await?;
        }
        Commands::Upgrade { revision, sql } => {
            if sql {
                offline::upgrade(context, &revision)?;
            } else {
                migrate::upgrade(context, &revision).await?;
            }
        }
        Commands::Downgrade { revision, sql } => {
            if sql {
                offline::downgrade(context, &revision)?;
            } else {
                migrate::downgrade(context, &revision).await?;
            }
        }
        Commands::Current => {
            status::current(context).await?;
        }
        Commands::History => {
            status::history(context).await?;
        }
        Commands::Heads => {
            status::heads(context)?;
        }
        Commands::Stamp { revision } => {
            migrate::stamp(context, &revision).await?;
        }
        Commands::Check => {
            revision::check(context).await?;
        }
        Commands::List => {
            return Err(LineageError::Migration(
                "`list` does not operate on a single module".to_string(),
            ))
        }
    }

    Ok(())
}
