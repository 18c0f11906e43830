// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use translatable::app_config::{Config, LogLevel};
use translatable::database::repository::load_translation_rows;
use translatable::database::{schema, DatabaseConnection};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show row and table counts of the translation store
    Stats,

    /// List translation tables with their base table and attributes
    Tables,

    /// Print every translation row of one base entity
    Show {
        /// Translation table name (e.g. 'post_translations')
        table: String,

        /// Id of the base entity
        owner_id: i64,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop a translation table and forget it
    DropTable {
        /// Translation table name
        table: String,
    },

    /// Reclaim unused space in the database file
    Vacuum,

    /// Write a default configuration file
    InitConfig {
        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions for translatable
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// translatable - per-locale attribute translations over SQLite
///
/// Inspects and maintains the translation tables written by the translatable library.
#[derive(Parser, Debug)]
#[command(name = "translatable")]
#[command(version)]
#[command(about = "Inspect and maintain translation tables")]
#[command(long_about = "translatable inspects the SQLite translation store used by the translatable library.

EXAMPLES:
    translatable stats                              # Row and table counts
    translatable tables                             # List translation tables
    translatable show post_translations 42          # Rows of post #42
    translatable --database app.db show post_translations 42 --json
    translatable init-config                        # Write translatable.json
    translatable completions bash > translatable.bash

CONFIGURATION:
    Configuration is read from translatable.json by default. A different file can be
    given with --config. Without a file, built-in defaults are used and the database
    lives in the user data directory.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "translatable.json", env = "TRANSLATABLE_CONFIG")]
    config: PathBuf,

    /// Database file path, overrides the configuration
    #[arg(short, long, env = "TRANSLATABLE_DATABASE")]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Colored stderr logger with timestamps
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    /// ANSI color and label for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, label) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            color,
            now,
            label,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Info until the configuration has been read
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "translatable", &mut std::io::stdout());
            return Ok(());
        }
        Commands::InitConfig { force } => return init_config(&cli.config, *force),
        _ => {}
    }

    let config = load_config(&cli)?;
    let db = DatabaseConnection::from_config(&config)?;

    match cli.command {
        Commands::Stats => {
            let stats = db.stats()?;
            println!("Database: {:?}", db.path());
            println!("{}", stats);
        }
        Commands::Tables => list_tables(&db)?,
        Commands::Show { table, owner_id, json } => show_rows(&db, &table, owner_id, json)?,
        Commands::DropTable { table } => {
            let dropped = db.transaction(|tx| schema::drop_translation_table(tx, &table))?;
            if !dropped {
                warn!("No translation table named '{}'", table);
            }
        }
        Commands::Vacuum => {
            db.vacuum()?;
            info!("Vacuumed {:?}", db.path());
        }
        Commands::InitConfig { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Read the configuration file if present and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = if cli.config.exists() {
        debug!("Loading configuration from {:?}", cli.config);
        Config::from_file(&cli.config)?
    } else {
        debug!("No configuration at {:?}, using defaults", cli.config);
        Config::default()
    };

    if let Some(database) = &cli.database {
        config.database.path = Some(database.clone());
    }

    match cli.log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "Config file already exists at {:?}. Use --force to replace it.",
            path
        ));
    }
    Config::default().save_to_file(path)?;
    info!("Wrote default configuration to {:?}", path);
    Ok(())
}

fn list_tables(db: &DatabaseConnection) -> Result<()> {
    let tables = db.execute(|conn| schema::list_translation_tables(conn))?;

    if tables.is_empty() {
        println!("No translation tables");
        return Ok(());
    }
    for table in tables {
        println!(
            "{} -> {} ({}): {}",
            table.table_name,
            table.base_table,
            table.foreign_key,
            table.attributes.join(", ")
        );
    }
    Ok(())
}

fn show_rows(db: &DatabaseConnection, table: &str, owner_id: i64, json: bool) -> Result<()> {
    let records = db.execute(|conn| -> translatable::Result<_> {
        let info = schema::get_translation_table(conn, table)?
            .ok_or_else(|| translatable::TranslationError::Other(format!("Unknown translation table '{}'", table)))?;
        let records = load_translation_rows(conn, &info, owner_id, None)?;
        Ok((info, records))
    });
    let (info, records) = records?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No translations for {} #{}", info.base_table, owner_id);
        return Ok(());
    }
    for record in records {
        println!("[{}] updated {}", record.locale, record.updated_at.as_deref().unwrap_or("-"));
        for attribute in &info.attributes {
            println!("  {}: {}", attribute, record.get(attribute).unwrap_or("<null>"));
        }
    }
    Ok(())
}
