//! mixfix - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

use mixfix::util::config::{EngineConfig, OutputFormat};
use mixfix::util::diagnostic::check::{check_paths, CheckOptions};
use mixfix::util::diagnostic::{ErrorCategory, ErrorCodeDefinition};
use mixfix::util::logger::{self, LogLevel};
use mixfix::{NAME, VERSION};

/// Check mixfix units: declare operators, then parse expressions against them
#[derive(Parser, Debug)]
#[command(name = "mixfix")]
#[command(author = "Mixfix Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Sexp,
    Pretty,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Sexp => OutputFormat::Sexp,
            Format::Pretty => OutputFormat::Pretty,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Declare and parse every unit (.ron) under the given paths
    Check {
        /// Unit files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Tree output format
        #[arg(long, value_enum)]
        format: Option<Format>,

        /// Treat adjacent primaries as function application
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
        juxtaposition: Option<bool>,

        /// Parse expressions in parallel
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
        parallel: Option<bool>,

        /// Expand relation chains into combinator applications
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
        desugar: Option<bool>,

        /// Color control
        #[arg(long, value_enum, default_value = "auto")]
        color: Color,

        /// Directory holding mixfix.ron (defaults to the current directory)
        #[arg(long, value_name = "DIR")]
        config: Option<PathBuf>,
    },

    /// Explain an error code
    Explain {
        /// Error code, e.g. E0303
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// List all error codes
    Codes,

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Check {
            paths,
            format,
            juxtaposition,
            parallel,
            desugar,
            color,
            config,
        } => {
            let dir = match config {
                Some(dir) => dir,
                None => std::env::current_dir().context("Failed to read current directory")?,
            };
            let mut config = EngineConfig::load_from_dir(&dir)
                .with_context(|| format!("Failed to load config from {}", dir.display()))?
                .with_env();

            // CLI flags win over file and environment
            if let Some(format) = format {
                config.output.format = format.into();
            }
            if let Some(juxtaposition) = juxtaposition {
                config.parser.juxtaposition = juxtaposition;
            }
            if let Some(parallel) = parallel {
                config.parser.parallel = parallel;
            }
            if let Some(desugar) = desugar {
                config.output.desugar_chains = desugar;
            }
            match color {
                Color::Always => config.output.colors = true,
                Color::Never => config.output.colors = false,
                // Diagnostics go to stderr
                Color::Auto => config.output.colors &= std::io::stderr().is_terminal(),
            }
            if args.verbose {
                config.log.level = LogLevel::Debug;
            }

            logger::init_with_level(config.log.level);
            tracing::debug!(?config, "effective configuration");

            let passed = check_paths(&paths, &CheckOptions::from(&config))?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Explain { code } => {
            let definition = ErrorCodeDefinition::find(&code.to_ascii_uppercase())
                .with_context(|| format!("Unknown error code: {}", code))?;
            println!("{} ({})", definition.code, definition.category);
            println!("  message: {}", definition.message_template);
            if !definition.help_template.is_empty() {
                println!("  help:    {}", definition.help_template);
            }
            if definition.category.is_declaration() {
                println!("  a declaration error aborts the whole unit");
            }
        }
        Commands::Codes => {
            for category in [
                ErrorCategory::Category,
                ErrorCategory::Operator,
                ErrorCategory::Parse,
            ] {
                println!("{}:", category);
                for definition in ErrorCodeDefinition::by_category(category) {
                    println!("  {}  {}", definition.code, definition.message_template);
                }
            }
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
