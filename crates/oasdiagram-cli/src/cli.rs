//! Command-line interface for the oasdiagram utility
//!
//! Converts OpenAPI documents to class diagrams, checks configuration files
//! and reports component reuse.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use oasdiagram::analysis::{ComponentUsage, UsageAnalyzer};
use oasdiagram::builder::DiagramBuilder;
use oasdiagram::core::logging::{init_logging, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use oasdiagram::openapi::SourceFormat;
use oasdiagram::orchestrator::Orchestrator;
use oasdiagram::{Config, OutputFormat};

/// oasdiagram - Turn OpenAPI 3 documents into class diagrams
#[derive(Parser)]
#[command(name = "oasdiagram")]
#[command(about = "Convert OpenAPI 3.x documents into Mermaid class diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error|off)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Output formats selectable on the command line
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum FormatChoice {
    Mermaid,
    Json,
}

impl From<FormatChoice> for OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Mermaid => OutputFormat::Mermaid,
            FormatChoice::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert an OpenAPI document to a class diagram
    Convert {
        /// Input document, JSON or YAML (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the diagram (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file, YAML or JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format, overriding the configuration
        #[arg(short, long, value_enum)]
        format: Option<FormatChoice>,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file to validate
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Report the most reused and the unused component schemas
    Usage {
        /// Input document (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of most reused components to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Detect the OpenAPI version and syntax of the input
    Detect {
        /// Input file to analyze (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct UsageReport<'a> {
    most_reused: &'a [ComponentUsage],
    unused: &'a [String],
}

/// Main CLI application
pub struct OasDiagramApp {
    orchestrator: Orchestrator,
}

impl OasDiagramApp {
    /// Create a new application instance with default settings
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new application instance with a diagram config
    pub fn with_config(config: Config) -> Self {
        Self {
            orchestrator: Orchestrator::with_default_plugins().with_config(config),
        }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("oasdiagram v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Convert {
                input,
                output,
                config,
                format,
            } => self.convert_command(input, output, config, format, cli.verbose),
            Commands::Check { config } => self.check_command(&config, cli.verbose),
            Commands::Usage { input, top, json } => self.usage_command(input, top, json, cli.verbose),
            Commands::Detect { input } => self.detect_command(input, cli.verbose),
        }
    }

    /// Handle the convert command
    fn convert_command(
        &mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        config: Option<PathBuf>,
        format: Option<FormatChoice>,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let mut config = match config {
            Some(path) => Config::load(&path)
                .map_err(|e| anyhow!("Failed to load config '{}': {}", path.display(), e))?,
            None => self.orchestrator.config().clone(),
        };
        if let Some(format) = format {
            config.output.format = format.into();
        }
        self.orchestrator = Orchestrator::with_default_plugins().with_config(config);
        for error in self.orchestrator.config_errors() {
            eprintln!("Warning: {}", error);
        }

        let diagram = self.orchestrator.process(&content)?;

        if verbose {
            eprintln!("Successfully converted document");
        }

        self.write_output(output, &diagram)
    }

    /// Handle the check command
    fn check_command(&self, path: &Path, verbose: bool) -> Result<()> {
        let config = Config::load(path)
            .map_err(|e| anyhow!("Failed to load config '{}': {}", path.display(), e))?;

        if verbose {
            eprintln!("Loaded configuration from {}", path.display());
        }

        let errors = config.validate();
        if errors.is_empty() {
            println!("✓ Configuration is valid");
            return Ok(());
        }
        for error in &errors {
            println!("✗ {}", error);
        }
        Err(anyhow!("{} configuration error(s)", errors.len()))
    }

    /// Handle the usage command
    fn usage_command(&self, input: Option<PathBuf>, top: usize, json: bool, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;
        let document = self.orchestrator.parse(&content)?;
        let diagram = DiagramBuilder::new(&document, self.orchestrator.config()).build_schemas();

        if verbose {
            eprintln!("Analyzed {} classes", diagram.class_count());
        }

        let analyzer = UsageAnalyzer::default();
        let most_reused = analyzer.get_most_reused_components(&diagram, top);
        let unused = analyzer.get_unused_components(&diagram);

        if json {
            let report = UsageReport {
                most_reused: &most_reused,
                unused: &unused,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Most reused components:");
        if most_reused.is_empty() {
            println!("  (none)");
        }
        for usage in &most_reused {
            println!("  {:<30} {:>4} refs  {}", usage.class_id, usage.count, usage.tier.as_str());
        }
        println!();
        println!("Unused components:");
        if unused.is_empty() {
            println!("  (none)");
        }
        for id in &unused {
            println!("  {}", id);
        }
        Ok(())
    }

    /// Handle the detect command
    fn detect_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        if let Err(e) = self.orchestrator.detect_document_type(&content) {
            eprintln!("Could not detect document type: {}", e);
            return Err(e);
        }
        let document = self.orchestrator.parse(&content)?;
        println!(
            "openapi {} ({})",
            document.openapi,
            SourceFormat::sniff(&content).as_str()
        );
        Ok(())
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content)
                    .map_err(|e| anyhow!("Failed to write output file '{}': {}", path.display(), e))?;
            }
            _ => {
                let stdout_content = if content.is_empty() || content.ends_with('\n') {
                    content.to_string()
                } else {
                    format!("{}\n", content)
                };
                print!("{}", stdout_content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

impl Default for OasDiagramApp {
    fn default() -> Self {
        Self::new()
    }
}
