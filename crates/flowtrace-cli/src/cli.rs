//! Command-line interface for the flowtrace utility
//!
//! Loads an analyzed type model and produces AsciiDoc documentation or
//! single-message sequence diagrams from it.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use flowtrace::core::logging::init_logging;
use flowtrace::document::DocumentBuilder;
use flowtrace::interaction::{ConsequenceExtractor, Participants};
use flowtrace::model::{Catalog, TypeDescriptor, TypeModel};
use flowtrace::{Conventions, Diagnostics, DocumentOptions};

/// File written when `generate` is pointed at a directory
const INDEX_FILE: &str = "index.adoc";

/// Flowtrace - Message-flow sequence diagrams from an analyzed type model
#[derive(Parser)]
#[command(name = "flowtrace")]
#[command(about = "Generate message-flow documentation from an analyzed type model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// JSON file overriding the naming conventions
    #[arg(long, global = true)]
    pub conventions: Option<PathBuf>,
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

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the AsciiDoc documentation of a model
    Generate {
        /// Model JSON produced by the analyser (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file or directory (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the teoz layout engine and parallel arrows
        #[arg(long)]
        experimental: bool,
    },

    /// Print the sequence diagram of one message
    Diagram {
        /// Model JSON produced by the analyser (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Full name of the event or command
        #[arg(short, long)]
        message: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = DiagramFormat::Plantuml)]
        format: DiagramFormat,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the events and commands of a model
    Messages {
        /// Model JSON produced by the analyser (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Load a model and trace every message, reporting diagnostics
    Validate {
        /// Model JSON produced by the analyser (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Output of the diagram command
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    /// Complete PlantUML sequence diagram
    #[default]
    Plantuml,
    /// The extracted interaction tree
    Json,
}

/// One row of the messages listing
#[derive(Debug, Serialize)]
struct MessageSummary {
    kind: &'static str,
    name: String,
    handlers: usize,
}

/// Initialize logging from CLI flags; environment variables take precedence
pub fn configure_logging(cli: &Cli) {
    let log_level = std::env::var("FLOWTRACE_LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| cli.log_level.as_str().to_string());
    let log_format = std::env::var("FLOWTRACE_LOG_FORMAT")
        .ok()
        .unwrap_or_else(|| cli.log_format.as_str().to_string());

    if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}

/// Main CLI application
pub struct FlowtraceApp {
    conventions: Conventions,
}

impl FlowtraceApp {
    /// Create a new application instance with default conventions
    pub fn new() -> Self {
        Self::with_conventions(Conventions::default())
    }

    pub fn with_conventions(conventions: Conventions) -> Self {
        Self { conventions }
    }

    /// Create the application described by the global flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        match &cli.conventions {
            Some(path) => {
                let json = fs::read_to_string(path).with_context(|| {
                    format!("Failed to read conventions file '{}'", path.display())
                })?;
                let conventions = Conventions::from_json(&json).with_context(|| {
                    format!("Invalid conventions file '{}'", path.display())
                })?;
                Ok(Self::with_conventions(conventions))
            }
            None => Ok(Self::new()),
        }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        if cli.verbose {
            eprintln!("Flowtrace v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Generate {
                input,
                output,
                experimental,
            } => self.generate_command(input, output, experimental, cli.verbose),
            Commands::Diagram {
                input,
                message,
                format,
                output,
            } => self.diagram_command(input, &message, format, output, cli.verbose),
            Commands::Messages { input, json } => self.messages_command(input, json, cli.verbose),
            Commands::Validate { input } => self.validate_command(input, cli.verbose),
        }
    }

    /// Handle the generate command
    fn generate_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        experimental: bool,
        verbose: bool,
    ) -> Result<()> {
        let model = self.load_model(input, verbose)?;
        let catalog = Catalog::new(&model, &self.conventions);
        let document = DocumentBuilder::new(catalog, DocumentOptions { experimental }).build()?;

        if verbose {
            eprintln!(
                "Generated {} bytes with {} diagnostics ({} warnings)",
                document.content.len(),
                document.diagnostics.len(),
                document.diagnostics.warnings().count()
            );
        }

        let output = output.map(|path| document_path(&path));
        self.write_output(output, &document.content)
    }

    /// Handle the diagram command
    fn diagram_command(
        &self,
        input: Option<PathBuf>,
        message: &str,
        format: DiagramFormat,
        output: Option<PathBuf>,
        verbose: bool,
    ) -> Result<()> {
        let model = self.load_model(input, verbose)?;
        let catalog = Catalog::new(&model, &self.conventions);
        let descriptor = catalog.message(message)?;

        let (content, diagnostics) = match format {
            DiagramFormat::Plantuml => {
                DocumentBuilder::new(catalog, DocumentOptions::default()).message_diagram(descriptor)?
            }
            DiagramFormat::Json => {
                let mut participants = Participants::new();
                let mut diagnostics = Diagnostics::new();
                let interactions = ConsequenceExtractor::new(catalog).extract_with_diagnostics(
                    descriptor,
                    &mut participants,
                    &mut diagnostics,
                );
                let tree = serde_json::json!({
                    "message": descriptor.full_name,
                    "participants": participants,
                    "interactions": interactions,
                });
                (serde_json::to_string_pretty(&tree)?, diagnostics)
            }
        };

        if verbose {
            eprintln!("Traced {} with {} diagnostics", message, diagnostics.len());
        }
        self.write_output(output, &content)
    }

    /// Handle the messages command
    fn messages_command(&self, input: Option<PathBuf>, json: bool, verbose: bool) -> Result<()> {
        let model = self.load_model(input, verbose)?;
        let catalog = Catalog::new(&model, &self.conventions);
        let summaries = message_summaries(catalog);

        if json {
            let listing = serde_json::json!({
                "messages": summaries,
                "total": summaries.len(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            println!("Messages:");
            for summary in &summaries {
                println!(
                    "  {:<8} {}  ({} handlers)",
                    summary.kind, summary.name, summary.handlers
                );
            }
            println!();
            println!("Total: {} messages", summaries.len());
        }
        Ok(())
    }

    /// Handle the validate command
    fn validate_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let model = self.load_model(input, verbose)?;
        let catalog = Catalog::new(&model, &self.conventions);
        let extractor = ConsequenceExtractor::new(catalog);

        let messages: Vec<&TypeDescriptor> = catalog
            .events()
            .into_iter()
            .chain(catalog.commands())
            .collect();
        let mut diagnostics = Diagnostics::new();
        for message in &messages {
            let mut participants = Participants::new();
            extractor.extract_with_diagnostics(message, &mut participants, &mut diagnostics);
            debug!(message = %message.full_name, participants = participants.len(), "Traced");
        }

        println!(
            "✓ Valid model: {} types, {} messages, {} diagnostics ({} warnings)",
            model.len(),
            messages.len(),
            diagnostics.len(),
            diagnostics.warnings().count()
        );
        if verbose {
            for diagnostic in diagnostics.warnings() {
                println!("  {}", diagnostic);
            }
        }
        Ok(())
    }

    /// Read and build the model
    fn load_model(&self, input: Option<PathBuf>, verbose: bool) -> Result<TypeModel> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }
        let model = TypeModel::from_json(&content, &self.conventions).context("Failed to load model")?;
        info!(types = model.len(), "Model loaded");
        Ok(model)
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

    /// Write output to file or stdout, creating missing parent directories
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        anyhow!("Failed to create directory '{}': {}", parent.display(), e)
                    })?;
                }
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
                info!(path = %path.display(), bytes = content.len(), "Output written");
            }
            _ => {
                print!("{}", content);
                if !content.is_empty() && !content.ends_with('\n') {
                    println!();
                }
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

impl Default for FlowtraceApp {
    fn default() -> Self {
        Self::new()
    }
}

fn message_summaries(catalog: Catalog<'_>) -> Vec<MessageSummary> {
    let events = catalog.events().into_iter().map(|m| ("event", m));
    let commands = catalog.commands().into_iter().map(|m| ("command", m));
    events
        .chain(commands)
        .map(|(kind, message)| MessageSummary {
            kind,
            name: message.full_name.clone(),
            handlers: catalog.handlers_for(message).len(),
        })
        .collect()
}

/// A directory, existing or extension-less, receives `index.adoc`
fn document_path(path: &Path) -> PathBuf {
    if path.to_string_lossy() == "-" {
        return path.to_path_buf();
    }
    if path.is_dir() || path.extension().is_none() {
        path.join(INDEX_FILE)
    } else {
        path.to_path_buf()
    }
}
