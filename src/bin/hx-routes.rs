//! Management CLI for the hx-dispatch engine.
//!
//! `compile` runs the static route compiler; `scan` previews discovery
//! without validating; `resolve` exercises one dynamic resolution.
//! Class metadata comes from a JSON registry file exported by the host.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hx_dispatch::compiler::{RouteCompiler, TemplateScanner};
use hx_dispatch::config::{load_config, validate_config, DispatchConfig, ValidationPolicy};
use hx_dispatch::pattern::{PatternParser, Verb};
use hx_dispatch::resolver::ControllerResolver;
use hx_dispatch::security::StaticMetadataRegistry;

#[derive(Parser)]
#[command(name = "hx-routes")]
#[command(about = "Route compiler and resolver for hx-dispatch", long_about = None)]
struct Cli {
    /// Path to the dispatch configuration (TOML). Defaults apply if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the class metadata registry (JSON).
    #[arg(short, long)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan templates, validate every discovered route, emit the route table
    Compile {
        /// Override the configured output path
        #[arg(short, long)]
        output: Option<String>,

        /// Override the configured policy (strict, warning, permissive)
        #[arg(short, long)]
        policy: Option<ValidationPolicy>,
    },
    /// Scan templates and list discovered routes without validating
    Scan,
    /// Resolve a single pattern the way the request path would
    Resolve {
        /// Pattern to resolve, e.g. "admin.users@create"
        pattern: String,

        /// HTTP verb of the simulated request
        #[arg(short, long, default_value = "GET")]
        verb: Verb,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hx_dispatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| e.to_string())?,
        None => {
            let config = DispatchConfig::default();
            validate_config(&config).map_err(|errors| {
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })?;
            config
        }
    };

    match cli.command {
        Commands::Compile { output, policy } => {
            if let Some(output) = output {
                config.compiler.output_path = output;
            }
            if let Some(policy) = policy {
                config.compiler.policy = policy;
            }
            let registry = load_registry(cli.registry.as_deref())?;
            let compiler = RouteCompiler::new(config, registry).map_err(|e| e.to_string())?;
            let report = compiler
                .compile()
                .map_err(|e| format!("{} ({})", e, e.code()))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
            );
            Ok(())
        }
        Commands::Scan => {
            let parser = PatternParser::new(
                config.parser.max_pattern_len,
                config.parser.max_method_len,
            );
            let scanner = TemplateScanner::new(
                &config.compiler.include_globs,
                &config.compiler.exclude_globs,
                parser,
            )
            .map_err(|e| e.to_string())?;
            let directories: Vec<PathBuf> = config
                .compiler
                .template_dirs
                .iter()
                .map(PathBuf::from)
                .collect();

            let outcome = scanner.scan(&directories);
            for route in &outcome.routes {
                println!(
                    "{:6} {}  ({} file(s))",
                    route.verb.as_str(),
                    route.pattern,
                    route.source_locations.len()
                );
            }
            for error in &outcome.errors {
                eprintln!("warning: {}: {}", error.path.display(), error.message);
            }
            println!(
                "scanned {} file(s), discovered {} route(s), {} warning(s)",
                outcome.scanned_files,
                outcome.routes.len(),
                outcome.errors.len()
            );
            Ok(())
        }
        Commands::Resolve { pattern, verb } => {
            let registry = load_registry(cli.registry.as_deref())?;
            let resolver = ControllerResolver::new(&config, registry).map_err(|e| e.to_string())?;
            match resolver.resolve(&pattern, verb) {
                Ok(result) => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?
                    );
                    Ok(())
                }
                Err(e) => Err(format!("{} ({})", e, e.code())),
            }
        }
    }
}

fn load_registry(path: Option<&std::path::Path>) -> Result<Arc<StaticMetadataRegistry>, String> {
    let path = path.ok_or("a metadata registry is required (--registry <file.json>)")?;
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("cannot read registry {}: {e}", path.display()))?;
    let registry: StaticMetadataRegistry = serde_json::from_str(&raw)
        .map_err(|e| format!("cannot parse registry {}: {e}", path.display()))?;
    tracing::info!(classes = registry.len(), "metadata registry loaded");
    Ok(Arc::new(registry))
}
