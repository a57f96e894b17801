//! Static route compilation subsystem.
//!
//! # Data Flow
//! ```text
//! template tree
//!     → scanner.rs (walk, glob filter, attribute extraction)
//!     → DiscoveredRoute[]
//!     → ControllerResolver (validation only, per route)
//!     → policy branch (strict / warning / permissive)
//!     → codegen.rs (render + atomic write)
//!     → CompilationReport
//! ```
//!
//! # Design Decisions
//! - The compiler reuses the exact dynamic resolution path, so the two
//!   modes cannot disagree on accept/reject decisions
//! - Strict aborts before anything is written; Warning drops failures;
//!   Permissive emits them annotated — but a permissively emitted route
//!   is still re-validated at dispatch time by the dynamic path
//! - Batch, single-run process; callers must not run two compilations
//!   against the same output path concurrently

pub mod codegen;
pub mod scanner;

pub use codegen::CodeGenerator;
pub use scanner::{DiscoveredRoute, ScanError, ScanOutcome, TemplateScanner};

use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::schema::{DispatchConfig, ValidationPolicy};
use crate::pattern::PatternParser;
use crate::resolver::controller::{ControllerResolver, ResolutionError};
use crate::security::metadata::MetadataProvider;
use crate::security::validator::ValidatorBuildError;

/// A discovered route that passed validation (or was degraded under the
/// permissive policy).
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub route: DiscoveredRoute,
    pub target_class: String,
    pub method_name: String,
    /// Denial annotation carried by permissively emitted routes.
    pub validation_warning: Option<String>,
}

/// Errors that abort a compilation run.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Configuration problem detected before scanning.
    #[error("compiler configuration error: {message}")]
    Config { message: String },

    /// A route failed validation under the strict policy.
    #[error("route validation failed for {pattern:?}: {message}")]
    RouteValidationFailed {
        pattern: String,
        code: &'static str,
        message: String,
    },

    /// The validator itself could not be built from configuration.
    #[error(transparent)]
    Validator(#[from] ValidatorBuildError),

    /// Writing the artifact failed.
    #[error("failed to write route table: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Config { .. } => "COMPILER_CONFIG",
            CompileError::RouteValidationFailed { .. } => "ROUTE_VALIDATION_FAILED",
            CompileError::Validator(_) => "COMPILER_CONFIG",
            CompileError::Io(_) => "OUTPUT_IO",
        }
    }
}

/// Aggregate counters for one compilation run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CompileStats {
    pub scanned_files: usize,
    pub discovered_routes: usize,
    pub validated_routes: usize,
    pub compiled_routes: usize,
    pub error_count: usize,
    pub duration_ms: u128,
}

/// Result of a compilation run, returned to the caller (e.g. the CLI).
#[derive(Debug, Clone, Serialize)]
pub struct CompilationReport {
    pub success: bool,
    pub statistics: CompileStats,
    pub errors: Vec<String>,
    pub discovered_count: usize,
    pub compiled_count: usize,
    pub output_path: String,
    pub recommendations: Vec<String>,
}

/// Orchestrates scan → validate → generate.
pub struct RouteCompiler {
    config: DispatchConfig,
    resolver: ControllerResolver,
}

impl RouteCompiler {
    pub fn new(
        config: DispatchConfig,
        provider: Arc<dyn MetadataProvider>,
    ) -> Result<Self, CompileError> {
        let resolver = ControllerResolver::new(&config, provider)?;
        Ok(Self { config, resolver })
    }

    /// Run one full compilation.
    ///
    /// Fatal outcomes (bad configuration, strict-policy validation
    /// failure, artifact I/O) return `Err`; everything else lands in the
    /// report.
    pub fn compile(&self) -> Result<CompilationReport, CompileError> {
        let started = Instant::now();
        self.validate_compiler_config()?;

        let compiler = &self.config.compiler;
        let parser = PatternParser::new(
            self.config.parser.max_pattern_len,
            self.config.parser.max_method_len,
        );
        let scanner = TemplateScanner::new(
            &compiler.include_globs,
            &compiler.exclude_globs,
            parser,
        )
        .map_err(|e| CompileError::Config {
            message: format!("invalid glob configuration: {e}"),
        })?;

        let directories: Vec<PathBuf> = compiler.template_dirs.iter().map(PathBuf::from).collect();
        let outcome = scanner.scan(&directories);
        tracing::info!(
            scanned_files = outcome.scanned_files,
            discovered = outcome.routes.len(),
            scan_errors = outcome.errors.len(),
            "template scan complete"
        );

        let mut errors: Vec<String> = outcome
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path.display(), e.message))
            .collect();

        let mut compiled: Vec<CompiledRoute> = Vec::new();
        let mut validated = 0usize;
        for route in &outcome.routes {
            let rendered = route.pattern.render();
            match self.resolver.resolve(&rendered, route.verb) {
                Ok(result) => {
                    validated += 1;
                    compiled.push(CompiledRoute {
                        route: route.clone(),
                        target_class: result.target_class,
                        method_name: result.method_name,
                        validation_warning: None,
                    });
                }
                Err(error) => match compiler.policy {
                    ValidationPolicy::Strict => {
                        tracing::error!(
                            pattern = %rendered,
                            code = error.code(),
                            "aborting compilation under strict policy"
                        );
                        return Err(CompileError::RouteValidationFailed {
                            pattern: rendered,
                            code: error.code(),
                            message: error.to_string(),
                        });
                    }
                    ValidationPolicy::Warning => {
                        errors.push(route_error_line(&rendered, &error));
                    }
                    ValidationPolicy::Permissive => {
                        errors.push(route_error_line(&rendered, &error));
                        // Emit anyway, annotated. The dynamic path still
                        // validates at dispatch time.
                        if let Some((target_class, method_name)) = permissive_target(&error, route)
                        {
                            compiled.push(CompiledRoute {
                                route: route.clone(),
                                target_class,
                                method_name,
                                validation_warning: Some(format!(
                                    "{}: {}",
                                    error.code(),
                                    error
                                )),
                            });
                        }
                    }
                },
            }
        }

        // Deterministic artifact order regardless of scan order.
        compiled.sort_by(|a, b| {
            (a.route.pattern.render(), a.route.verb).cmp(&(b.route.pattern.render(), b.route.verb))
        });

        let duration = started.elapsed();
        let generator = CodeGenerator::new(compiler.route_prefix.clone(), compiler.middleware.clone());
        let source = generator.generate(&compiled, duration);
        let output_path = PathBuf::from(&compiler.output_path);
        CodeGenerator::write_atomic(&output_path, &source)?;

        let statistics = CompileStats {
            scanned_files: outcome.scanned_files,
            discovered_routes: outcome.routes.len(),
            validated_routes: validated,
            compiled_routes: compiled.len(),
            error_count: errors.len(),
            duration_ms: duration.as_millis(),
        };
        let recommendations = recommendations(&statistics, duration);

        tracing::info!(
            compiled = compiled.len(),
            errors = errors.len(),
            output = %output_path.display(),
            "route compilation complete"
        );

        Ok(CompilationReport {
            success: true,
            statistics,
            errors,
            discovered_count: statistics.discovered_routes,
            compiled_count: statistics.compiled_routes,
            output_path: compiler.output_path.clone(),
            recommendations,
        })
    }

    /// Configuration checks that must pass before any scanning happens.
    fn validate_compiler_config(&self) -> Result<(), CompileError> {
        let compiler = &self.config.compiler;
        if compiler.template_dirs.is_empty() {
            return Err(CompileError::Config {
                message: "no template directories configured".to_string(),
            });
        }
        for dir in &compiler.template_dirs {
            if !PathBuf::from(dir).is_dir() {
                return Err(CompileError::Config {
                    message: format!("template directory {dir:?} does not exist"),
                });
            }
        }
        if compiler.output_path.trim().is_empty() {
            return Err(CompileError::Config {
                message: "output path is not set".to_string(),
            });
        }
        // Fail before scanning if the destination cannot be written.
        let output = PathBuf::from(&compiler.output_path);
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| CompileError::Config {
                    message: format!(
                        "output directory {} is not writable: {e}",
                        parent.display()
                    ),
                })?;
            }
        }
        Ok(())
    }
}

fn route_error_line(pattern: &str, error: &ResolutionError) -> String {
    format!("{}: {} ({})", pattern, error, error.code())
}

/// Best-effort target for a permissively emitted route.
///
/// Security denials know the class they rejected; parse failures and
/// unresolved namespaces have nothing to emit and stay excluded even
/// under the permissive policy.
fn permissive_target(
    error: &ResolutionError,
    route: &DiscoveredRoute,
) -> Option<(String, String)> {
    match error {
        ResolutionError::Denied { target_class, .. } => Some((
            target_class.clone(),
            route.pattern.method_name().to_string(),
        )),
        ResolutionError::Parse(_) | ResolutionError::NotFound { .. } => None,
    }
}

fn recommendations(stats: &CompileStats, duration: Duration) -> Vec<String> {
    let mut out = Vec::new();
    if stats.discovered_routes == 0 {
        out.push(
            "no routes discovered; check compiler.template_dirs and compiler.include_globs"
                .to_string(),
        );
    }
    if duration > Duration::from_secs(10) {
        out.push(format!(
            "compilation took {}ms; consider narrowing include globs or excluding large directories",
            duration.as_millis()
        ));
    }
    if stats.error_count > 0 {
        out.push(format!(
            "{} error(s) recorded; run with the strict policy to fail the build on invalid routes",
            stats.error_count
        ));
    }
    out
}
