//! Route-table code generation.
//!
//! # Responsibilities
//! - Render accepted routes into one self-contained generated source file
//! - Document generation time, route count and compile duration in the
//!   header
//! - Write the artifact atomically (temp file + rename)
//!
//! # Design Decisions
//! - The generated file defines its own `StaticRoute` type so consumers
//!   need no import from this crate
//! - Routes are emitted in deterministic (path, verb) order
//! - Atomic rename prevents a concurrently starting process from reading
//!   a half-written table

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::compiler::CompiledRoute;

/// Renders compiled routes into the generated artifact.
pub struct CodeGenerator {
    route_prefix: String,
    middleware: Vec<String>,
}

impl CodeGenerator {
    pub fn new(route_prefix: impl Into<String>, middleware: Vec<String>) -> Self {
        Self {
            route_prefix: route_prefix.into(),
            middleware,
        }
    }

    /// Render the full generated source file.
    pub fn generate(&self, routes: &[CompiledRoute], compile_duration: Duration) -> String {
        let generated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut out = String::new();
        out.push_str("// @generated by the hx-dispatch route compiler. DO NOT EDIT.\n");
        out.push_str("//\n");
        out.push_str(&format!("// generated_at_unix: {generated_at}\n"));
        out.push_str(&format!("// routes: {}\n", routes.len()));
        out.push_str(&format!("// compile_ms: {}\n", compile_duration.as_millis()));
        out.push('\n');
        out.push_str("/// One statically compiled dispatch route.\n");
        out.push_str("#[derive(Debug, Clone, Copy)]\n");
        out.push_str("pub struct StaticRoute {\n");
        out.push_str("    pub verb: &'static str,\n");
        out.push_str("    pub path: &'static str,\n");
        out.push_str("    pub target_class: &'static str,\n");
        out.push_str("    pub method: &'static str,\n");
        out.push_str("    pub name: &'static str,\n");
        out.push_str("    pub middleware: &'static [&'static str],\n");
        out.push_str("    pub validation_warning: Option<&'static str>,\n");
        out.push_str("}\n");
        out.push('\n');
        out.push_str(&format!("pub static ROUTES: [StaticRoute; {}] = [\n", routes.len()));

        let middleware = self
            .middleware
            .iter()
            .map(|m| format!("\"{}\"", escape(m)))
            .collect::<Vec<_>>()
            .join(", ");

        for route in routes {
            let pattern = route.route.pattern.render();
            out.push_str("    StaticRoute {\n");
            out.push_str(&format!("        verb: \"{}\",\n", route.route.verb.as_str()));
            out.push_str(&format!(
                "        path: \"{}/{}\",\n",
                escape(&self.route_prefix),
                escape(&pattern)
            ));
            out.push_str(&format!(
                "        target_class: \"{}\",\n",
                escape(&route.target_class)
            ));
            out.push_str(&format!("        method: \"{}\",\n", escape(&route.method_name)));
            out.push_str(&format!(
                "        name: \"{}\",\n",
                escape(&self.route_name(route.route.pattern.path(), route.route.pattern.method_name()))
            ));
            out.push_str(&format!("        middleware: &[{middleware}],\n"));
            match &route.validation_warning {
                Some(warning) => out.push_str(&format!(
                    "        validation_warning: Some(\"{}\"),\n",
                    escape(warning)
                )),
                None => out.push_str("        validation_warning: None,\n"),
            }
            out.push_str("    },\n");
        }
        out.push_str("];\n");
        out
    }

    /// Generated route identifier, e.g. `hx.admin.users.create`.
    fn route_name(&self, path: &str, method: &str) -> String {
        format!("{}.{}.{}", self.route_prefix, path, method)
    }

    /// Write `contents` to `path` atomically.
    ///
    /// The temp file lives in the destination directory so the rename
    /// stays on one filesystem.
    pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "routes".to_string());
        let temp_path = parent.join(format!(".{file_name}.tmp.{}", std::process::id()));

        fs::write(&temp_path, contents)?;
        match fs::rename(&temp_path, path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

fn escape(s: &str) -> String {
    s.escape_default().to_string()
}
