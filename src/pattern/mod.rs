//! Pattern syntax layer.
//!
//! # Data Flow
//! ```text
//! Raw request string ("admin.users@create")
//!     → parser.rs (syntax validation, length bounds)
//!     → Return: RoutePattern { path, method_name } or ParseError
//! ```
//!
//! # Design Decisions
//! - Parsing is a total, deterministic function with no I/O
//! - Everything reachable from the network is rejected here first
//! - A constructed RoutePattern always satisfies its invariants
//! - The HTTP verb is supplied by the transport, not encoded in the pattern

pub mod parser;

pub use parser::{ParseError, PatternParser, RoutePattern};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verbs recognized by the dispatch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// All verbs the template scanner recognizes.
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// The `hx-*` template attribute that carries this verb.
    pub fn hx_attribute(&self) -> &'static str {
        match self {
            Verb::Get => "hx-get",
            Verb::Post => "hx-post",
            Verb::Put => "hx-put",
            Verb::Patch => "hx-patch",
            Verb::Delete => "hx-delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            other => Err(format!("unknown HTTP verb: {other}")),
        }
    }
}
