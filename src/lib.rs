//! hx-dispatch: pattern-to-controller resolution and static route compilation.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                  HX-DISPATCH                      │
//!                  │                                                   │
//!  "users@index"   │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!  ────────────────┼─▶│ pattern │──▶│ resolver │──▶│   security   │   │
//!   (request time) │  │ parser  │   │namespace │   │  validator   │   │
//!                  │  └─────────┘   └────┬─────┘   └──────┬───────┘   │
//!                  │                     │                │           │
//!                  │                ┌────▼────────────────▼─────┐     │
//!                  │                │   two-tier result cache   │     │
//!                  │                └───────────┬───────────────┘     │
//!  (class, method) │                            │                     │
//!  ◀───────────────┼────────────────────────────┘                     │
//!                  │                                                   │
//!  template tree   │  ┌─────────┐   ┌──────────────┐   ┌──────────┐   │
//!  ────────────────┼─▶│ scanner │──▶│ same resolver│──▶│ codegen  │───┼──▶ route table
//!   (build time)   │  └─────────┘   │ (validate)   │   └──────────┘   │    artifact
//!                  │                └──────────────┘                  │
//!                  │                                                   │
//!                  │  Cross-cutting: config (TOML + fingerprint),      │
//!                  │  tracing, typed errors with stable codes          │
//!                  └──────────────────────────────────────────────────┘
//! ```
//!
//! Request-time and build-time validation share one resolution path, so
//! the two modes produce identical accept/reject decisions by
//! construction. Resolution stops at the validated `(class, method)`
//! pair; controller instantiation and invocation belong to the host.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod pattern;
pub mod resolver;
pub mod security;

pub use compiler::{CompilationReport, RouteCompiler};
pub use config::DispatchConfig;
pub use pattern::{PatternParser, RoutePattern, Verb};
pub use resolver::{ControllerResolver, ResolutionError, ResolutionResult};
pub use security::{MetadataProvider, SecurityValidator, StaticMetadataRegistry, Verdict};
