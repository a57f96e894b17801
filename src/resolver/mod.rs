//! Resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming (raw pattern, verb)
//!     → controller.rs (parse → cache → namespace → validate → package)
//!     → namespace.rs (candidate generation, first-existing wins)
//!     → Return: ResolutionResult { target_class, method_name } or error
//! ```
//!
//! # Design Decisions
//! - Candidates are tried strictly in template-priority order;
//!   first match wins, no ambiguity resolution beyond ordering
//! - Only successful resolutions are cached; failures self-heal on retry
//! - Resolution stops at the validated (class, method) pair; the host's
//!   dispatch layer owns instantiation and invocation

pub mod controller;
pub mod namespace;

pub use controller::{ControllerResolver, ResolutionError, ResolutionResult};
pub use namespace::{NamespaceError, NamespaceResolver, TargetCandidate};
