//! Security validation subsystem.
//!
//! # Data Flow
//! ```text
//! (target_class, method_name, verb)
//!     → metadata.rs (host-supplied class/method descriptions)
//!     → validator.rs (fixed short-circuit pipeline)
//!     → Return: Verdict::Allowed or Verdict::Denied { reason, message }
//! ```
//!
//! # Design Decisions
//! - Pure over supplied metadata: no I/O, no hidden state, each layer
//!   unit-testable in isolation
//! - Cheap string checks run before any metadata lookup
//! - Verdicts are values, never exceptions; all-or-nothing per candidate
//! - The metadata contract is a capability trait the host implements;
//!   the validator never touches live reflection

pub mod metadata;
pub mod validator;

pub use metadata::{
    ClassMetadata, MetadataProvider, MethodMetadata, ParameterMetadata, StaticMetadataRegistry,
    Visibility,
};
pub use validator::{
    AuthorizationHook, DenyReason, SecurityValidator, ValidatorBuildError, Verdict,
};
