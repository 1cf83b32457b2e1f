//! Dependency-closure computation: externalization policy, version
//! resolution, and the cycle-safe recursive calculator.

pub mod calculator;
pub mod policy;
pub mod version;

pub use calculator::{ClosureContext, VisitState};
pub use policy::{Directive, ExternalizationPolicy};
pub use version::VersionResolver;
