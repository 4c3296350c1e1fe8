//! Orchestrator phases: one module per campaign stage family.
//!
//! - **mesh**: directory trees, input staging, compile, binary distribution
//! - **link**: `prepare_solve` / `clean_solve` against the master mesh
//! - **submit**: mesher, job-array and throttled per-event submissions
//!
//! Each phase exposes an idempotent reconcile entry point returning a `StageReport`.

pub mod link;
pub mod mesh;
pub mod submit;

pub use link::LinkDirection;
