//! Pipeline orchestration and run reporting.
//!
//! - [`checksum`] - SHA-256 of the final container (and of bundle trees)
//! - [`orchestrator`] - the [`Pipeline`] that runs every stage in order
//! - [`report`] - [`PipelineReport`] and the non-fatal [`PipelineWarning`]s
//! - [`tool_detection`] - prerequisite checks

pub mod checksum;
mod orchestrator;
mod report;
pub mod tool_detection;

pub use orchestrator::Pipeline;
pub use report::{PipelineReport, PipelineWarning};
