//! Core processing module
//!
//! This module contains the components that turn parsed exports into output:
//! - `merge` - Monthly partitioning and idempotent merge into existing files
//! - `pipeline` - File and directory orchestration, preview mode

pub mod merge;
pub mod pipeline;

pub use merge::MonthlyMergeEngine;
pub use pipeline::Pipeline;
