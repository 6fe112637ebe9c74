//! Merge pipeline for vouch.
//!
//! Merging is a tree overlay, not a value-level reconciliation. Each step
//! copies a source store's values into a destination path of one output
//! tree; steps run in the order they were added. Under the default
//! [`OverlayPolicy::Overwrite`] the last-added source wins for any path
//! written by more than one step. There is no conflict detection, quorum or
//! timestamp rule.

pub mod error;
pub mod pipeline;

pub use error::{MergeError, MergeResult};
pub use pipeline::{MergePipeline, OverlayPolicy};
