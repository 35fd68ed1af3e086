//! Annotation support layered on top of the sample core.
//!
//! Keep extensions decoupled from core query paths; they consume the store
//! through its public API only.

pub mod labels;

pub use labels::{LabelProjection, LabelProjector, PendingBucket, PendingCounts};
