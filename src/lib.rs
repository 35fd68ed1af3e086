//! livetrace: real-time scalar time-series chart engine.
//!
//! This crate owns the data and viewport core of a live sensor chart:
//! ordered sample storage with approximate range search, causal smoothing,
//! annotation projection, auto-scaling viewport state and incremental
//! polyline building. Rendering backends, gesture decoding and persistence
//! stay host-side.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod telemetry;

pub use api::{ChartEngine, ChartEngineConfig};
pub use error::{ChartError, ChartResult};
