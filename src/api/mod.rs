pub mod engine;
pub mod engine_config;
pub mod engine_snapshot;
pub mod observers;

pub use engine::ChartEngine;
pub use engine_config::ChartEngineConfig;
pub use engine_snapshot::EngineSnapshot;
pub use observers::{ChartEvent, ChartObserver};
