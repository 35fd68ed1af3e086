pub mod path;
pub mod smoothing;
pub mod store;
pub mod ticks;
pub mod types;
pub mod viewport;

pub use path::{IncrementalPathBuilder, PathPoint, PathTuning};
pub use smoothing::{KernelKind, SmoothingConfig, SmoothingFilter};
pub use store::SampleStore;
pub use ticks::{Tick, TickGenerator};
pub use types::{Sample, StatKind, Statistic, SurfaceSize};
pub use viewport::{Capabilities, PlacementMode, Viewport, ViewportTuning};
