#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod field;
pub mod noise;
pub mod overlay;
pub mod persist;
pub mod pipeline;
pub mod raster_cpu;
pub mod streak;
pub mod surface;

pub use config::PipelineConfig;
pub use error::{StreaklabError, StreaklabResult};
pub use persist::{FrameRgba, MemorySink, PngDirSink, SnapshotSink};
pub use pipeline::{Stage, run_pipeline};
pub use streak::{StreakLedger, StreakRecord};
pub use surface::Surface;
