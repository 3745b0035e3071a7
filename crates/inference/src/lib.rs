pub mod backend;
pub mod codec;
pub mod config;
pub mod detection;
pub mod errors;
pub mod labels;
pub mod pipeline;
pub mod processing;
pub mod raster;

// Re-export commonly used types for convenience
pub use backend::{DetectionBackend, StaticBackend, load_backend};
pub use codec::{ImageDecoder, decode};
pub use config::{BackendKind, ExecutionProvider, ModelConfig};
pub use detection::{NormalizedDetection, RawDetection};
pub use errors::{InferenceError, InvalidImageError, PredictError};
pub use labels::LabelMap;
pub use pipeline::DetectionPipeline;
pub use raster::Raster;
