use crate::config::{BackendKind, ModelConfig};
use crate::detection::RawDetection;
use crate::labels::LabelMap;
use crate::raster::Raster;

#[cfg(feature = "ort-backend")]
pub mod ort;
pub mod fixed;

pub use fixed::{StaticBackend, StaticDetection};

/// An object-detection model: raster in, pixel-space detections out.
///
/// Takes `&mut self` because backends hold exclusive runtime state (an ONNX
/// session, scratch buffers); callers sharing one instance must serialize.
pub trait DetectionBackend: Send {
    fn name(&self) -> &'static str;

    /// Detections in pixel coordinates of `raster`, in emission order.
    /// An empty vector is a valid result.
    fn infer(&mut self, raster: &Raster) -> anyhow::Result<Vec<RawDetection>>;

    fn labels(&self) -> &LabelMap;
}

/// Build the backend selected by `config`. Called once at startup.
pub fn load_backend(config: &ModelConfig) -> anyhow::Result<Box<dyn DetectionBackend>> {
    config.validate()?;

    let labels = config
        .labels_path
        .as_ref()
        .map(LabelMap::from_file)
        .transpose()?;

    match config.backend {
        BackendKind::Static => {
            tracing::info!("Using static detection backend");
            let backend = match labels {
                Some(labels) => StaticBackend::demo().with_labels(labels),
                None => StaticBackend::demo(),
            };
            Ok(Box::new(backend))
        }
        #[cfg(feature = "ort-backend")]
        BackendKind::Onnx => {
            let labels = labels.unwrap_or_else(LabelMap::coco);
            Ok(Box::new(ort::OrtBackend::load_model(config, labels)?))
        }
        #[cfg(not(feature = "ort-backend"))]
        BackendKind::Onnx => {
            anyhow::bail!("ONNX backend requested but the 'ort-backend' feature is disabled")
        }
    }
}
