use super::DetectionBackend;
use crate::config::{ExecutionProvider, ModelConfig};
use crate::detection::RawDetection;
use crate::labels::LabelMap;
use crate::processing::{
    post::PostProcessor,
    pre::{PreProcessor, Preprocessed},
};
use crate::raster::Raster;
use anyhow::Context;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

const INPUT_NAME: &str = "input";
const BOXES_OUTPUT: &str = "dets";
const LOGITS_OUTPUT: &str = "labels";

/// ONNX Runtime session over a DETR-style detector export.
pub struct OrtBackend {
    session: Session,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
    labels: LabelMap,
}

impl OrtBackend {
    pub fn load_model(config: &ModelConfig, labels: LabelMap) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        match config.execution_provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder
            .commit_from_file(&config.path)
            .with_context(|| format!("Failed to load model from {}", config.path))?;

        tracing::info!(
            path = %config.path,
            input_size = config.input_size,
            labels = labels.len(),
            "Model loaded"
        );

        Ok(Self {
            session,
            preprocessor: PreProcessor::new(config.input_size()),
            postprocessor: PostProcessor::new(config.confidence_threshold),
            labels,
        })
    }
}

impl DetectionBackend for OrtBackend {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn infer(&mut self, raster: &Raster) -> anyhow::Result<Vec<RawDetection>> {
        let Preprocessed { input, transform } = self.preprocessor.preprocess(raster)?;

        let outputs = {
            let _infer_span = tracing::info_span!("model_inference").entered();
            self.session.run(ort::inputs![
                INPUT_NAME => TensorRef::from_array_view(input.view())?
            ])?
        };

        let dets = outputs
            .get(BOXES_OUTPUT)
            .with_context(|| format!("Model has no `{}` output", BOXES_OUTPUT))?
            .try_extract_array::<f32>()?;
        let logits = outputs
            .get(LOGITS_OUTPUT)
            .with_context(|| format!("Model has no `{}` output", LOGITS_OUTPUT))?
            .try_extract_array::<f32>()?;

        self.postprocessor
            .parse_detections(&dets, &logits, &transform)
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }
}
