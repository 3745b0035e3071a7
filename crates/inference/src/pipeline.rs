use crate::backend::DetectionBackend;
use crate::codec::ImageDecoder;
use crate::detection::{NormalizedDetection, normalize};
use crate::errors::{InferenceError, PredictError};
use crate::raster::Raster;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

struct PipelineMetrics {
    duration: Histogram<f64>,
    requests: Counter<u64>,
    failures: Counter<u64>,
    detections: Counter<u64>,
}

impl PipelineMetrics {
    fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.5, 5.0,
        ];
        Self {
            duration: meter
                .f64_histogram("predict_duration_seconds")
                .with_description("Time to serve one prediction (decode + infer + normalize)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            requests: meter
                .u64_counter("predict_requests_total")
                .with_description("Total prediction requests")
                .build(),
            failures: meter
                .u64_counter("predict_failures_total")
                .with_description("Failed prediction requests by error kind")
                .build(),
            detections: meter
                .u64_counter("predict_detections_total")
                .with_description("Total detections returned")
                .build(),
        }
    }
}

/// Decode, run the shared backend, and shape detections for the response.
///
/// One instance is built at startup and shared across requests. The backend
/// sits behind a mutex, so at most one inference runs at a time.
pub struct DetectionPipeline {
    backend: Mutex<Box<dyn DetectionBackend>>,
    decoder: ImageDecoder,
    backend_name: &'static str,
    label_count: usize,
    metrics: PipelineMetrics,
}

impl DetectionPipeline {
    pub fn new(backend: Box<dyn DetectionBackend>, decoder: ImageDecoder) -> Self {
        let backend_name = backend.name();
        let label_count = backend.labels().len();
        Self {
            backend: Mutex::new(backend),
            decoder,
            backend_name,
            label_count,
            metrics: PipelineMetrics::new("inference"),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// Full request path: base64 payload in, normalized detections out.
    pub fn predict(&self, encoded: &str) -> Result<Vec<NormalizedDetection>, PredictError> {
        let start = Instant::now();
        self.metrics.requests.add(1, &[]);

        let result = self
            .decoder
            .decode(encoded)
            .map_err(PredictError::from)
            .and_then(|raster| self.detect(&raster).map_err(PredictError::from));

        self.metrics
            .duration
            .record(start.elapsed().as_secs_f64(), &[]);

        match &result {
            Ok(detections) => {
                self.metrics.detections.add(detections.len() as u64, &[]);
            }
            Err(e) => {
                self.metrics
                    .failures
                    .add(1, &[KeyValue::new("error.kind", e.kind())]);
            }
        }

        result
    }

    /// Run the backend on `raster` and normalize its detections.
    ///
    /// Output order is the backend's emission order.
    pub fn detect(&self, raster: &Raster) -> Result<Vec<NormalizedDetection>, InferenceError> {
        let span = tracing::info_span!(
            "detect",
            width = raster.width(),
            height = raster.height(),
            backend = self.backend_name
        );
        let _enter = span.enter();

        // A panic in an earlier call leaves the backend itself usable
        let mut backend = self.backend.lock().unwrap_or_else(|poisoned| {
            tracing::error!(
                backend = self.backend_name,
                "Backend panicked during a previous inference, recovering lock"
            );
            self.backend.clear_poison();
            PoisonError::into_inner(poisoned)
        });

        let raw = backend.infer(raster).map_err(InferenceError::Backend)?;
        let labels = backend.labels();

        let detections = raw
            .iter()
            .enumerate()
            .map(|(index, det)| {
                normalize(
                    det,
                    raster.width(),
                    raster.height(),
                    labels.resolve(det.class_id),
                )
                .ok_or(InferenceError::NonFiniteOutput { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = detections.len(), "Detections normalized");

        Ok(detections)
    }
}
