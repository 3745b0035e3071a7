use super::DetectionBackend;
use crate::detection::RawDetection;
use crate::labels::LabelMap;
use crate::raster::Raster;

/// A detection with corners given as fractions of the raster size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: u32,
    pub score: f32,
}

/// Backend that reports the same detections for every raster, scaled to
/// its size. Serves demo deployments without a model file.
pub struct StaticBackend {
    detections: Vec<StaticDetection>,
    labels: LabelMap,
}

impl StaticBackend {
    pub fn new(detections: Vec<StaticDetection>, labels: LabelMap) -> Self {
        Self { detections, labels }
    }

    /// A single `demo_object` covering (0.1, 0.1)-(0.4, 0.4) at 0.95.
    pub fn demo() -> Self {
        Self::new(
            vec![StaticDetection {
                x1: 0.1,
                y1: 0.1,
                x2: 0.4,
                y2: 0.4,
                class_id: 0,
                score: 0.95,
            }],
            LabelMap::new(["demo_object"]),
        )
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), LabelMap::new(["demo_object"]))
    }

    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = labels;
        self
    }
}

impl DetectionBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn infer(&mut self, raster: &Raster) -> anyhow::Result<Vec<RawDetection>> {
        let w = raster.width() as f32;
        let h = raster.height() as f32;

        Ok(self
            .detections
            .iter()
            .map(|d| RawDetection {
                x1: d.x1 * w,
                y1: d.y1 * h,
                x2: d.x2 * w,
                y2: d.y2 * h,
                class_id: d.class_id,
                score: d.score,
            })
            .collect())
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }
}
