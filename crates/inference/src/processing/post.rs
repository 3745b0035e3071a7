use crate::detection::RawDetection;
use crate::processing::TransformParams;

pub struct PostProcessor {
    pub confidence_threshold: f32,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Decode DETR-style output into pixel-space detections on the source raster.
    ///
    /// Emission order follows query order.
    #[tracing::instrument(skip_all, fields(queries = tracing::field::Empty))]
    pub fn parse_detections(
        &self,
        dets: &ndarray::ArrayViewD<f32>, // [1, Q, 4] - boxes in cxcywh format (normalized 0-1)
        logits: &ndarray::ArrayViewD<f32>, // [1, Q, C] - class logits, index 0 = background
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<RawDetection>> {
        let (num_queries, num_classes) = validate_shapes(dets.shape(), logits.shape())?;
        tracing::Span::current().record("queries", num_queries);

        let mut detections = Vec::new();

        for i in 0..num_queries {
            // Argmax over foreground classes; model index c is class id c - 1
            let mut max_logit = f32::NEG_INFINITY;
            let mut class_idx = 1usize;
            for c in 1..num_classes {
                let logit = logits[[0, i, c]];
                if logit > max_logit {
                    max_logit = logit;
                    class_idx = c;
                }
            }

            let confidence = sigmoid(max_logit);

            if confidence < self.confidence_threshold {
                continue;
            }

            let (x1_norm, y1_norm, x2_norm, y2_norm) = cxcywh_to_xyxy(
                dets[[0, i, 0]],
                dets[[0, i, 1]],
                dets[[0, i, 2]],
                dets[[0, i, 3]],
            );

            let (x1, y1) = to_source(x1_norm, y1_norm, transform);
            let (x2, y2) = to_source(x2_norm, y2_norm, transform);

            detections.push(RawDetection {
                x1,
                y1,
                x2,
                y2,
                class_id: (class_idx - 1) as u32,
                score: confidence,
            });
        }

        tracing::debug!(kept = detections.len(), "Parsed detections");

        Ok(detections)
    }
}

fn validate_shapes(dets: &[usize], logits: &[usize]) -> anyhow::Result<(usize, usize)> {
    match (dets, logits) {
        ([1, q, 4], [1, lq, c]) if q == lq && *c >= 2 => Ok((*q, *c)),
        _ => anyhow::bail!(
            "Unexpected model output shapes: dets {:?}, logits {:?} (expected [1, Q, 4] and [1, Q, C>=2])",
            dets,
            logits
        ),
    }
}

/// Map a normalized model-space point back onto the source raster, clamped to its bounds.
#[inline]
fn to_source(x_norm: f32, y_norm: f32, transform: &TransformParams) -> (f32, f32) {
    let x_input = x_norm * transform.input_width as f32;
    let y_input = y_norm * transform.input_height as f32;

    let x = ((x_input - transform.offset_x) / transform.scale).clamp(0.0, transform.orig_width as f32);
    let y = ((y_input - transform.offset_y) / transform.scale).clamp(0.0, transform.orig_height as f32);
    (x, y)
}

/// Sigmoid activation function
#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}
