use serde::{Deserialize, Serialize};

/// One candidate object as emitted by a backend, in raster pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: u32,
    pub score: f32,
}

impl RawDetection {
    fn is_finite(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2, self.score]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Response contract unit: box corners as fractions of the image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDetection {
    pub label: String,
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub score: f32,
}

/// Scale a pixel-space detection into unit coordinates.
///
/// Returns `None` for non-finite input. Coordinates and score are clamped to
/// [0, 1] and corner order is enforced so `xmin <= xmax` and `ymin <= ymax`.
pub fn normalize(
    raw: &RawDetection,
    width: u32,
    height: u32,
    label: String,
) -> Option<NormalizedDetection> {
    if !raw.is_finite() {
        return None;
    }

    let w = width as f32;
    let h = height as f32;

    let x1 = unit(raw.x1 / w);
    let x2 = unit(raw.x2 / w);
    let y1 = unit(raw.y1 / h);
    let y2 = unit(raw.y2 / h);

    Some(NormalizedDetection {
        label,
        xmin: x1.min(x2),
        ymin: y1.min(y2),
        xmax: x1.max(x2),
        ymax: y1.max(y2),
        score: unit(raw.score),
    })
}

#[inline]
fn unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}
