use anyhow::Context;
use std::path::Path;

/// COCO 2017 class names, indexed by the 0-based class id.
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Class id to label string mapping owned by a detection backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn coco() -> Self {
        Self::new(COCO_LABELS)
    }

    /// Load one label per line; the line index is the class id.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid label file {}", path.display()))
    }

    fn parse(contents: &str) -> anyhow::Result<Self> {
        let mut labels: Vec<&str> = contents.lines().map(str::trim).collect();
        while labels.last().is_some_and(|l| l.is_empty()) {
            labels.pop();
        }

        if labels.is_empty() {
            anyhow::bail!("no labels found");
        }

        Ok(Self::new(labels))
    }

    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.labels.get(class_id as usize).map(String::as_str)
    }

    /// Label for `class_id`, or `class_<id>` when the id is outside the map.
    pub fn resolve(&self, class_id: u32) -> String {
        match self.get(class_id) {
            Some(label) => label.to_string(),
            None => format!("class_{}", class_id),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::coco()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_lookup() {
        let labels = LabelMap::coco();
        assert_eq!(labels.len(), 80);
        assert_eq!(labels.get(0), Some("person"));
        assert_eq!(labels.get(16), Some("dog"));
        assert_eq!(labels.get(79), Some("toothbrush"));
        assert_eq!(labels.get(80), None);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let labels = LabelMap::new(["demo_object"]);
        assert_eq!(labels.resolve(0), "demo_object");
        assert_eq!(labels.resolve(7), "class_7");
    }

    #[test]
    fn test_parse_keeps_line_index() {
        let labels = LabelMap::parse("cat\n\n  dog \n\n").unwrap();
        assert_eq!(labels.len(), 3, "Trailing blank lines are dropped");
        assert_eq!(labels.get(0), Some("cat"));
        assert_eq!(labels.get(1), Some(""));
        assert_eq!(labels.get(2), Some("dog"));
    }

    #[test]
    fn test_parse_empty_file_fails() {
        assert!(LabelMap::parse("\n\n").is_err());
    }

    #[test]
    fn test_from_missing_file_fails() {
        let err = LabelMap::from_file("/nonexistent/labels.txt").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/labels.txt"));
    }
}
