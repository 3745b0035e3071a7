use serde::Deserialize;

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (512, 512);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Fixed detections, no model file needed
    Static,
    /// ONNX Runtime session over a DETR-style export
    Onnx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub backend: BackendKind,
    pub path: String,
    pub labels_path: Option<String>,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
}

impl ModelConfig {
    pub fn input_size(&self) -> (u32, u32) {
        (self.input_size, self.input_size)
    }

    /// Reject settings the pre/post-processing cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.input_size > 0, "model.input_size must be greater than 0");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.confidence_threshold),
            "model.confidence_threshold must be within [0, 1], got {}",
            self.confidence_threshold
        );
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Static,
            path: "models/model.onnx".to_string(),
            labels_path: None,
            input_size: DEFAULT_INPUT_SIZE.0,
            confidence_threshold: 0.5,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_input_size_rejected() {
        let config = ModelConfig {
            input_size: 0,
            ..ModelConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("input_size"));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = ModelConfig {
            confidence_threshold: 1.5,
            ..ModelConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
