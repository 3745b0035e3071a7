use common::{Environment, LogLevel};
use inference::{ImageDecoder, ModelConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_level: LogLevel,
    pub otel_endpoint: Option<String>,
    pub max_image_bytes: usize,
    pub max_image_dimension: u32,
    pub max_decoded_bytes: u64,
    pub model: ModelConfig,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn image_decoder(&self) -> ImageDecoder {
        ImageDecoder::new(self.max_image_bytes)
            .with_max_dimension(self.max_image_dimension)
            .with_max_decoded_bytes(self.max_decoded_bytes)
    }

    /// Request body limit: base64 inflates by 4/3, plus room for the JSON envelope.
    pub fn max_body_bytes(&self) -> usize {
        self.max_image_bytes / 3 * 4 + 4 + 1024
    }
}

/// Load configuration from defaults overridden by `GATEWAY_*` environment
/// variables. Nested keys use `__`, e.g. `GATEWAY_MODEL__BACKEND=onnx`.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8000)?
        .set_default("environment", "development")?
        .set_default("log_level", "info")?
        .set_default("max_image_bytes", inference::codec::DEFAULT_MAX_IMAGE_BYTES as u64)?
        .set_default("max_image_dimension", inference::codec::DEFAULT_MAX_IMAGE_DIMENSION as u64)?
        .set_default("max_decoded_bytes", inference::codec::DEFAULT_MAX_DECODED_BYTES)?
        .set_default("model.backend", "static")?
        .set_default("model.path", "models/model.onnx")?
        .set_default("model.input_size", 512)?
        .set_default("model.confidence_threshold", 0.5)?
        .set_default("model.execution_provider", "cpu")?
        .set_default("model.intra_threads", 4)?
        .add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize::<Config>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference::{BackendKind, ExecutionProvider};
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 5] = [
        "GATEWAY_PORT",
        "GATEWAY_ENVIRONMENT",
        "GATEWAY_MODEL__BACKEND",
        "GATEWAY_MODEL__CONFIDENCE_THRESHOLD",
        "GATEWAY_MODEL__LABELS_PATH",
    ];

    fn clear_vars() {
        for var in VARS {
            // SAFETY: tests touching the environment run serially
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_vars();

        let config = get_configuration().unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.otel_endpoint.is_none());
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_image_dimension, 8192);
        assert_eq!(config.max_decoded_bytes, 256 * 1024 * 1024);
        assert_eq!(config.model.backend, BackendKind::Static);
        assert_eq!(config.model.execution_provider, ExecutionProvider::Cpu);
        assert_eq!(config.model.input_size(), (512, 512));
        assert!(config.model.labels_path.is_none());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_vars();
        unsafe {
            env::set_var("GATEWAY_PORT", "9100");
            env::set_var("GATEWAY_ENVIRONMENT", "production");
            env::set_var("GATEWAY_MODEL__BACKEND", "onnx");
            env::set_var("GATEWAY_MODEL__CONFIDENCE_THRESHOLD", "0.35");
            env::set_var("GATEWAY_MODEL__LABELS_PATH", "/models/labels.txt");
        }

        let config = get_configuration();
        clear_vars();
        let config = config.unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.model.backend, BackendKind::Onnx);
        assert!((config.model.confidence_threshold - 0.35).abs() < 1e-6);
        assert_eq!(
            config.model.labels_path.as_deref(),
            Some("/models/labels.txt")
        );
    }

    #[test]
    #[serial]
    fn test_unknown_backend_rejected() {
        clear_vars();
        unsafe { env::set_var("GATEWAY_MODEL__BACKEND", "tensorrt") };

        let result = get_configuration();
        clear_vars();

        assert!(result.is_err());
    }

    #[test]
    fn test_body_limit_covers_base64_payload() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Development,
            log_level: LogLevel::Info,
            otel_endpoint: None,
            max_image_bytes: 3000,
            max_image_dimension: 8192,
            max_decoded_bytes: 1 << 20,
            model: ModelConfig::default(),
        };
        // 3000 bytes encode to 4000 base64 chars
        assert!(config.max_body_bytes() >= 4000 + r#"{"image":""}"#.len());
    }
}
