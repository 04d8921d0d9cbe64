//! ONNX Runtime backend.
//!
//! Graphs are fetched over HTTP(S) with `reqwest` or read from disk, then
//! committed to an `ort` session from memory. Tensors cross the boundary as
//! `(shape, Vec<f32>)` pairs so the crate's own `ndarray` version stays independent
//! of the runtime's.
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::Tensor as OrtTensor;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::is_url;
use crate::core::tensor::{MemoryLedger, Tensor};
use crate::models::{BackendError, GraphModel, ModelLoader};
use crate::types::ModelName;

pub struct OnnxModel {
    name: ModelName,
    session: Mutex<Session>,
    input_names: Vec<String>,
}

impl OnnxModel {
    pub fn from_bytes(name: ModelName, bytes: &[u8]) -> Result<Self, BackendError> {
        init_environment();

        let session = Session::builder()
            .map_err(|e| BackendError::Deserialize(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| BackendError::Deserialize(format!("optimization level: {e}")))?
            .commit_from_memory(bytes)
            .map_err(|e| BackendError::Deserialize(e.to_string()))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        info!(
            model = %name,
            inputs = ?input_names,
            outputs = session.outputs.len(),
            "ONNX session ready"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_names,
        })
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }
}

/// A failed init surfaces again when the session builder runs.
fn init_environment() {
    match ort::init().with_name("stylepro").commit() {
        Ok(_) => debug!("ONNX Runtime environment ready"),
        Err(e) => warn!(error = %e, "ONNX Runtime environment init failed"),
    }
}

impl GraphModel for OnnxModel {
    fn predict(&self, inputs: &[&Tensor], ledger: &MemoryLedger) -> Result<Tensor, BackendError> {
        if inputs.len() != self.input_names.len() {
            return Err(BackendError::Shape(format!(
                "{} expects {} inputs, got {}",
                self.name,
                self.input_names.len(),
                inputs.len()
            )));
        }

        let mut feeds: Vec<(Cow<'_, str>, SessionInputValue<'_>)> = Vec::with_capacity(inputs.len());
        for (name, tensor) in self.input_names.iter().zip(inputs) {
            let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
            let value = OrtTensor::from_array((shape, tensor.to_vec()))
                .map_err(|e| BackendError::Runtime(format!("input {name}: {e}")))?;
            feeds.push((Cow::Borrowed(name.as_str()), value.into_dyn().into()));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| BackendError::Runtime("session lock poisoned".into()))?;
        let outputs = session
            .run(SessionInputs::from(feeds))
            .map_err(|e| BackendError::Runtime(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| BackendError::Runtime(format!("output: {e}")))?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        ledger.from_shape_vec(&dims, data.to_vec())
    }
}

/// Loads graphs from URLs (via `reqwest`) or local paths.
#[derive(Clone, Default)]
pub struct OnnxLoader {
    client: Client,
}

impl OnnxLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, BackendError> {
        if is_url(location) {
            let response = self
                .client
                .get(location)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| BackendError::Fetch(e.to_string()))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| BackendError::Fetch(e.to_string()))?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(location)
                .await
                .map_err(|e| BackendError::Fetch(format!("{location}: {e}")))
        }
    }
}

#[async_trait]
impl ModelLoader for OnnxLoader {
    async fn load(
        &self,
        name: ModelName,
        location: &str,
    ) -> Result<Arc<dyn GraphModel>, BackendError> {
        let bytes = self.fetch(location).await?;
        debug!(model = %name, bytes = bytes.len(), "graph fetched");

        let model = tokio::task::spawn_blocking(move || OnnxModel::from_bytes(name, &bytes))
            .await
            .map_err(|e| BackendError::Runtime(e.to_string()))??;
        Ok(Arc::new(model))
    }
}

#[cfg(all(test, feature = "onnx"))]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::Error;
    use crate::models::ModelCache;
    use crate::notify::NoopNotifier;

    fn config_over(dir: &std::path::Path) -> EngineConfig {
        EngineConfig {
            model_base: dir.to_string_lossy().into_owned(),
            ..EngineConfig::default()
        }
    }

    fn cache_for(config: &EngineConfig) -> ModelCache {
        ModelCache::new(
            Arc::new(OnnxLoader::new()),
            config.clone(),
            Arc::new(NoopNotifier),
        )
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_graph_file_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("absent.onnx");
        let result = OnnxLoader::new()
            .load(ModelName::StyleFast, &location.to_string_lossy())
            .await;
        assert!(matches!(result, Err(BackendError::Fetch(_))));
    }

    #[test]
    fn garbage_bytes_are_a_deserialize_error() {
        let result = OnnxModel::from_bytes(ModelName::StyleFast, b"not an onnx graph");
        assert!(matches!(result, Err(BackendError::Deserialize(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cache_reports_missing_graph_as_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_for(&config_over(dir.path()));

        let err = cache.get(ModelName::StyleFast).await.unwrap_err();
        assert!(matches!(err, Error::ModelLoad { model: ModelName::StyleFast, .. }));
        assert!(cache.loaded().await.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cache_reports_corrupt_graph_as_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_over(dir.path());
        let cache = cache_for(&config);
        let location = std::path::PathBuf::from(config.model_location(ModelName::TransformFast));
        std::fs::create_dir_all(location.parent().unwrap()).unwrap();
        std::fs::write(&location, b"\x08\x01garbage").unwrap();

        let err = cache.get(ModelName::TransformFast).await.unwrap_err();
        match err {
            Error::ModelLoad { model, reason } => {
                assert_eq!(model, ModelName::TransformFast);
                assert!(reason.contains("deserialize"), "{reason}");
            }
            other => panic!("expected a model load error, got {other}"),
        }
        assert!(cache.loaded().await.is_empty());
    }
}
