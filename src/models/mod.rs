//! Inference backend seam and the model cache.
//!
//! The pipeline only talks to [`GraphModel`] and [`ModelLoader`]. The `onnx`
//! feature provides the ONNX Runtime implementation in [`onnx`]; any other
//! runtime (or a test double) can be plugged in through the same traits.
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::tensor::{MemoryLedger, Tensor};
use crate::types::ModelName;

pub mod cache;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use cache::ModelCache;

/// Errors reported by an inference backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("could not deserialize graph: {0}")]
    Deserialize(String),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// A loaded inference graph.
pub trait GraphModel: Send + Sync {
    /// Run one forward pass. The output is allocated through `ledger`.
    fn predict(&self, inputs: &[&Tensor], ledger: &MemoryLedger) -> Result<Tensor, BackendError>;
}

/// Fetches and deserializes a graph from a location (URL or path).
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(
        &self,
        name: ModelName,
        location: &str,
    ) -> Result<Arc<dyn GraphModel>, BackendError>;
}

/// Shared reference to a loaded graph, tagged with its logical name.
#[derive(Clone)]
pub struct ModelHandle {
    name: ModelName,
    model: Arc<dyn GraphModel>,
}

impl ModelHandle {
    pub fn new(name: ModelName, model: Arc<dyn GraphModel>) -> Self {
        Self { name, model }
    }

    pub fn name(&self) -> ModelName {
        self.name
    }

    pub fn predict(&self, inputs: &[&Tensor], ledger: &MemoryLedger) -> Result<Tensor, BackendError> {
        self.model.predict(inputs, ledger)
    }

    /// True when both handles point at the same loaded graph.
    pub fn ptr_eq(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.model, &other.model)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle").field("name", &self.name).finish()
    }
}
