//! Lazily loaded, process-lifetime cache of the four named graphs.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{ModelHandle, ModelLoader};
use crate::notify::HostNotifier;
use crate::types::{ModelName, StyleModel, TransformModel};

pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    config: EngineConfig,
    notifier: Arc<dyn HostNotifier>,
    // Held across the load so each name is fetched at most once
    handles: Mutex<HashMap<ModelName, ModelHandle>>,
}

impl ModelCache {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        config: EngineConfig,
        notifier: Arc<dyn HostNotifier>,
    ) -> Self {
        Self {
            loader,
            config,
            notifier,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached handle for `name`, fetching and deserializing it on first use.
    pub async fn get(&self, name: ModelName) -> Result<ModelHandle> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(&name) {
            debug!(model = %name, "using cached model");
            return Ok(handle.clone());
        }

        let location = self.config.model_location(name);
        info!(model = %name, location = %location, "Loading model");
        let start = Instant::now();

        let model = self.loader.load(name, &location).await.map_err(|e| {
            warn!(model = %name, error = %e, "model load failed");
            Error::model_load(name, e)
        })?;
        let handle = ModelHandle::new(name, model);
        handles.insert(name, handle.clone());
        drop(handles);

        info!(model = %name, elapsed = ?start.elapsed(), "Model loaded");
        self.notifier.broadcast(name.loaded_event());
        Ok(handle)
    }

    pub async fn style_model(&self, variant: StyleModel) -> Result<ModelHandle> {
        self.get(variant.model_name()).await
    }

    pub async fn transform_model(&self, variant: TransformModel) -> Result<ModelHandle> {
        self.get(variant.model_name()).await
    }

    pub async fn is_loaded(&self, name: ModelName) -> bool {
        self.handles.lock().await.contains_key(&name)
    }

    pub async fn loaded(&self) -> Vec<ModelName> {
        let mut names: Vec<ModelName> = self.handles.lock().await.keys().copied().collect();
        names.sort();
        names
    }

    /// Drop the cached handle for `name`. Only the benchmark teardown does this.
    pub async fn evict(&self, name: ModelName) -> Option<ModelHandle> {
        let evicted = self.handles.lock().await.remove(&name);
        if evicted.is_some() {
            info!(model = %name, "Model disposed");
        }
        evicted
    }
}
