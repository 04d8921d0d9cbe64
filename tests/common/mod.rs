//! Deterministic in-memory backend and fixtures shared by the integration tests.
//!
//! The fake style encoder maps an image to an embedding whose entry `i` is the
//! mean of channel `i % 3`. The fake transformer paints every pixel with the
//! first three embedding values. Solid-color inputs therefore give outputs that
//! can be computed by hand.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use stylepro::core::processing::blend::{EMBEDDING_DIM, EMBEDDING_SHAPE};
use stylepro::{
    BackendError, EngineConfig, GraphModel, MemoryLedger, ModelLoader, ModelName,
    RecordingNotifier, StyleContext, Tensor,
};

pub const STYLE_RGB: [u8; 3] = [200, 30, 30];
pub const SECOND_STYLE_RGB: [u8; 3] = [10, 240, 60];
pub const CONTENT_RGB: [u8; 3] = [20, 120, 220];

#[derive(Default)]
pub struct FakeLoader {
    fetches: Mutex<HashMap<ModelName, usize>>,
    failing: HashSet<ModelName>,
    broken: HashSet<ModelName>,
    pub style_calls: Arc<AtomicUsize>,
    pub transform_calls: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetching any of `names` fails.
    pub fn failing(names: &[ModelName]) -> Self {
        Self {
            failing: names.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// `names` load fine but every forward pass fails.
    pub fn broken(names: &[ModelName]) -> Self {
        Self {
            broken: names.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn fetch_count(&self, name: ModelName) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(&name)
            .copied()
            .unwrap_or(0)
    }

    pub fn style_calls(&self) -> usize {
        self.style_calls.load(Ordering::SeqCst)
    }

    pub fn transform_calls(&self) -> usize {
        self.transform_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for FakeLoader {
    async fn load(
        &self,
        name: ModelName,
        location: &str,
    ) -> Result<Arc<dyn GraphModel>, BackendError> {
        *self.fetches.lock().unwrap().entry(name).or_insert(0) += 1;
        tokio::task::yield_now().await;

        if self.failing.contains(&name) {
            return Err(BackendError::Fetch(format!("404 Not Found: {location}")));
        }
        let broken = self.broken.contains(&name);
        let model: Arc<dyn GraphModel> = match name {
            ModelName::StyleFast | ModelName::StyleHigh => Arc::new(FakeStyleNet {
                calls: Arc::clone(&self.style_calls),
                broken,
            }),
            ModelName::TransformFast | ModelName::TransformHigh => Arc::new(FakeTransformNet {
                calls: Arc::clone(&self.transform_calls),
                broken,
            }),
        };
        Ok(model)
    }
}

pub struct FakeStyleNet {
    calls: Arc<AtomicUsize>,
    broken: bool,
}

impl GraphModel for FakeStyleNet {
    fn predict(&self, inputs: &[&Tensor], ledger: &MemoryLedger) -> Result<Tensor, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let [image] = inputs else {
            return Err(BackendError::Shape(format!("expected 1 input, got {}", inputs.len())));
        };
        if image.shape().len() != 4 || image.shape()[3] != 3 {
            return Err(BackendError::Shape(format!("bad image {:?}", image.shape())));
        }
        // Scratch allocation that must not outlive the stage
        let _features = ledger.zeros(&[1, 8]);
        if self.broken {
            return Err(BackendError::Runtime("style graph crashed".into()));
        }

        let values = image.to_vec();
        let pixels = (values.len() / 3).max(1) as f32;
        let mut means = [0f32; 3];
        for (i, v) in values.iter().enumerate() {
            means[i % 3] += v;
        }
        for m in &mut means {
            *m /= pixels;
        }
        let embedding = (0..EMBEDDING_DIM).map(|i| means[i % 3]).collect();
        ledger.from_shape_vec(&EMBEDDING_SHAPE, embedding)
    }
}

pub struct FakeTransformNet {
    calls: Arc<AtomicUsize>,
    broken: bool,
}

impl GraphModel for FakeTransformNet {
    fn predict(&self, inputs: &[&Tensor], ledger: &MemoryLedger) -> Result<Tensor, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let [content, embedding] = inputs else {
            return Err(BackendError::Shape(format!("expected 2 inputs, got {}", inputs.len())));
        };
        let &[1, height, width, 3] = content.shape() else {
            return Err(BackendError::Shape(format!("bad content {:?}", content.shape())));
        };
        let _activations = ledger.zeros(&[height, width]);
        if self.broken {
            return Err(BackendError::Runtime("transform graph crashed".into()));
        }

        let style = embedding.to_vec();
        if style.len() < 3 {
            return Err(BackendError::Shape(format!("bad embedding {:?}", embedding.shape())));
        }
        let data = (0..height * width)
            .flat_map(|_| [style[0], style[1], style[2]])
            .collect();
        ledger.from_shape_vec(&[1, height, width, 3], data)
    }
}

pub fn write_solid(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(&path)
        .unwrap();
    path
}

pub fn config_for(dir: &Path) -> EngineConfig {
    EngineConfig {
        model_base: "https://models.invalid/arbitrary".to_string(),
        output_dir: dir.join("out"),
        ..EngineConfig::default()
    }
}

pub fn context(
    dir: &Path,
    loader: &Arc<FakeLoader>,
    notifier: &Arc<RecordingNotifier>,
) -> StyleContext {
    StyleContext::with_notifier(config_for(dir), loader.clone(), notifier.clone())
}

/// Expected 8-bit value after blending two channel values with `ratio`.
pub fn blended_channel(style: u8, content: u8, ratio: f32) -> u8 {
    let v = (style as f32 / 255.0) * ratio + (content as f32 / 255.0) * (1.0 - ratio);
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn assert_close(actual: [u8; 3], expected: [u8; 3]) {
    for c in 0..3 {
        let diff = (actual[c] as i16 - expected[c] as i16).abs();
        assert!(diff <= 1, "channel {c}: got {actual:?}, expected {expected:?}");
    }
}
