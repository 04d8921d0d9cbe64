//! Model benchmark harness.
//!
//! Loads each graph in a fixed order, profiles one warm-up call, times a
//! series of calls on synthetic standard-normal input, then evicts the graph
//! and drops every synthetic tensor.
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use sysinfo::{ProcessesToUpdate, System};
use tokio::task::yield_now;
use tracing::{info, warn};

use crate::core::processing::blend::EMBEDDING_SHAPE;
use crate::core::tensor::{MemoryLedger, MemorySnapshot, Tensor};
use crate::error::{Error, Result};
use crate::models::{ModelCache, ModelHandle};
use crate::types::{ModelKind, ModelName, Stage};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Benchmark {
    /// Timed calls per model, after the warm-up
    pub runs: usize,
    pub seed: u64,
    /// Side of the square synthetic image
    pub image_size: usize,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self {
            runs: 10,
            seed: 42,
            image_size: 256,
        }
    }
}

/// Warm-up profile and timings for one graph.
#[derive(Debug, Clone, Serialize)]
pub struct ModelProfile {
    pub model: ModelName,
    pub load_ms: f64,
    pub warmup_ms: f64,
    /// Tensors still alive after the warm-up call (its output)
    pub new_tensors: u64,
    pub new_bytes: u64,
    pub peak_bytes: u64,
    pub output_shape: Vec<usize>,
    /// Resident memory of this process after the warm-up, when available
    pub process_memory_bytes: Option<u64>,
    pub runs: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub started_at: DateTime<Utc>,
    pub image_size: usize,
    pub profiles: Vec<ModelProfile>,
    /// Ledger state once every model and input has been released
    pub ledger: MemorySnapshot,
}

struct SyntheticInputs {
    image: Tensor,
    embedding: Tensor,
}

impl Benchmark {
    pub async fn run(&self, cache: &ModelCache, ledger: &MemoryLedger) -> Result<BenchmarkReport> {
        let started_at = Utc::now();
        info!(runs = self.runs, image_size = self.image_size, "Starting benchmark");

        let inputs = self.synthetic_inputs(ledger)?;
        let mut profiles = Vec::with_capacity(ModelName::ALL.len());

        for name in ModelName::ALL {
            yield_now().await;
            let profile = self.profile_model(cache, ledger, &inputs, name).await;
            cache.evict(name).await;
            let profile = profile?;
            info!(
                model = %profile.model,
                mean_ms = %format!("{:.2}", profile.mean_ms),
                min_ms = %format!("{:.2}", profile.min_ms),
                max_ms = %format!("{:.2}", profile.max_ms),
                new_tensors = profile.new_tensors,
                new_bytes = profile.new_bytes,
                "{} benchmark done",
                profile.model
            );
            profiles.push(profile);
        }

        let SyntheticInputs { image, embedding } = inputs;
        image.release();
        embedding.release();

        let snapshot = ledger.snapshot();
        if !snapshot.is_balanced() {
            warn!(live = snapshot.live_tensors(), "benchmark left tensors alive");
        }
        Ok(BenchmarkReport {
            started_at,
            image_size: self.image_size,
            profiles,
            ledger: snapshot,
        })
    }

    fn synthetic_inputs(&self, ledger: &MemoryLedger) -> Result<SyntheticInputs> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let side = self.image_size;
        let image_shape = [1, side, side, 3];

        let mut normal = |len: usize| -> Vec<f32> {
            (0..len).map(|_| rng.sample::<f32, _>(StandardNormal)).collect()
        };
        let image_values = normal(side * side * 3);
        let embedding_values = normal(EMBEDDING_SHAPE.iter().product());

        let image = ledger
            .from_shape_vec(&image_shape, image_values)
            .map_err(|e| Error::stylization(Stage::Prepare, e))?;
        let embedding = ledger
            .from_shape_vec(&EMBEDDING_SHAPE, embedding_values)
            .map_err(|e| Error::stylization(Stage::Prepare, e))?;
        Ok(SyntheticInputs { image, embedding })
    }

    async fn profile_model(
        &self,
        cache: &ModelCache,
        ledger: &MemoryLedger,
        inputs: &SyntheticInputs,
        name: ModelName,
    ) -> Result<ModelProfile> {
        let load_start = Instant::now();
        let model = cache.get(name).await?;
        let load_ms = millis(load_start);

        let before = ledger.snapshot();
        let warmup_start = Instant::now();
        let output = predict(&model, ledger, inputs)?;
        let warmup_ms = millis(warmup_start);
        let after = ledger.snapshot();
        let output_shape = output.shape().to_vec();
        let process_memory_bytes = process_memory();
        output.release();

        let mut timings = Vec::with_capacity(self.runs);
        for _ in 0..self.runs {
            yield_now().await;
            let start = Instant::now();
            let out = predict(&model, ledger, inputs)?;
            timings.push(millis(start));
            out.release();
        }

        let (mean_ms, min_ms, max_ms) = summarize(&timings);
        Ok(ModelProfile {
            model: name,
            load_ms,
            warmup_ms,
            new_tensors: after.live_tensors().saturating_sub(before.live_tensors()),
            new_bytes: after.live_bytes.saturating_sub(before.live_bytes),
            peak_bytes: after.peak_bytes,
            output_shape,
            process_memory_bytes,
            runs: timings.len(),
            mean_ms,
            min_ms,
            max_ms,
        })
    }
}

fn predict(model: &ModelHandle, ledger: &MemoryLedger, inputs: &SyntheticInputs) -> Result<Tensor> {
    let stage = match model.name().kind() {
        ModelKind::Style => Stage::EncodeStyle,
        ModelKind::Transform => Stage::Decode,
    };
    ledger
        .tidy(stage, |ledger| match model.name().kind() {
            ModelKind::Style => model.predict(&[&inputs.image], ledger),
            ModelKind::Transform => model.predict(&[&inputs.image, &inputs.embedding], ledger),
        })
        .map_err(|e| Error::stylization(stage, e))
}

fn millis(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn summarize(timings: &[f64]) -> (f64, f64, f64) {
    if timings.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mean = timings.iter().sum::<f64>() / timings.len() as f64;
    let min = timings.iter().copied().fold(f64::INFINITY, f64::min);
    let max = timings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (mean, min, max)
}

fn process_memory() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|p| p.memory())
}
