//! Hashed-feature linear model shared by the pipeline components.
//!
//! String features are hashed into [`BUCKETS`] rows of a weight matrix; an
//! instance's logits are the sum of its feature rows plus a bias. Training
//! is AdamW on cross-entropy, and a running mean of the parameters is kept
//! so callers can predict or save with averaged weights.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use rand::Rng;

use crate::error::NlpError;

/// Rows in the weight matrix.
pub const BUCKETS: usize = 1 << 16;

const LEARN_RATE: f64 = 0.02;
const WEIGHTS: &str = "weights";
const BIAS: &str = "bias";

/// Weight row for a feature string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn bucket(feature: &str) -> u32 {
    let hash = blake3::hash(feature.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(head) % BUCKETS as u64) as u32
}

/// Bucket ids for a list of feature strings.
#[must_use]
pub fn buckets<S: AsRef<str>>(features: &[S]) -> Vec<u32> {
    features.iter().map(|f| bucket(f.as_ref())).collect()
}

pub struct LinearModel {
    device: Device,
    classes: usize,
    weights: Var,
    bias: Var,
    optimizer: Option<AdamW>,
    avg_weights: Tensor,
    avg_bias: Tensor,
    steps: u64,
}

impl fmt::Debug for LinearModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearModel")
            .field("classes", &self.classes)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl LinearModel {
    /// A zero-initialised model over `classes` outputs.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the parameters cannot be allocated.
    pub fn new(classes: usize) -> Result<Self, NlpError> {
        let device = Device::Cpu;
        let weights = Tensor::zeros((BUCKETS, classes), DType::F32, &device)?;
        let bias = Tensor::zeros(classes, DType::F32, &device)?;
        Self::from_tensors(weights, bias)
    }

    fn from_tensors(weights: Tensor, bias: Tensor) -> Result<Self, NlpError> {
        let device = weights.device().clone();
        let classes = bias.dims1()?;
        Ok(Self {
            avg_weights: weights.copy()?,
            avg_bias: bias.copy()?,
            weights: Var::from_tensor(&weights)?,
            bias: Var::from_tensor(&bias)?,
            device,
            classes,
            optimizer: None,
            steps: 0,
        })
    }

    #[must_use]
    pub const fn classes(&self) -> usize {
        self.classes
    }

    /// Append `extra` zero-weight outputs, keeping learned weights.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the parameters cannot be resized.
    pub fn grow(&mut self, extra: usize) -> Result<(), NlpError> {
        if extra == 0 {
            return Ok(());
        }
        if self.classes == 0 {
            *self = Self::new(extra)?;
            return Ok(());
        }
        let pad_w = Tensor::zeros((BUCKETS, extra), DType::F32, &self.device)?;
        let pad_b = Tensor::zeros(extra, DType::F32, &self.device)?;
        let weights = Tensor::cat(&[self.weights.as_tensor(), &pad_w], 1)?;
        let bias = Tensor::cat(&[self.bias.as_tensor(), &pad_b], 0)?;
        *self = Self::from_tensors(weights, bias)?;
        Ok(())
    }

    /// Zero all parameters and forget optimizer state.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the parameters cannot be allocated.
    pub fn reset(&mut self) -> Result<(), NlpError> {
        *self = Self::new(self.classes)?;
        Ok(())
    }

    /// Logits of shape `(instances, classes)`.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on tensor failures.
    pub fn logits(&self, instances: &[Vec<u32>]) -> Result<Tensor, NlpError> {
        self.forward(instances, None)
    }

    /// Row-wise softmax of [`Self::logits`].
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on tensor failures.
    pub fn probabilities(&self, instances: &[Vec<u32>]) -> Result<Vec<Vec<f32>>, NlpError> {
        if instances.is_empty() || self.classes == 0 {
            return Ok(vec![Vec::new(); instances.len()]);
        }
        let logits = self.logits(instances)?;
        Ok(candle_nn::ops::softmax_last_dim(&logits)?.to_vec2::<f32>()?)
    }

    /// One optimizer step on `instances` with gold class indices `targets`.
    ///
    /// Each feature row is dropped with probability `drop`; the remaining
    /// rows are scaled by `1 / (1 - drop)`. Returns the summed cross-entropy.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on tensor or optimizer failures.
    pub fn train_step<R: Rng + ?Sized>(
        &mut self,
        instances: &[Vec<u32>],
        targets: &[u32],
        drop: f64,
        rng: &mut R,
    ) -> Result<f64, NlpError> {
        if instances.is_empty() || self.classes == 0 {
            return Ok(0.0);
        }

        let rows: usize = instances.iter().map(Vec::len).sum();
        let mask = (drop > 0.0)
            .then(|| dropout_mask(rows, drop, rng, &self.device))
            .transpose()?;
        let logits = self.forward(instances, mask.as_ref())?;
        let targets = Tensor::new(targets, &self.device)?;
        let loss = candle_nn::loss::cross_entropy(&logits, &targets)?;

        if self.optimizer.is_none() {
            let params = ParamsAdamW {
                lr: LEARN_RATE,
                weight_decay: 0.0,
                ..ParamsAdamW::default()
            };
            self.optimizer = Some(AdamW::new(
                vec![self.weights.clone(), self.bias.clone()],
                params,
            )?);
        }
        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.backward_step(&loss)?;
        }
        self.accumulate()?;

        #[allow(clippy::cast_precision_loss)]
        let n = instances.len() as f64;
        Ok(f64::from(loss.to_scalar::<f32>()?) * n)
    }

    /// Fold the current parameters into the running mean.
    fn accumulate(&mut self) -> Result<(), NlpError> {
        self.steps += 1;
        #[allow(clippy::cast_precision_loss)]
        let t = self.steps as f64;
        let keep = (t - 1.0) / t;
        // Copies are untracked, so the running mean holds no autograd graph.
        let weights = self.weights.as_tensor().copy()?;
        let bias = self.bias.as_tensor().copy()?;
        self.avg_weights = self
            .avg_weights
            .affine(keep, 0.0)?
            .add(&weights.affine(1.0 / t, 0.0)?)?;
        self.avg_bias = self
            .avg_bias
            .affine(keep, 0.0)?
            .add(&bias.affine(1.0 / t, 0.0)?)?;
        Ok(())
    }

    /// A copy whose parameters are the mean over all training steps, or the
    /// current parameters when none were taken.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the copy fails.
    pub fn averaged(&self) -> Result<Self, NlpError> {
        if self.steps == 0 {
            return self.snapshot();
        }
        Self::from_tensors(self.avg_weights.copy()?, self.avg_bias.copy()?)
    }

    /// A deep copy of the current parameters without optimizer state.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the copy fails.
    pub fn snapshot(&self) -> Result<Self, NlpError> {
        Self::from_tensors(self.weights.as_tensor().copy()?, self.bias.as_tensor().copy()?)
    }

    /// Write the parameters as safetensors.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), NlpError> {
        let tensors = HashMap::from([
            (WEIGHTS.to_string(), self.weights.as_tensor().clone()),
            (BIAS.to_string(), self.bias.as_tensor().clone()),
        ]);
        candle_core::safetensors::save(&tensors, path)?;
        Ok(())
    }

    /// Read parameters written by [`Self::save`], checking they cover
    /// `classes` outputs.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] for unreadable files and
    /// [`NlpError::Weights`] for missing or mis-shaped tensors.
    pub fn load(path: &Path, classes: usize) -> Result<Self, NlpError> {
        let mut tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
        let invalid = |message: String| NlpError::Weights {
            path: path.display().to_string(),
            message,
        };
        let weights = tensors
            .remove(WEIGHTS)
            .ok_or_else(|| invalid(format!("missing '{WEIGHTS}'")))?;
        let bias = tensors
            .remove(BIAS)
            .ok_or_else(|| invalid(format!("missing '{BIAS}'")))?;
        if weights.dims() != [BUCKETS, classes] || bias.dims() != [classes] {
            return Err(invalid(format!(
                "expected {BUCKETS}x{classes} weights, found {:?} and bias {:?}",
                weights.dims(),
                bias.dims()
            )));
        }
        Self::from_tensors(weights, bias)
    }

    fn forward(&self, instances: &[Vec<u32>], mask: Option<&Tensor>) -> Result<Tensor, NlpError> {
        let ids: Vec<u32> = instances.concat();
        let ids = Tensor::new(ids.as_slice(), &self.device)?;
        let mut rows = self.weights.as_tensor().index_select(&ids, 0)?;
        if let Some(mask) = mask {
            rows = rows.broadcast_mul(mask)?;
        }

        let mut pooled = Vec::with_capacity(instances.len());
        let mut offset = 0;
        for instance in instances {
            let summed = if instance.is_empty() {
                Tensor::zeros((1, self.classes), DType::F32, &self.device)?
            } else {
                rows.narrow(0, offset, instance.len())?.sum_keepdim(0)?
            };
            pooled.push(summed);
            offset += instance.len();
        }
        Ok(Tensor::cat(&pooled, 0)?.broadcast_add(self.bias.as_tensor())?)
    }
}

/// A `(rows, 1)` keep-mask scaled so its expectation is one.
fn dropout_mask<R: Rng + ?Sized>(
    rows: usize,
    drop: f64,
    rng: &mut R,
    device: &Device,
) -> Result<Tensor, NlpError> {
    let drop = drop.clamp(0.0, 0.99);
    #[allow(clippy::cast_possible_truncation)]
    let scale = (1.0 / (1.0 - drop)) as f32;
    let mask: Vec<f32> = (0..rows)
        .map(|_| if rng.gen_bool(drop) { 0.0 } else { scale })
        .collect();
    Ok(Tensor::from_vec(mask, (rows, 1), device)?)
}
