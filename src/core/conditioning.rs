//! Signal conditioning for extracted segments.
//!
//! Electrodermal segments are low-pass filtered and then normalized. The
//! filter is a digital Butterworth design (bilinear transform with
//! pre-warping) run causally from a zero state. Normalizers operate on the
//! whole segment.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::f64::consts::{FRAC_PI_2, SQRT_2};

/// A transformation applied to a flattened segment.
pub trait SignalConditioner {
    fn condition(&self, values: &[f64]) -> Vec<f64>;
}

/// Conditioning setup errors.
#[derive(Debug, PartialEq)]
pub enum ConditioningError {
    UnsupportedOrder(usize),
    /// Cutoff must lie strictly between 0 and the Nyquist frequency
    InvalidCutoff { cutoff_hz: f64, sample_rate_hz: f64 },
}

impl std::fmt::Display for ConditioningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditioningError::UnsupportedOrder(order) => {
                write!(f, "unsupported filter order {order} (expected 1 or 2)")
            }
            ConditioningError::InvalidCutoff {
                cutoff_hz,
                sample_rate_hz,
            } => write!(
                f,
                "cutoff {cutoff_hz} Hz is not below Nyquist for {sample_rate_hz} Hz"
            ),
        }
    }
}

impl std::error::Error for ConditioningError {}

/// Low-pass Butterworth filter of order 1 or 2.
#[derive(Debug, Clone, PartialEq)]
pub struct ButterworthLowPass {
    b: [f64; 3],
    a: [f64; 3],
}

impl ButterworthLowPass {
    pub fn new(
        order: usize,
        cutoff_hz: f64,
        sample_rate_hz: f64,
    ) -> Result<Self, ConditioningError> {
        let nyquist = 0.5 * sample_rate_hz;
        let wn = cutoff_hz / nyquist;
        if !(wn > 0.0 && wn < 1.0) {
            return Err(ConditioningError::InvalidCutoff {
                cutoff_hz,
                sample_rate_hz,
            });
        }

        let k = (FRAC_PI_2 * wn).tan();
        let (b, a) = match order {
            1 => {
                let norm = 1.0 / (1.0 + k);
                ([k * norm, k * norm, 0.0], [1.0, (k - 1.0) * norm, 0.0])
            }
            2 => {
                let k2 = k * k;
                let norm = 1.0 / (1.0 + SQRT_2 * k + k2);
                let b0 = k2 * norm;
                (
                    [b0, 2.0 * b0, b0],
                    [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - SQRT_2 * k + k2) * norm],
                )
            }
            other => return Err(ConditioningError::UnsupportedOrder(other)),
        };

        Ok(Self { b, a })
    }

    /// Numerator coefficients.
    pub fn b(&self) -> &[f64; 3] {
        &self.b
    }

    /// Denominator coefficients, `a[0] == 1`.
    pub fn a(&self) -> &[f64; 3] {
        &self.a
    }
}

impl SignalConditioner for ButterworthLowPass {
    fn condition(&self, values: &[f64]) -> Vec<f64> {
        // transposed direct form II
        let (mut z1, mut z2) = (0.0, 0.0);
        values
            .iter()
            .map(|&x| {
                let y = self.b[0] * x + z1;
                z1 = self.b[1] * x - self.a[1] * y + z2;
                z2 = self.b[2] * x - self.a[2] * y;
                y
            })
            .collect()
    }
}

/// Per-segment normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalizer {
    /// Scale into `[0, 1]`
    #[default]
    MinMax,
    /// Zero mean, unit population standard deviation
    ZScore,
}

impl Normalizer {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "min-max" | "minmax" => Some(Self::MinMax),
            "z-score" | "zscore" => Some(Self::ZScore),
            _ => None,
        }
    }
}

impl SignalConditioner for Normalizer {
    fn condition(&self, values: &[f64]) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }

        match self {
            Normalizer::MinMax => {
                let min = Statistics::min(values);
                let range = Statistics::max(values) - min;
                if range == 0.0 || !range.is_finite() {
                    return vec![0.0; values.len()];
                }
                values.iter().map(|v| (v - min) / range).collect()
            }
            Normalizer::ZScore => {
                let mean = values.mean();
                let std = values.population_std_dev();
                if std == 0.0 || !std.is_finite() {
                    return vec![0.0; values.len()];
                }
                values.iter().map(|v| (v - mean) / std).collect()
            }
        }
    }
}

/// Settings for the electrodermal conditioning pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningConfig {
    pub filter_order: usize,
    pub cutoff_hz: f64,
    /// Rate the filter is designed for
    pub sample_rate_hz: f64,
    pub normalizer: Normalizer,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            filter_order: 2,
            cutoff_hz: 5.0 / 4.0,
            sample_rate_hz: 4.0,
            normalizer: Normalizer::MinMax,
        }
    }
}

/// Filter followed by normalizer.
#[derive(Debug, Clone)]
pub struct ConditioningPipeline {
    filter: ButterworthLowPass,
    normalizer: Normalizer,
}

impl ConditioningPipeline {
    pub fn new(config: &ConditioningConfig) -> Result<Self, ConditioningError> {
        Ok(Self {
            filter: ButterworthLowPass::new(
                config.filter_order,
                config.cutoff_hz,
                config.sample_rate_hz,
            )?,
            normalizer: config.normalizer,
        })
    }
}

impl SignalConditioner for ConditioningPipeline {
    fn condition(&self, values: &[f64]) -> Vec<f64> {
        let filtered = self.filter.condition(values);
        self.normalizer.condition(&filtered)
    }
}
