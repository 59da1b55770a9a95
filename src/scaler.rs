//! Min-max scaling of the (humidity, light) features.
//!
//! Parameters are fit on the training split, stored as JSON next to the
//! model file and reloaded by the predictor, so both entry points apply the
//! same affine map.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::models::forecast_network::FEATURE_COUNT;
use crate::persistence::PersistenceError;

/// Per-column bounds of the feature matrix
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScalerParams {
    pub min_humidity: f64,
    pub max_humidity: f64,
    pub min_light: f64,
    pub max_light: f64,
}

impl ScalerParams {
    /// Fit bounds on a (rows, 2) matrix of humidity and light values
    pub fn fit(features: ArrayView2<'_, f64>) -> Result<Self> {
        if features.ncols() != FEATURE_COUNT {
            return Err(ForecastError::ShapeMismatch {
                expected: format!("(rows, {})", FEATURE_COUNT),
                found: format!("{:?}", features.shape()),
            });
        }
        if features.nrows() == 0 {
            return Err(ForecastError::InsufficientData {
                context: "scaler fit",
                required: 1,
                available: 0,
            });
        }

        let bounds = |col: usize| {
            features
                .column(col)
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        };
        let (min_humidity, max_humidity) = bounds(0);
        let (min_light, max_light) = bounds(1);

        Ok(ScalerParams {
            min_humidity,
            max_humidity,
            min_light,
            max_light,
        })
    }

    /// Fit bounds on every timestep of a (windows, timesteps, 2) tensor
    pub fn fit_windows(windows: &Array3<f64>) -> Result<Self> {
        let (n, steps, features) = windows.dim();
        let flat = windows
            .view()
            .into_shape((n * steps, features))
            .map_err(|e| ForecastError::ShapeMismatch {
                expected: "contiguous window tensor".to_string(),
                found: e.to_string(),
            })?;
        Self::fit(flat)
    }

    /// Maps `value` of column `col` into [0, 1]; a constant column maps to 0.0
    pub fn scale_value(&self, col: usize, value: f64) -> f64 {
        let (lo, hi) = if col == 0 {
            (self.min_humidity, self.max_humidity)
        } else {
            (self.min_light, self.max_light)
        };
        let range = hi - lo;
        if range == 0.0 {
            0.0
        } else {
            (value - lo) / range
        }
    }

    /// Scale a (rows, 2) matrix
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features.clone();
        for (col, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| self.scale_value(col, v));
        }
        scaled
    }

    /// Scale the feature axis of a (windows, timesteps, 2) tensor
    pub fn transform_windows(&self, windows: &Array3<f64>) -> Array3<f64> {
        let mut scaled = windows.clone();
        for (col, mut plane) in scaled.axis_iter_mut(Axis(2)).enumerate() {
            plane.mapv_inplace(|v| self.scale_value(col, v));
        }
        scaled
    }

    /// Sidecar location for a model file: `model.bin` → `model.scaler.json`
    pub fn sidecar_path(model_path: &Path) -> PathBuf {
        let stem = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        model_path.with_file_name(format!("{}.scaler.json", stem))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, PersistenceError> {
        let contents = fs::read_to_string(path)?;
        let params: ScalerParams = serde_json::from_str(&contents)?;
        if !(params.min_humidity <= params.max_humidity && params.min_light <= params.max_light) {
            return Err(PersistenceError::Incompatible(
                "scaler bounds are inverted or NaN".to_string(),
            ));
        }
        Ok(params)
    }
}
