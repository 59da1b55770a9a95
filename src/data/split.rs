use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::aggregate::HourlyAggregate;
use crate::data::window::{build_windows, Sample};
use crate::error::{ForecastError, Result};

/// What training does when the split leaves fewer samples than the sequence length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortDataPolicy {
    /// Stop with [`ForecastError::InsufficientData`]
    #[default]
    Fail,
    /// Retry with shorter sequence lengths and use the first one that fits
    Shrink,
}

impl FromStr for ShortDataPolicy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ShortDataPolicy::Fail),
            "shrink" => Ok(ShortDataPolicy::Shrink),
            other => Err(ForecastError::Config(format!(
                "unknown short data policy '{}', expected 'fail' or 'shrink'",
                other
            ))),
        }
    }
}

/// Windows split into training and held-out sets
#[derive(Debug, Clone)]
pub struct PreparedSamples {
    /// Sequence length the windows were actually built with
    pub sequence_length: usize,
    pub train: Vec<Sample>,
    pub test: Vec<Sample>,
}

/// Shuffle with a fixed seed and hold out `ceil(n * test_fraction)` samples
pub fn train_test_split(samples: Vec<Sample>, test_fraction: f64, seed: u64) -> Result<(Vec<Sample>, Vec<Sample>)> {
    let n = samples.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    let n_train = n.saturating_sub(n_test);

    if n_test == 0 || n_train == 0 {
        return Err(ForecastError::InsufficientData {
            context: "train/test split",
            required: 2,
            available: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut slots: Vec<Option<Sample>> = samples.into_iter().map(Some).collect();
    let mut take = |i: &usize| slots[*i].take();
    let test: Vec<Sample> = indices[..n_test].iter().filter_map(&mut take).collect();
    let train: Vec<Sample> = indices[n_test..].iter().filter_map(&mut take).collect();

    Ok((train, test))
}

/// Build and split windows, requiring at least `sequence_length` training samples
///
/// With [`ShortDataPolicy::Shrink`] shorter lengths are tried in decreasing
/// order; the configured length is never modified, the effective one is
/// reported in [`PreparedSamples::sequence_length`].
pub fn prepare_samples(
    series: &[HourlyAggregate],
    sequence_length: usize,
    policy: ShortDataPolicy,
    test_fraction: f64,
    seed: u64,
) -> Result<PreparedSamples> {
    let attempt = |length: usize| -> Result<PreparedSamples> {
        let samples = build_windows(series, length);
        let available = samples.len();
        let (train, test) = train_test_split(samples, test_fraction, seed).map_err(|_| {
            ForecastError::InsufficientData {
                context: "windowed samples",
                required: 2,
                available,
            }
        })?;
        if train.len() < length {
            return Err(ForecastError::InsufficientData {
                context: "training samples",
                required: length,
                available: train.len(),
            });
        }
        Ok(PreparedSamples {
            sequence_length: length,
            train,
            test,
        })
    };

    let first_error = match attempt(sequence_length) {
        Ok(prepared) => return Ok(prepared),
        Err(err) => err,
    };

    if policy == ShortDataPolicy::Fail {
        return Err(first_error);
    }

    for length in (1..sequence_length).rev() {
        if let Ok(prepared) = attempt(length) {
            tracing::warn!(
                configured = sequence_length,
                effective = length,
                hours = series.len(),
                "not enough data for the configured sequence length, using a shorter one"
            );
            return Ok(prepared);
        }
    }

    Err(first_error)
}
