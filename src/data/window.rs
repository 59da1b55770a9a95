use chrono::NaiveDateTime;
use ndarray::{Array1, Array2, Array3};

use crate::data::aggregate::HourlyAggregate;
use crate::error::{ForecastError, Result};
use crate::models::forecast_network::FEATURE_COUNT;

/// `sequence_length` consecutive (humidity, light) pairs from the hourly series
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Source hour of every timestep, oldest first
    pub hours: Vec<NaiveDateTime>,
    /// (sequence_length, 2) matrix of humidity and light
    pub features: Array2<f64>,
}

impl Window {
    fn from_slice(slice: &[HourlyAggregate]) -> Self {
        let features = Array2::from_shape_fn((slice.len(), FEATURE_COUNT), |(t, f)| {
            if f == 0 {
                slice[t].humidity
            } else {
                slice[t].light
            }
        });
        Window {
            hours: slice.iter().map(|h| h.hour).collect(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn last_hour(&self) -> Option<NaiveDateTime> {
        self.hours.last().copied()
    }
}

/// A window paired with the temperature of the hour that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub window: Window,
    pub target: f64,
    pub target_hour: NaiveDateTime,
}

/// Slide a window of `sequence_length` over the series
///
/// Produces exactly `max(0, N - sequence_length)` samples; sample `i` covers
/// positions `i..i + sequence_length` and targets position `i + sequence_length`.
pub fn build_windows(series: &[HourlyAggregate], sequence_length: usize) -> Vec<Sample> {
    if series.len() <= sequence_length {
        return Vec::new();
    }

    series
        .windows(sequence_length + 1)
        .map(|slice| {
            let (inputs, next) = slice.split_at(sequence_length);
            Sample {
                window: Window::from_slice(inputs),
                target: next[0].temperature,
                target_hour: next[0].hour,
            }
        })
        .collect()
}

/// The most recent `sequence_length` hours as a single window
pub fn latest_window(series: &[HourlyAggregate], sequence_length: usize) -> Result<Window> {
    if sequence_length == 0 || series.len() < sequence_length {
        return Err(ForecastError::InsufficientData {
            context: "prediction window",
            required: sequence_length.max(1),
            available: series.len(),
        });
    }
    Ok(Window::from_slice(&series[series.len() - sequence_length..]))
}

/// Stack windows into a (windows, sequence_length, 2) tensor
pub fn stack_windows<'a, I>(windows: I) -> Result<Array3<f64>>
where
    I: IntoIterator<Item = &'a Window>,
{
    let windows: Vec<&Window> = windows.into_iter().collect();
    let steps = windows.first().map(|w| w.len()).unwrap_or(0);

    if let Some(odd) = windows.iter().find(|w| w.len() != steps) {
        return Err(ForecastError::ShapeMismatch {
            expected: format!("windows of {} timesteps", steps),
            found: odd.len().to_string(),
        });
    }

    Ok(Array3::from_shape_fn((windows.len(), steps, FEATURE_COUNT), |(i, t, f)| {
        windows[i].features[[t, f]]
    }))
}

/// Inputs and targets of a sample set as tensors
pub fn samples_to_tensors(samples: &[Sample]) -> Result<(Array3<f64>, Array1<f64>)> {
    let inputs = stack_windows(samples.iter().map(|s| &s.window))?;
    let targets = Array1::from_iter(samples.iter().map(|s| s.target));
    Ok((inputs, targets))
}
