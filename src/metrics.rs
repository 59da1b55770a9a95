//! Regression metrics computed from raw predictions.
//!
//! All functions return `NaN` when given no samples. Slices of different
//! length are compared over their common prefix.

/// Mean of squared differences
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean(actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)))
}

/// Coefficient of determination, R² = 1 - SS_res / SS_tot
///
/// When the actual values are constant (SS_tot = 0) the score is 1.0 for a
/// perfect fit and 0.0 otherwise, matching scikit-learn's `r2_score`.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }

    let actual = &actual[..n];
    let mean_actual = actual.iter().sum::<f64>() / n as f64;
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        assert!((mean_squared_error(&actual, &predicted) - 0.375).abs() < 1e-12);
        assert!(mean_squared_error(&[], &[]).is_nan());
    }

    #[test]
    fn test_r2_score() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        assert!((r2_score(&actual, &predicted) - 0.948_608_137_044_967_9).abs() < 1e-12);
        assert_eq!(r2_score(&actual, &actual), 1.0);
    }

    #[test]
    fn test_r2_constant_targets() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }

    #[test]
    fn test_empty_inputs_are_nan() {
        assert!(mean_squared_error(&[], &[]).is_nan());
        assert!(r2_score(&[], &[]).is_nan());
    }
}
