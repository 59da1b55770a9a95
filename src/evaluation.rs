use std::fmt;

use ndarray::{Array1, Array3};

use crate::error::Result;
use crate::loss::LossFunction;
use crate::metrics::{mean_squared_error, r2_score};
use crate::optimizers::Optimizer;
use crate::training::ForecastTrainer;

/// Held-out metrics of a trained network
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Loss as configured on the trainer (MSE by default)
    pub loss: f64,
    pub mae: f64,
    pub r2: f64,
    pub mse: f64,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl EvaluationReport {
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

/// Evaluate on the test split without touching the network
pub fn evaluate_model<L: LossFunction, O: Optimizer>(
    trainer: &ForecastTrainer<L, O>,
    inputs: &Array3<f64>,
    targets: &Array1<f64>,
) -> Result<EvaluationReport> {
    let evaluation = trainer.evaluate(inputs, targets);
    let predicted = trainer.predict(inputs)?.to_vec();
    let actual = targets.to_vec();

    let report = EvaluationReport {
        loss: evaluation.loss,
        mae: evaluation.mae,
        r2: r2_score(&actual, &predicted),
        mse: mean_squared_error(&actual, &predicted),
        actual,
        predicted,
    };

    tracing::info!(
        samples = report.len(),
        loss = report.loss,
        mae = report.mae,
        r2 = report.r2,
        "evaluated model on the test split"
    );
    Ok(report)
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    let joined: Vec<String> = values.iter().map(|v| format!("{:.4}", v)).collect();
    writeln!(f, "[{}]", joined.join(", "))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Loss: {:.4}", self.loss)?;
        writeln!(f, "Mean Absolute Error (MAE): {:.4}", self.mae)?;
        writeln!(f, "R^2 Score: {:.4}", self.r2)?;
        writeln!(f, "Mean Squared Error (MSE): {:.4}", self.mse)?;
        writeln!(f)?;
        writeln!(f, "Valores Reales:")?;
        write_values(f, &self.actual)?;
        writeln!(f)?;
        writeln!(f, "Predicciones:")?;
        write_values(f, &self.predicted)
    }
}
