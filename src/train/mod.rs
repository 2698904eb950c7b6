pub mod gradient;
pub mod optimizer;
pub mod params;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dataset::DataPoint;
use crate::error::{Error, Result};
use crate::features::TemplateSet;
use crate::gazetteer::Gazetteer;
use crate::sparse::SparseVector;

use self::gradient::GradientBuilder;
use self::params::Parameters;

/// Loss whose gradient drives the parameter updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    StructuredPerceptron,
    Svm,
    /// Margin-rescaled SVM with the raised cost for missed entities.
    SvmModified,
}

/// Per-step update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    Svm,
    Adagrad,
}

/// Which gold position the asymmetric SVM cost inspects.
///
/// `PrevPosition` charges the tag just committed (`prev` against the gold
/// one position back); `CurrentPosition` aligns the cost with the position
/// being scored, like the plain SVM loss does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostIndexing {
    PrevPosition,
    CurrentPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub method: Method,
    pub optimizer: OptimizerKind,
    pub step_size: f64,
    pub l2: f64,
    pub cost_indexing: CostIndexing,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            method: Method::StructuredPerceptron,
            optimizer: OptimizerKind::Sgd,
            step_size: 1.0,
            l2: 0.0,
            cost_indexing: CostIndexing::PrevPosition,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        match (self.method, self.optimizer) {
            (Method::StructuredPerceptron, OptimizerKind::Sgd)
            | (Method::StructuredPerceptron, OptimizerKind::Adagrad) => {}
            (Method::Svm, OptimizerKind::Svm) | (Method::SvmModified, OptimizerKind::Svm) => {
                if self.step_size * self.l2 >= 1.0 {
                    return Err(Error::Config(format!(
                        "step_size * l2 = {} leaves no weight after shrinkage (must be < 1)",
                        self.step_size * self.l2
                    )));
                }
            }
            (method, optimizer) => {
                return Err(Error::Config(format!(
                    "method {:?} cannot be trained with optimizer {:?}",
                    method, optimizer
                )));
            }
        }
        if self.step_size <= 0.0 {
            return Err(Error::Config("step_size must be positive".to_string()));
        }
        if self.l2 < 0.0 {
            return Err(Error::Config("l2 must be non-negative".to_string()));
        }
        Ok(())
    }
}

/**
 * Trains parameters on `data` and returns the best-observed weights.
 *
 * One epoch walks the examples in strict index order; after each epoch the
 *  observer is called with a materialized parameter snapshot and returns a
 *  validation metric (higher is better) that drives early stopping. The
 *  observer may persist per-epoch artifacts as a side effect; only its
 *  return value participates in training.
 */
pub fn train<F>(
    data: &[DataPoint],
    config: &TrainConfig,
    templates: &TemplateSet,
    tagset: &[String],
    gazetteer: &Gazetteer,
    observer: F,
) -> Result<SparseVector>
where
    F: FnMut(usize, &SparseVector) -> f64,
{
    config.validate()?;
    if tagset.is_empty() {
        return Err(Error::Config("empty tagset".to_string()));
    }
    if let Some(input) = data.iter().find(|input| input.is_empty()) {
        return Err(Error::Config(format!(
            "training data contains an empty sentence (padded length {})",
            input.len()
        )));
    }
    log::info!(
        "training: {} examples, method {:?}, optimizer {:?}, templates {:?}",
        data.len(),
        config.method,
        config.optimizer,
        templates
    );

    let builder = GradientBuilder::new(
        data,
        templates,
        tagset,
        gazetteer,
        config.method,
        config.cost_indexing,
    );
    let gradient = |parameters: &Parameters, i: usize| builder.gradient(parameters, i);
    let parameters = Parameters::new();

    match config.optimizer {
        OptimizerKind::Sgd => {
            optimizer::sgd(data.len(), config.epochs, gradient, parameters, observer)
        }
        OptimizerKind::Svm => optimizer::svm(
            data.len(),
            config.epochs,
            gradient,
            parameters,
            observer,
            config.step_size,
            config.l2,
        ),
        OptimizerKind::Adagrad => optimizer::adagrad(
            data.len(),
            config.epochs,
            gradient,
            parameters,
            observer,
            config.step_size,
        ),
    }
}
