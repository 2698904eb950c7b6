use crate::error::Result;
use crate::sparse::SparseVector;

use super::params::Parameters;

/// Epochs without a dev-metric improvement tolerated before training stops.
const MAX_PATIENCE: usize = 3;

/**
 * Patience-based early stopping shared by every optimizer.
 *
 * Each epoch hands over the validation metric and a materialized parameter
 *  snapshot; a strictly better metric becomes the new best, anything else
 *  burns patience. Exhausted patience is a normal termination, returning the
 *  best-observed parameters rather than the latest.
 */
struct EarlyStopping {
    best_metric: f64,
    best: Option<SparseVector>,
    patience: usize,
}

impl EarlyStopping {
    fn new() -> Self {
        Self {
            best_metric: f64::NEG_INFINITY,
            best: None,
            patience: 0,
        }
    }

    /// Returns true when training should stop.
    fn observe(&mut self, metric: f64, snapshot: SparseVector) -> bool {
        if metric > self.best_metric {
            self.best_metric = metric;
            self.best = Some(snapshot);
            self.patience = 0;
            false
        } else {
            self.patience += 1;
            if self.patience > MAX_PATIENCE {
                log::info!(
                    "early stopping: no improvement over {:.4} for {} epochs",
                    self.best_metric,
                    self.patience
                );
            }
            self.patience > MAX_PATIENCE
        }
    }

    fn into_best(self, fallback: Parameters) -> SparseVector {
        match self.best {
            Some(best) => best,
            None => fallback.into_vector(),
        }
    }
}

/// Stochastic gradient descent: `w -= g(i)`, one example at a time in strict
/// index order (the online update semantics depend on that order).
pub fn sgd<G, F>(
    training_size: usize,
    epochs: usize,
    gradient: G,
    mut parameters: Parameters,
    mut observer: F,
) -> Result<SparseVector>
where
    G: Fn(&Parameters, usize) -> Result<SparseVector>,
    F: FnMut(usize, &SparseVector) -> f64,
{
    let mut stopping = EarlyStopping::new();
    for epoch in 0..epochs {
        log::info!("epoch {}/{}", epoch + 1, epochs);
        for i in 0..training_size {
            let g = gradient(&parameters, i)?;
            parameters.step(1.0, &g);
        }
        let snapshot = parameters.snapshot();
        let metric = observer(epoch, &snapshot);
        log::info!("epoch {} metric: {:.4}", epoch + 1, metric);
        if stopping.observe(metric, snapshot) {
            break;
        }
    }
    Ok(stopping.into_best(parameters))
}

/// Sub-gradient SVM: `w -= α·g(i)` followed by the L2 shrinkage
/// `w *= (1 − α·λ)`, applied lazily through the parameter scale. With
/// `l2 = 0` the trajectory is exactly the unshrunk sub-gradient update.
pub fn svm<G, F>(
    training_size: usize,
    epochs: usize,
    gradient: G,
    mut parameters: Parameters,
    mut observer: F,
    step_size: f64,
    l2: f64,
) -> Result<SparseVector>
where
    G: Fn(&Parameters, usize) -> Result<SparseVector>,
    F: FnMut(usize, &SparseVector) -> f64,
{
    log::info!("step size: {}, lambda: {}", step_size, l2);
    let shrink = 1.0 - step_size * l2;
    let mut stopping = EarlyStopping::new();
    for epoch in 0..epochs {
        log::info!("epoch {}/{}", epoch + 1, epochs);
        for i in 0..training_size {
            let g = gradient(&parameters, i)?;
            parameters.step(step_size, &g);
            if l2 != 0.0 {
                parameters.shrink(shrink);
            }
        }
        let snapshot = parameters.snapshot();
        let metric = observer(epoch, &snapshot);
        log::info!("epoch {} metric: {:.4}", epoch + 1, metric);
        if stopping.observe(metric, snapshot) {
            break;
        }
    }
    Ok(stopping.into_best(parameters))
}

/// Adagrad: per-feature step sizes from the running sum of squared
/// gradients. `divide_or_zero` keeps keys with no history at 0 instead of
/// propagating NaN into the weights.
pub fn adagrad<G, F>(
    training_size: usize,
    epochs: usize,
    gradient: G,
    mut parameters: Parameters,
    mut observer: F,
    step_size: f64,
) -> Result<SparseVector>
where
    G: Fn(&Parameters, usize) -> Result<SparseVector>,
    F: FnMut(usize, &SparseVector) -> f64,
{
    let mut history = SparseVector::new();
    let mut stopping = EarlyStopping::new();
    for epoch in 0..epochs {
        log::info!("epoch {}/{}", epoch + 1, epochs);
        for i in 0..training_size {
            let g = gradient(&parameters, i)?;
            history.scale_add(1.0, &g.squared());
            /* Only the slice of history for the touched features matters. */
            let slice = history.restrict_to(&g);
            parameters.step(step_size, &g.divide_or_zero(&slice.sqrt()));
        }
        let snapshot = parameters.snapshot();
        let metric = observer(epoch, &snapshot);
        log::info!("epoch {} metric: {:.4}", epoch + 1, metric);
        if stopping.observe(metric, snapshot) {
            break;
        }
    }
    Ok(stopping.into_best(parameters))
}
