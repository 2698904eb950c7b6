use crate::sparse::SparseVector;

/**
 * Model weights owned by the running optimizer.
 *
 * L2 shrinkage multiplies every stored weight by the same factor, so the
 *  factor is accumulated in `scale` and folded into reads instead of
 *  rewriting the whole vector on every example. Scoring closures only read
 *  through `dot`, which applies the scale transparently.
 */
#[derive(Debug, Clone)]
pub struct Parameters {
    weights: SparseVector,
    scale: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self {
            weights: SparseVector::new(),
            scale: 1.0,
        }
    }

    pub fn from_vector(weights: SparseVector) -> Self {
        Self {
            weights,
            scale: 1.0,
        }
    }

    /// `w · features`, scale folded in.
    pub fn dot(&self, features: &SparseVector) -> f64 {
        self.scale * self.weights.dot(features)
    }

    /// `w -= step * gradient`.
    pub fn step(&mut self, step: f64, gradient: &SparseVector) {
        self.weights.scale_add(-step / self.scale, gradient);
    }

    /// `w *= factor`, with `0 <= factor <= 1`. Constant time except for the
    /// occasional rebase that keeps the stored magnitudes representable.
    pub fn shrink(&mut self, factor: f64) {
        debug_assert!((0.0..=1.0).contains(&factor));
        if factor == 0.0 {
            self.weights = SparseVector::new();
            self.scale = 1.0;
            return;
        }
        self.scale *= factor;
        if self.scale < 1e-9 {
            self.rebase();
        }
    }

    /// Materialized copy with the scale folded in. This is the once-per-epoch
    /// full-vector duplication the early-stopping snapshot pays for.
    pub fn snapshot(&self) -> SparseVector {
        if self.scale == 1.0 {
            self.weights.clone()
        } else {
            self.weights
                .iter()
                .map(|(k, v)| (k.to_string(), self.scale * v))
                .collect()
        }
    }

    pub fn into_vector(mut self) -> SparseVector {
        self.rebase();
        self.weights
    }

    fn rebase(&mut self) {
        if self.scale != 1.0 {
            self.weights = self.snapshot();
            self.scale = 1.0;
        }
    }
}
