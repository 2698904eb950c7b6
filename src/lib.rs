//! Linear structured prediction for sequence tagging.
//!
//! Trains a first-order Markov scorer (structured perceptron or
//! margin-rescaled SVM, with SGD / sub-gradient / Adagrad updates and
//! patience-based early stopping) and decodes with Viterbi under a pluggable
//! per-position scoring function.

pub mod dataset;
pub mod decoder;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod gazetteer;
pub mod sparse;
pub mod tagger;
pub mod train;

pub use self::dataset::DataPoint;
pub use self::decoder::{decode, START, STOP};
pub use self::error::{Error, Result};
pub use self::features::TemplateSet;
pub use self::gazetteer::Gazetteer;
pub use self::sparse::SparseVector;
pub use self::tagger::Tagger;
pub use self::train::{train, CostIndexing, Method, OptimizerKind, TrainConfig};
