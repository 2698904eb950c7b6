use crate::dataset::DataPoint;
use crate::decoder::decode;
use crate::error::Result;
use crate::features::{Extractor, TemplateSet, OUTSIDE};
use crate::gazetteer::Gazetteer;
use crate::sparse::SparseVector;

use super::params::Parameters;
use super::{CostIndexing, Method};

/// Per-mismatch margin cost of the SVM losses.
const HAMMING_COST: f64 = 10.0;
/// Raised cost for tagging a gold entity as "O" in the asymmetric variant.
const MISSED_ENTITY_COST: f64 = 30.0;

/**
 * Builds per-example loss gradients: decode under a method-dependent scoring
 *  function, then return features(predicted) − features(gold).
 *
 * The builder never mutates parameters; it reads them through the scoring
 *  closure handed to the decoder.
 */
pub struct GradientBuilder<'a> {
    data: &'a [DataPoint],
    templates: &'a TemplateSet,
    tagset: &'a [String],
    gazetteer: &'a Gazetteer,
    method: Method,
    cost_indexing: CostIndexing,
}

impl<'a> GradientBuilder<'a> {
    pub fn new(
        data: &'a [DataPoint],
        templates: &'a TemplateSet,
        tagset: &'a [String],
        gazetteer: &'a Gazetteer,
        method: Method,
        cost_indexing: CostIndexing,
    ) -> Self {
        Self {
            data,
            templates,
            tagset,
            gazetteer,
            method,
            cost_indexing,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gradient of the selected loss for training example `i`. Zero exactly
    /// when the (cost-augmented) prediction equals the gold path.
    pub fn gradient(&self, parameters: &Parameters, i: usize) -> Result<SparseVector> {
        let input = &self.data[i];
        let extractor = Extractor::new(input, self.gazetteer, self.templates);
        let gold = &input.gold_tags;

        let model = |cur: &str, prev: &str, pos: usize| {
            parameters.dot(&extractor.features(cur, prev, pos))
        };
        let predicted = match self.method {
            Method::StructuredPerceptron => decode(input.len(), self.tagset, model)?,
            Method::Svm => decode(input.len(), self.tagset, |cur, prev, pos| {
                model(cur, prev, pos) + hamming_cost(&gold[pos], cur)
            })?,
            Method::SvmModified => match self.cost_indexing {
                /* The look-back form charges the cost of the tag just
                committed: while scoring position pos, `prev` is the tag at
                pos-1, so it is compared against the gold at pos-1. */
                CostIndexing::PrevPosition => decode(input.len(), self.tagset, |cur, prev, pos| {
                    model(cur, prev, pos) + asymmetric_cost(&gold[pos - 1], prev)
                })?,
                CostIndexing::CurrentPosition => {
                    decode(input.len(), self.tagset, |cur, prev, pos| {
                        model(cur, prev, pos) + asymmetric_cost(&gold[pos], cur)
                    })?
                }
            },
        };

        let mut gradient = extractor.path_features(&predicted);
        gradient.scale_add(-1.0, &extractor.path_features(gold));
        Ok(gradient)
    }
}

fn hamming_cost(gold: &str, predicted: &str) -> f64 {
    if gold != predicted {
        HAMMING_COST
    } else {
        0.0
    }
}

/// Hamming cost with a higher charge for missing a gold entity entirely.
fn asymmetric_cost(gold: &str, predicted: &str) -> f64 {
    if gold != OUTSIDE && predicted == OUTSIDE {
        MISSED_ENTITY_COST
    } else {
        hamming_cost(gold, predicted)
    }
}
