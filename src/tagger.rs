use std::io::Write;

use crate::dataset::DataPoint;
use crate::decoder::decode;
use crate::error::Result;
use crate::evaluation::{Estimation, Evaluation};
use crate::features::{Extractor, TemplateSet};
use crate::gazetteer::Gazetteer;
use crate::sparse::SparseVector;

/**
 * Decodes with trained weights: plain Viterbi under the dot-product score,
 *  no cost augmentation. Borrows everything read-only, so one tagger can
 *  serve any number of sentences.
 */
pub struct Tagger<'a> {
    parameters: &'a SparseVector,
    templates: &'a TemplateSet,
    tagset: &'a [String],
    gazetteer: &'a Gazetteer,
}

impl<'a> Tagger<'a> {
    pub fn new(
        parameters: &'a SparseVector,
        templates: &'a TemplateSet,
        tagset: &'a [String],
        gazetteer: &'a Gazetteer,
    ) -> Self {
        Self {
            parameters,
            templates,
            tagset,
            gazetteer,
        }
    }

    /// The highest-scoring padded tag path for one sentence.
    pub fn tag(&self, input: &DataPoint) -> Result<Vec<String>> {
        let extractor = Extractor::new(input, self.gazetteer, self.templates);
        decode(input.len(), self.tagset, |cur, prev, pos| {
            self.parameters.dot(&extractor.features(cur, prev, pos))
        })
    }

    /// Tags every sentence and writes `word pos chunk gold predicted` rows,
    /// blank line between sentences (CoNLL evaluation layout).
    pub fn write_predictions(&self, w: &mut impl Write, data: &[DataPoint]) -> Result<()> {
        for input in data {
            let tags = self.tag(input)?;
            for i in 1..input.len() - 1 {
                writeln!(
                    w,
                    "{} {} {} {} {}",
                    input.tokens[i], input.pos[i], input.chunk[i], input.gold_tags[i], tags[i]
                )?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    /// Tags every sentence and accumulates label-level scores against the
    /// gold column.
    pub fn evaluate(&self, data: &[DataPoint]) -> Result<Estimation> {
        let mut evaluation = Evaluation::default();
        for input in data {
            let tags = self.tag(input)?;
            let n = input.len();
            evaluation.accumulate(&input.gold_tags[1..n - 1], &tags[1..n - 1]);
        }
        let estimation = evaluation.evaluate();
        log::info!("{}", evaluation);
        Ok(estimation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::OUTSIDE;

    fn point(words: &[(&str, &str)]) -> DataPoint {
        DataPoint::new(
            words.iter().map(|(w, _)| w.to_string()).collect(),
            words.iter().map(|_| "NNP".to_string()).collect(),
            words.iter().map(|_| "I-NP".to_string()).collect(),
            words.iter().map(|(_, t)| t.to_string()).collect(),
        )
    }

    #[test]
    fn tags_with_learned_word_weights() {
        let input = point(&[("France", "B-LOC"), ("backs", OUTSIDE)]);
        let tagset = vec!["B-LOC".to_string(), OUTSIDE.to_string()];
        let templates = TemplateSet::resolve(&["current_word"]).unwrap();
        let gaz = Gazetteer::new();

        let mut parameters = SparseVector::new();
        parameters.insert("Wi=France+Ti=B-LOC", 2.0);
        parameters.insert("Wi=backs+Ti=O", 2.0);

        let tagger = Tagger::new(&parameters, &templates, &tagset, &gaz);
        let tags = tagger.tag(&input).unwrap();
        assert_eq!(tags[1..3], ["B-LOC".to_string(), OUTSIDE.to_string()][..]);

        let est = tagger.evaluate(&[input]).unwrap();
        assert_eq!(est.fmeasure, 1.0);
    }

    #[test]
    fn prediction_rows_follow_conll_layout() {
        let input = point(&[("France", "B-LOC")]);
        let tagset = vec!["B-LOC".to_string()];
        let templates = TemplateSet::resolve(&["current_word"]).unwrap();
        let gaz = Gazetteer::new();
        let parameters = SparseVector::new();

        let tagger = Tagger::new(&parameters, &templates, &tagset, &gaz);
        let mut out = Vec::new();
        tagger.write_predictions(&mut out, &[input]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "France NNP I-NP B-LOC B-LOC\n\n"
        );
    }
}
