use std::collections::HashMap;
use std::fmt::Display;
use std::iter::zip;

use serde::Serialize;

/// Label-wise performance values.
#[derive(Debug, Default)]
struct LabelMeasure {
    /// Number of correct predictions.
    num_correct: usize,
    /** Number of occurrences of the label in the gold-standard data. */
    num_observation: usize,
    /** Number of predictions. */
    num_prediction: usize,
    /** Precision. */
    precision: f64,
    /** Recall. */
    recall: f64,
    /** F1 score. */
    fmeasure: f64,
}

/// An overall performance values accumulator.
#[derive(Debug, Default)]
pub struct Evaluation {
    /** Label-wise evaluations. */
    tbl: HashMap<String, LabelMeasure>,

    /** Number of correctly predicted items. */
    item_total_correct: usize,
    /** Total number of items. */
    item_total_num: usize,
    /** Item-level accuracy. */
    item_accuracy: f64,

    /** Number of correctly predicted instances. */
    inst_total_correct: usize,
    /** Total number of instances. */
    inst_total_num: usize,
    /** Instance-level accuracy. */
    inst_accuracy: f64,

    /** Macro-averaged precision. */
    macro_precision: f64,
    /** Macro-averaged recall. */
    macro_recall: f64,
    /** Macro-averaged F1 score. */
    macro_fmeasure: f64,
}

/// The averaged scores early stopping and reports consume.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl Evaluation {
    /// Accumulates one sentence. Both slices are unpadded (no sentinels) and
    /// must have equal length.
    pub fn accumulate(&mut self, reference: &[String], prediction: &[String]) {
        let mut matched = 0;
        for (r, p) in zip(reference, prediction) {
            self.tbl.entry(r.to_string()).or_default().num_observation += 1;
            self.tbl.entry(p.to_string()).or_default().num_prediction += 1;
            if *r == *p {
                self.tbl.entry(r.to_string()).or_default().num_correct += 1;
                matched += 1;
            }
            self.item_total_num += 1;
        }

        if matched == prediction.len() {
            self.inst_total_correct += 1;
        }
        self.inst_total_num += 1;
    }

    /// Finalizes per-label scores and macro averages from the raw counts.
    /// Recomputes from scratch, so repeated calls return the same result.
    pub fn evaluate(&mut self) -> Estimation {
        let mut num_labels = 0;
        let mut item_total_correct = 0;
        let mut macro_precision = 0.0;
        let mut macro_recall = 0.0;
        let mut macro_fmeasure = 0.0;
        for lev in self.tbl.values_mut() {
            if lev.num_observation == 0 {
                continue;
            }
            num_labels += 1;
            item_total_correct += lev.num_correct;

            lev.precision = 0.0;
            lev.recall = 0.0;
            lev.fmeasure = 0.0;

            if lev.num_prediction > 0 {
                lev.precision = lev.num_correct as f64 / lev.num_prediction as f64;
            }
            if lev.num_observation > 0 {
                lev.recall = lev.num_correct as f64 / lev.num_observation as f64;
            }
            if lev.precision + lev.recall > 0.0 {
                lev.fmeasure = lev.precision * lev.recall * 2.0 / (lev.precision + lev.recall);
            }
            macro_precision += lev.precision;
            macro_recall += lev.recall;
            macro_fmeasure += lev.fmeasure;
        }

        if num_labels > 0 {
            macro_precision /= num_labels as f64;
            macro_recall /= num_labels as f64;
            macro_fmeasure /= num_labels as f64;
        }
        self.macro_precision = macro_precision;
        self.macro_recall = macro_recall;
        self.macro_fmeasure = macro_fmeasure;
        self.item_total_correct = item_total_correct;
        if self.item_total_num > 0 {
            self.item_accuracy = self.item_total_correct as f64 / self.item_total_num as f64;
        }
        if self.inst_total_num > 0 {
            self.inst_accuracy = self.inst_total_correct as f64 / self.inst_total_num as f64;
        }
        Estimation {
            precision: self.macro_precision,
            recall: self.macro_recall,
            fmeasure: self.macro_fmeasure,
        }
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Performance by label (#match, #model, #ref) (precision, recall, F1):"
        )?;
        for (label, lev) in &self.tbl {
            if lev.num_observation == 0 {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) (******, ******, ******)",
                    label, lev.num_correct, lev.num_prediction, lev.num_observation
                )?;
            } else {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.num_correct,
                    lev.num_prediction,
                    lev.num_observation,
                    lev.precision,
                    lev.recall,
                    lev.fmeasure
                )?;
            }
        }
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({:.4}, {:.4}, {:.4})",
            self.macro_precision, self.macro_recall, self.macro_fmeasure
        )?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4}",
            self.item_total_correct, self.item_total_num, self.item_accuracy
        )?;
        writeln!(
            f,
            "Sequence accuracy: {}/{} => {:.4}",
            self.inst_total_correct, self.inst_total_num, self.inst_accuracy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn perfect_prediction_scores_one() {
        let mut ev = Evaluation::default();
        ev.accumulate(&tags(&["B-LOC", "O"]), &tags(&["B-LOC", "O"]));
        let est = ev.evaluate();
        assert_eq!(est.precision, 1.0);
        assert_eq!(est.recall, 1.0);
        assert_eq!(est.fmeasure, 1.0);
    }

    #[test]
    fn repeated_evaluation_returns_same_scores() {
        let mut ev = Evaluation::default();
        ev.accumulate(
            &tags(&["B-LOC", "O", "O", "B-PER"]),
            &tags(&["B-LOC", "B-LOC", "O", "O"]),
        );
        let first = ev.evaluate();
        let second = ev.evaluate();
        assert_eq!(first.precision, second.precision);
        assert_eq!(first.recall, second.recall);
        assert_eq!(first.fmeasure, second.fmeasure);
        assert_eq!(ev.item_total_correct, 2);
        assert!((ev.item_accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn macro_averages_per_label() {
        let mut ev = Evaluation::default();
        ev.accumulate(
            &tags(&["B-LOC", "O", "O", "B-PER"]),
            &tags(&["B-LOC", "B-LOC", "O", "O"]),
        );
        let est = ev.evaluate();
        // B-LOC: p=1/2 r=1/1; O: p=1/2 r=1/2; B-PER: p=0 r=0.
        assert!((est.precision - (0.5 + 0.5 + 0.0) / 3.0).abs() < 1e-12);
        assert!((est.recall - (1.0 + 0.5 + 0.0) / 3.0).abs() < 1e-12);
    }
}
