use crate::error::{Error, Result};

/// Sentinel bounding the front of every padded sequence. Never a member of
/// the tagset.
pub const START: &str = "<START>";
/// Sentinel bounding the back of every padded sequence.
pub const STOP: &str = "<STOP>";

/**
 * Viterbi decoding: the highest-scoring tag path under a first-order
 *  pairwise scoring function.
 *
 * `input_length` counts the padded sequence including the sentinels, so the
 *  real words live at positions `1..input_length-1`. `score` is a black box
 *  from (current tag, previous tag, position) to a score; position indexes
 *  the padded sequence. The result always has length `input_length`, starts
 *  with `START` and ends with `STOP`.
 *
 * Ties break toward the earlier tag in `tagset` order, at every position and
 *  at termination.
 */
pub fn decode<F>(input_length: usize, tagset: &[String], score: F) -> Result<Vec<String>>
where
    F: Fn(&str, &str, usize) -> f64,
{
    if tagset.is_empty() {
        return Err(Error::Decode("empty tagset".to_string()));
    }
    if input_length < 3 {
        return Err(Error::Decode(format!(
            "input length {} too short: need at least START, one word, STOP",
            input_length
        )));
    }
    let n_tags = tagset.len();
    let n_words = input_length - 2;

    /* best_score[i * n_tags + j] is the score of the best path over the
    first i+1 words that tags word #i with tag #j; best_prev holds the
    argmax predecessor for the backtrace. */
    let mut best_score = vec![f64::NEG_INFINITY; n_words * n_tags];
    let mut best_prev = vec![0usize; n_words * n_tags];

    /* Word #0 can only be entered from START. */
    for j in 0..n_tags {
        best_score[j] = score(&tagset[j], START, 1);
    }

    for i in 1..n_words {
        for j in 0..n_tags {
            let mut max_score = f64::NEG_INFINITY;
            let mut argmax = 0;
            for k in 0..n_tags {
                /* Transit from (i-1, k) to (i, j); word #i sits at padded
                position i+1. */
                let s = best_score[(i - 1) * n_tags + k] + score(&tagset[j], &tagset[k], i + 1);
                if s > max_score {
                    max_score = s;
                    argmax = k;
                }
            }
            best_score[i * n_tags + j] = max_score;
            best_prev[i * n_tags + j] = argmax;
        }
    }

    /* Pick the best final tag, then trace the backward links. */
    let mut path = vec![0usize; n_words];
    let mut max_score = f64::NEG_INFINITY;
    for j in 0..n_tags {
        let s = best_score[(n_words - 1) * n_tags + j];
        if s > max_score {
            max_score = s;
            path[n_words - 1] = j;
        }
    }
    for i in (1..n_words).rev() {
        path[i - 1] = best_prev[i * n_tags + path[i]];
    }

    let mut tags = Vec::with_capacity(input_length);
    tags.push(START.to_string());
    tags.extend(path.into_iter().map(|j| tagset[j].clone()));
    tags.push(STOP.to_string());
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagset(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn output_shape_and_sentinels() {
        let tags = tagset(&["A", "B", "C"]);
        let out = decode(7, &tags, |_, _, _| 0.0).unwrap();
        assert_eq!(out.len(), 7);
        assert_eq!(out[0], START);
        assert_eq!(out[6], STOP);
        for tag in &out[1..6] {
            assert!(tags.contains(tag));
        }
    }

    #[test]
    fn constant_score_breaks_ties_toward_first_tag() {
        let tags = tagset(&["B-PER", "B-LOC", "O"]);
        let out = decode(6, &tags, |_, _, _| 1.0).unwrap();
        assert_eq!(out[1..5], tagset(&["B-PER", "B-PER", "B-PER", "B-PER"])[..]);
    }

    #[test]
    fn single_word_prefers_higher_scoring_tag() {
        let tags = tagset(&["A", "B"]);
        let out = decode(3, &tags, |cur, _, _| if cur == "A" { 2.0 } else { 1.0 }).unwrap();
        assert_eq!(out, tagset(&[START, "A", STOP]));
    }

    #[test]
    fn follows_transition_scores() {
        // Word 0 wants "A"; every following position only pays off after "A",
        // forcing an alternating path.
        let tags = tagset(&["A", "B"]);
        let out = decode(5, &tags, |cur, prev, pos| {
            if pos == 1 {
                if cur == "A" {
                    1.0
                } else {
                    0.0
                }
            } else if prev == "A" && cur == "B" || prev == "B" && cur == "A" {
                1.0
            } else {
                -1.0
            }
        })
        .unwrap();
        assert_eq!(out, tagset(&[START, "A", "B", "A", STOP]));
    }

    #[test]
    fn positions_are_padded_indices() {
        // Record every position the scorer is asked about.
        use std::cell::RefCell;
        let seen = RefCell::new(Vec::new());
        let tags = tagset(&["A"]);
        decode(5, &tags, |_, _, pos| {
            seen.borrow_mut().push(pos);
            0.0
        })
        .unwrap();
        let mut positions = seen.into_inner();
        positions.sort_unstable();
        positions.dedup();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let tags = tagset(&["A"]);
        assert!(matches!(
            decode(2, &tags, |_, _, _| 0.0),
            Err(Error::Decode(_))
        ));
        assert!(matches!(
            decode(5, &[], |_, _, _| 0.0),
            Err(Error::Decode(_))
        ));
    }
}
