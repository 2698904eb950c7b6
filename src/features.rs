use crate::dataset::DataPoint;
use crate::decoder::STOP;
use crate::error::{Error, Result};
use crate::gazetteer::Gazetteer;
use crate::sparse::SparseVector;

/// Tag carrying no entity, special-cased by the gazetteer template and the
/// asymmetric training costs.
pub const OUTSIDE: &str = "O";

/// A feature template: a pure function adding indicator features for one
/// (current tag, previous tag, position) query into `out`.
pub type TemplateFn = fn(&Extractor, &str, &str, usize, &mut SparseVector);

/* Ordered registry of every known template. Adding a template is one row
here; activation and dispatch never change. */
const REGISTRY: &[(&str, TemplateFn)] = &[
    ("current_word", current_word),
    ("prev_tag", prev_tag),
    ("lowercase", lowercase),
    ("current_pos_tag", current_pos_tag),
    ("shape", shape),
    ("prev_next_word_features", prev_next_word_features),
    ("word_lower_pos", word_lower_pos),
    ("length_k", length_k),
    ("gazetteer", gazetteer),
    ("uppercase", uppercase),
    ("position", position),
];

/// An activated subset of the template registry, resolved once per run and
/// shared by every extractor.
#[derive(Clone)]
pub struct TemplateSet {
    active: Vec<(&'static str, TemplateFn)>,
}

impl TemplateSet {
    /// Resolves template names against the registry, keeping registry
    /// order. Unknown names fail fast rather than silently deactivating.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        for name in names {
            if !REGISTRY.iter().any(|(n, _)| *n == name.as_ref()) {
                return Err(Error::UnknownTemplate(name.as_ref().to_string()));
            }
        }
        let active = REGISTRY
            .iter()
            .filter(|(n, _)| names.iter().any(|name| name.as_ref() == *n))
            .copied()
            .collect();
        Ok(Self { active })
    }

    /// Every registered template, in registry order.
    pub fn all() -> Self {
        Self {
            active: REGISTRY.to_vec(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.active.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/**
 * Computes the active indicator features for scoring queries against one
 *  sentence. Holds the padded input columns read-only; the gold tags travel
 *  with the input but are never consulted by any template.
 */
pub struct Extractor<'a> {
    input: &'a DataPoint,
    gazetteer: &'a Gazetteer,
    templates: &'a TemplateSet,
}

impl<'a> Extractor<'a> {
    pub fn new(input: &'a DataPoint, gazetteer: &'a Gazetteer, templates: &'a TemplateSet) -> Self {
        Self {
            input,
            gazetteer,
            templates,
        }
    }

    /// Features for tagging padded position `i` with `cur_tag` after
    /// `prev_tag`. Every active template contributes weight-1 indicators;
    /// `i` must be at least 1 (position 0 is the START sentinel, which is
    /// never scored).
    pub fn features(&self, cur_tag: &str, prev_tag: &str, i: usize) -> SparseVector {
        debug_assert!(i >= 1 && i < self.input.len());
        let mut feats = SparseVector::new();
        for (_, template) in &self.templates.active {
            template(self, cur_tag, prev_tag, i, &mut feats);
        }
        feats
    }

    /// Summed features of a full padded tag path, i.e. the path's feature
    /// representation under the current template set.
    pub fn path_features(&self, tags: &[String]) -> SparseVector {
        let mut total = SparseVector::new();
        for i in 1..tags.len() {
            total.scale_add(1.0, &self.features(&tags[i], &tags[i - 1], i));
        }
        total
    }

    fn token(&self, i: usize) -> &str {
        &self.input.tokens[i]
    }

    fn pos_tag(&self, i: usize) -> &str {
        &self.input.pos[i]
    }
}

fn current_word(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    out.add(format!("Wi={}+Ti={}", x.token(i), cur), 1.0);
}

fn prev_tag(_x: &Extractor, cur: &str, prev: &str, _i: usize, out: &mut SparseVector) {
    out.add(format!("Ti={}+Ti-1={}", cur, prev), 1.0);
}

fn lowercase(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    out.add(format!("Oi={}+Ti={}", x.token(i).to_lowercase(), cur), 1.0);
}

fn current_pos_tag(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    out.add(format!("Pi={}+Ti={}", x.pos_tag(i), cur), 1.0);
}

/// Character classes: uppercase -> `A`, lowercase -> `a`, digit -> `d`,
/// anything else kept as-is.
fn shape(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    let shape: String = x
        .token(i)
        .chars()
        .map(|c| {
            if c.is_uppercase() {
                'A'
            } else if c.is_lowercase() {
                'a'
            } else if c.is_ascii_digit() {
                'd'
            } else {
                c
            }
        })
        .collect();
    out.add(format!("Si={}+Ti={}", shape, cur), 1.0);
}

fn prev_next_word_features(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    let prev_word = x.token(i - 1);
    out.add(format!("Wi-1={}+Ti={}", prev_word, cur), 1.0);
    out.add(format!("Oi-1={}+Ti={}", prev_word.to_lowercase(), cur), 1.0);
    out.add(format!("Pi-1={}+Ti={}", x.pos_tag(i - 1), cur), 1.0);

    if x.token(i) != STOP {
        let next_word = x.token(i + 1);
        out.add(format!("Wi+1={}+Ti={}", next_word, cur), 1.0);
        out.add(format!("Oi+1={}+Ti={}", next_word.to_lowercase(), cur), 1.0);
        out.add(format!("Pi+1={}+Ti={}", x.pos_tag(i + 1), cur), 1.0);
    }
}

fn word_lower_pos(x: &Extractor, cur: &str, prev: &str, i: usize, out: &mut SparseVector) {
    let word = x.token(i);
    out.add(
        format!(
            "Wi={}+Oi={}+P_i={}+Ti-1={}+Ti={}",
            word,
            word.to_lowercase(),
            x.pos_tag(i),
            prev,
            cur
        ),
        1.0,
    );
}

/// Every character prefix of the token up to length 4.
fn length_k(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    let word = x.token(i);
    let n = word.chars().count().min(4);
    for k in 1..=n {
        let prefix: String = word.chars().take(k).collect();
        out.add(format!("PREi={}Ti={}", prefix, cur), 1.0);
    }
}

/// Boolean membership of the token in the gazetteer list keyed by the tag's
/// type suffix ("PER" from "B-PER"). Always emits a key so the feature stays
/// boolean-valued even at the STOP sentinel.
fn gazetteer(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    let word = x.token(i);
    let hit = word != STOP
        && cur != OUTSIDE
        && match cur.split_once('-') {
            Some((_, kind)) => x.gazetteer.contains(kind, word),
            None => false,
        };
    if hit {
        out.add(format!("GAZi=TrueTi={}", cur), 1.0);
    } else {
        out.add(format!("GAZi=FalseTi={}", cur), 1.0);
    }
}

fn uppercase(x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    let capitalized = x
        .token(i)
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false);
    if capitalized {
        out.add(format!("CAPi=True+Ti={}", cur), 1.0);
    } else {
        out.add(format!("CAPi=False+Ti={}", cur), 1.0);
    }
}

fn position(_x: &Extractor, cur: &str, _prev: &str, i: usize, out: &mut SparseVector) {
    out.add(format!("POSi={}+Ti={}", i, cur), 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> DataPoint {
        DataPoint::new(
            vec!["France".to_string(), "backs".to_string()],
            vec!["NNP".to_string(), "VBZ".to_string()],
            vec!["I-NP".to_string(), "I-VP".to_string()],
            vec!["B-LOC".to_string(), "O".to_string()],
        )
    }

    #[test]
    fn unknown_template_fails_fast() {
        assert!(matches!(
            TemplateSet::resolve(&["current_word", "no_such_template"]),
            Err(Error::UnknownTemplate(name)) if name == "no_such_template"
        ));
    }

    #[test]
    fn resolve_keeps_registry_order() {
        let set = TemplateSet::resolve(&["prev_tag", "current_word"]).unwrap();
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["current_word", "prev_tag"]
        );
    }

    #[test]
    fn indicator_key_formats() {
        let input = point();
        let gaz = Gazetteer::new();
        let set = TemplateSet::all();
        let x = Extractor::new(&input, &gaz, &set);
        let feats = x.features("B-LOC", "<START>", 1);

        assert_eq!(feats.get("Wi=France+Ti=B-LOC"), 1.0);
        assert_eq!(feats.get("Ti=B-LOC+Ti-1=<START>"), 1.0);
        assert_eq!(feats.get("Oi=france+Ti=B-LOC"), 1.0);
        assert_eq!(feats.get("Pi=NNP+Ti=B-LOC"), 1.0);
        assert_eq!(feats.get("Si=Aaaaaa+Ti=B-LOC"), 1.0);
        assert_eq!(feats.get("Wi-1=<START>+Ti=B-LOC"), 1.0);
        assert_eq!(feats.get("Wi+1=backs+Ti=B-LOC"), 1.0);
        assert_eq!(
            feats.get("Wi=France+Oi=france+P_i=NNP+Ti-1=<START>+Ti=B-LOC"),
            1.0
        );
        assert_eq!(feats.get("PREi=FTi=B-LOC"), 1.0);
        assert_eq!(feats.get("PREi=FranTi=B-LOC"), 1.0);
        assert_eq!(feats.get("PREi=FrancTi=B-LOC"), 0.0);
        assert_eq!(feats.get("GAZi=FalseTi=B-LOC"), 1.0);
        assert_eq!(feats.get("CAPi=True+Ti=B-LOC"), 1.0);
        assert_eq!(feats.get("POSi=1+Ti=B-LOC"), 1.0);
    }

    #[test]
    fn gazetteer_membership_uses_type_suffix() {
        let input = point();
        let mut gaz = Gazetteer::new();
        gaz.insert("LOC", "France");
        let set = TemplateSet::resolve(&["gazetteer"]).unwrap();
        let x = Extractor::new(&input, &gaz, &set);

        assert_eq!(x.features("B-LOC", OUTSIDE, 1).get("GAZi=TrueTi=B-LOC"), 1.0);
        // Wrong type suffix misses.
        assert_eq!(
            x.features("B-PER", OUTSIDE, 1).get("GAZi=FalseTi=B-PER"),
            1.0
        );
        // "O" never consults the gazetteer.
        assert_eq!(x.features(OUTSIDE, OUTSIDE, 1).get("GAZi=FalseTi=O"), 1.0);
        // The STOP sentinel always reads as a miss but still emits the key.
        assert_eq!(
            x.features(OUTSIDE, OUTSIDE, 3).get("GAZi=FalseTi=O"),
            1.0
        );
    }

    #[test]
    fn stop_position_has_no_next_word_features() {
        let input = point();
        let gaz = Gazetteer::new();
        let set = TemplateSet::resolve(&["prev_next_word_features"]).unwrap();
        let x = Extractor::new(&input, &gaz, &set);
        let feats = x.features(OUTSIDE, OUTSIDE, 3);
        assert_eq!(feats.get("Wi-1=backs+Ti=O"), 1.0);
        assert_eq!(feats.len(), 3);
    }

    #[test]
    fn path_features_sum_positionwise_features() {
        let input = point();
        let gaz = Gazetteer::new();
        let set = TemplateSet::resolve(&["prev_tag"]).unwrap();
        let x = Extractor::new(&input, &gaz, &set);
        let path = x.path_features(&input.gold_tags);

        assert_eq!(path.get("Ti=B-LOC+Ti-1=<START>"), 1.0);
        assert_eq!(path.get("Ti=O+Ti-1=B-LOC"), 1.0);
        assert_eq!(path.get("Ti=<STOP>+Ti-1=O"), 1.0);
        assert_eq!(path.len(), 3);
    }
}
