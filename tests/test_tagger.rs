use seqtag::{decode, DataPoint, Gazetteer, SparseVector, Tagger, TemplateSet, START, STOP};

#[test]
fn single_word_decode_prefers_higher_scoring_tag() {
    let tagset: Vec<String> = vec!["A".to_string(), "B".to_string()];
    let tags = decode(3, &tagset, |cur, _, _| if cur == "A" { 2.0 } else { 1.0 })
        .expect("decode failed");
    assert_eq!(tags, vec![START.to_string(), "A".to_string(), STOP.to_string()]);
}

#[test]
fn decode_always_returns_padded_shape() {
    let tagset: Vec<String> = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    for input_length in 3..10 {
        let tags = decode(input_length, &tagset, |_, _, pos| (pos as f64).sin())
            .expect("decode failed");
        assert_eq!(tags.len(), input_length);
        assert_eq!(tags[0], START);
        assert_eq!(tags[input_length - 1], STOP);
    }
}

#[test]
fn saved_model_tags_identically_after_reload() {
    let input = DataPoint::new(
        vec!["France".to_string(), "backs".to_string()],
        vec!["NNP".to_string(), "VBZ".to_string()],
        vec!["I-NP".to_string(), "I-VP".to_string()],
        vec!["B-LOC".to_string(), "O".to_string()],
    );
    let tagset: Vec<String> = vec!["B-LOC".to_string(), "O".to_string()];
    let templates = TemplateSet::all();
    let mut gazetteer = Gazetteer::new();
    gazetteer.insert("LOC", "France");

    let mut parameters = SparseVector::new();
    parameters.insert("Wi=France+Ti=B-LOC", 1.5);
    parameters.insert("GAZi=TrueTi=B-LOC", 0.75);
    parameters.insert("Wi=backs+Ti=O", 2.0);
    parameters.insert("Ti=O+Ti-1=B-LOC", 0.25);

    let path = std::env::temp_dir().join("seqtag_test_model_reload");
    parameters.save(&path).expect("failed to save model");
    let reloaded = SparseVector::load(&path).expect("failed to load model");
    std::fs::remove_file(&path).ok();
    assert_eq!(parameters, reloaded);

    let before = Tagger::new(&parameters, &templates, &tagset, &gazetteer)
        .tag(&input)
        .expect("failed to tag");
    let after = Tagger::new(&reloaded, &templates, &tagset, &gazetteer)
        .tag(&input)
        .expect("failed to tag");
    assert_eq!(before, after);
    assert_eq!(before[1..3], ["B-LOC".to_string(), "O".to_string()][..]);
}
