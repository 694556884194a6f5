// tests/similarity_properties.rs - Scoring properties over seeded random names
use dedupe_lib::models::similarity::{SimilarityPair, SimilarityWeights};
use dedupe_lib::similarity::{hybrid_similarity, validate_weights, SimilarityService, MAX_BATCH_PAIRS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[char] = &[
    'a', 'c', 'e', 'k', 'm', 'o', 'r', 't', 'а', 'к', 'о', 'р', 'с', 'т', ' ', '-', '1',
];

fn random_name(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..16);
    let name: String = (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect();
    if name.trim().is_empty() {
        "x".to_string()
    } else {
        name
    }
}

#[test]
fn scores_are_reflexive_symmetric_and_bounded() {
    let service = SimilarityService::new(SimilarityWeights::default(), 512).unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..300 {
        let a = random_name(&mut rng);
        let b = random_name(&mut rng);
        assert_eq!(service.similarity(&a, &a).unwrap(), 1.0, "identity for {:?}", a);
        let ab = service.similarity(&a, &b).unwrap();
        let ba = service.similarity(&b, &a).unwrap();
        assert_eq!(ab, ba, "symmetry for {:?} / {:?}", a, b);
        assert!((0.0..=1.0).contains(&ab));
    }
}

#[test]
fn cached_scores_equal_direct_scores() {
    let weights = validate_weights(&SimilarityWeights {
        jaro_winkler: 0.5,
        lcs: 0.1,
        phonetic: 0.1,
        ngram: 0.2,
        jaccard: 0.1,
    })
    .unwrap();
    let service = SimilarityService::new(weights, 64).unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let a = random_name(&mut rng);
        let b = random_name(&mut rng);
        let direct = hybrid_similarity(&a, &b, &weights);
        assert_eq!(service.similarity(&a, &b).unwrap(), direct);
        assert_eq!(service.score(&a, &b, None).unwrap().similarity, direct);
    }
}

#[test]
fn reference_names_land_on_the_expected_side() {
    let service = SimilarityService::new(SimilarityWeights::default(), 16).unwrap();
    assert!(service.similarity("ACME Corp", "Acme Corporation").unwrap() > 0.5);
    assert!(service.similarity("ACME Corp", "Totally Different Inc").unwrap() < 0.3);
}

#[test]
fn blank_names_are_validation_errors() {
    let service = SimilarityService::disabled();
    for (a, b) in [("", "Acme"), ("Acme", "   "), ("", "")] {
        let err = service.score(a, b, None).unwrap_err();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }
}

#[test]
fn set_weights_always_yields_a_unit_sum() {
    let service = SimilarityService::new(SimilarityWeights::default(), 16).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let raw = SimilarityWeights::from_array([
            rng.gen_range(0.0..3.0),
            rng.gen_range(0.0..3.0),
            rng.gen_range(0.0..3.0),
            rng.gen_range(0.0..3.0),
            rng.gen_range(0.01..3.0),
        ]);
        let stored = service.set_weights(Some(&raw)).unwrap();
        assert!((stored.sum() - 1.0).abs() < 1e-9);
        let revalidated = validate_weights(&stored).unwrap();
        assert!((revalidated.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn batch_size_limits() {
    let service = SimilarityService::new(SimilarityWeights::default(), 2048).unwrap();
    assert!(service.batch_score(&[], None).unwrap_err().is_validation());

    let pairs: Vec<SimilarityPair> = (0..MAX_BATCH_PAIRS)
        .map(|i| SimilarityPair::new(format!("Company {}", i), format!("Company {}", i % 7)))
        .collect();
    let result = service.batch_score(&pairs, None).unwrap();
    assert_eq!(result.items.len(), MAX_BATCH_PAIRS);
    for (pair, item) in pairs.iter().zip(&result.items) {
        assert_eq!(item.string1, pair.s1);
        assert_eq!(item.string2, pair.s2);
        assert!(item.similarity.is_some());
    }

    let mut too_many = pairs;
    too_many.push(SimilarityPair::new("one", "more"));
    assert!(service.batch_score(&too_many, None).unwrap_err().is_validation());
}
