// src/similarity/metrics.rs - Pairwise string similarity algorithms
//
// Every metric maps two strings to [0, 1], is symmetric, and never fails.
// Inputs are normalized first (lowercase, trimmed, single-spaced); an empty
// normalized input scores 0.0 and equal normalized inputs score 1.0.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use strsim::jaro;

use super::phonetic::{metaphone, soundex};

const WINKLER_PREFIX_SCALE: f64 = 0.1;
const WINKLER_MAX_PREFIX: usize = 4;
const WINKLER_BOOST_THRESHOLD: f64 = 0.7;

static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("token regex is valid"));

/// Lowercases, trims and collapses whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shared preamble of every metric: `Some(score)` short-circuits the comparison.
fn trivial_score(a: &str, b: &str) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        Some(0.0)
    } else if a == b {
        Some(1.0)
    } else {
        None
    }
}

/// Jaro similarity with Winkler's common-prefix bonus.
pub fn jaro_winkler_similarity(s1: &str, s2: &str) -> f64 {
    let (a, b) = (normalize_text(s1), normalize_text(s2));
    if let Some(score) = trivial_score(&a, &b) {
        return score;
    }
    // strsim's greedy matching is order sensitive on rare inputs
    let (a, b) = if a <= b { (a, b) } else { (b, a) };

    let jaro_score = jaro(&a, &b);
    if jaro_score < WINKLER_BOOST_THRESHOLD {
        return jaro_score;
    }

    let prefix_len = a
        .chars()
        .zip(b.chars())
        .take(WINKLER_MAX_PREFIX)
        .take_while(|(x, y)| x == y)
        .count();

    (jaro_score + prefix_len as f64 * WINKLER_PREFIX_SCALE * (1.0 - jaro_score)).min(1.0)
}

/// Length of the longest common subsequence of two char slices.
pub fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// `2 * |LCS(a, b)| / (|a| + |b|)`.
pub fn lcs_similarity(s1: &str, s2: &str) -> f64 {
    let (a, b) = (normalize_text(s1), normalize_text(s2));
    if let Some(score) = trivial_score(&a, &b) {
        return score;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let lcs = longest_common_subsequence(&a, &b);
    (2 * lcs) as f64 / (a.len() + b.len()) as f64
}

/// Set of contiguous character n-grams. A string shorter than `n` is one gram.
pub fn char_ngrams(text: &str, n: usize) -> HashSet<String> {
    let n = n.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return HashSet::new();
    }
    if chars.len() < n {
        return std::iter::once(chars.iter().collect()).collect();
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

fn jaccard<T: Eq + std::hash::Hash>(set1: &HashSet<T>, set2: &HashSet<T>) -> f64 {
    if set1.is_empty() || set2.is_empty() {
        return 0.0;
    }
    let intersection = set1.intersection(set2).count();
    let union = set1.len() + set2.len() - intersection;
    intersection as f64 / union as f64
}

/// Jaccard overlap of the character n-gram sets.
pub fn ngram_similarity(s1: &str, s2: &str, n: usize) -> f64 {
    let (a, b) = (normalize_text(s1), normalize_text(s2));
    if let Some(score) = trivial_score(&a, &b) {
        return score;
    }
    jaccard(&char_ngrams(&a, n), &char_ngrams(&b, n))
}

/// Word tokens: maximal runs of letters and digits, lowercased.
pub fn tokenize(text: &str) -> HashSet<String> {
    TOKEN_REGEX
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Jaccard index over word-token sets.
pub fn token_jaccard_similarity(s1: &str, s2: &str) -> f64 {
    let (a, b) = (normalize_text(s1), normalize_text(s2));
    if let Some(score) = trivial_score(&a, &b) {
        return score;
    }
    jaccard(&tokenize(&a), &tokenize(&b))
}

/// Which of the two phonetic codes agree for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhoneticAgreement {
    pub soundex: bool,
    pub metaphone: bool,
}

impl PhoneticAgreement {
    pub fn any(&self) -> bool {
        self.soundex || self.metaphone
    }
}

/// Compares Soundex and Metaphone codes. Empty codes never agree.
pub fn phonetic_agreement(s1: &str, s2: &str) -> PhoneticAgreement {
    let (a, b) = (normalize_text(s1), normalize_text(s2));
    if a.is_empty() || b.is_empty() {
        return PhoneticAgreement::default();
    }
    if a == b {
        return PhoneticAgreement {
            soundex: true,
            metaphone: true,
        };
    }
    let (sx1, sx2) = (soundex(&a), soundex(&b));
    let (mp1, mp2) = (metaphone(&a), metaphone(&b));
    PhoneticAgreement {
        soundex: !sx1.is_empty() && sx1 == sx2,
        metaphone: !mp1.is_empty() && mp1 == mp2,
    }
}

/// Binary phonetic signal: 1.0 when either phonetic code matches, else 0.0.
pub fn phonetic_similarity(s1: &str, s2: &str) -> f64 {
    if phonetic_agreement(s1, s2).any() {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPS: f64 = 1e-12;

    fn all_metrics(a: &str, b: &str) -> [f64; 6] {
        [
            jaro_winkler_similarity(a, b),
            lcs_similarity(a, b),
            ngram_similarity(a, b, 2),
            ngram_similarity(a, b, 3),
            phonetic_similarity(a, b),
            token_jaccard_similarity(a, b),
        ]
    }

    fn random_name(rng: &mut StdRng) -> String {
        const ALPHABET: &[char] = &[
            'a', 'c', 'e', 'm', 'o', 'r', 'p', ' ', 'A', 'C', 'к', 'о', 'м', 'п', 'а', '-', '1',
        ];
        let len = rng.gen_range(1..16);
        (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
            .collect()
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  ACME   Corp \t"), "acme corp");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_identical_strings_score_one() {
        for name in ["ACME Corp", "ООО Рога и Копыта", "x", "123 456", "!!!"] {
            for score in all_metrics(name, name) {
                assert!((score - 1.0).abs() < EPS, "{} scored {}", name, score);
            }
        }
        // case and surrounding whitespace do not matter
        for score in all_metrics("Acme Corp", "  ACME   CORP ") {
            assert!((score - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        for score in all_metrics("", "acme") {
            assert_eq!(score, 0.0);
        }
        for score in all_metrics("   ", "   ") {
            assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn test_metrics_are_symmetric_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let a = random_name(&mut rng);
            let b = random_name(&mut rng);
            let forward = all_metrics(&a, &b);
            let backward = all_metrics(&b, &a);
            for (x, y) in forward.iter().zip(backward.iter()) {
                assert_eq!(x, y, "asymmetric for {:?} / {:?}", a, b);
                assert!((0.0..=1.0).contains(x));
            }
        }
    }

    #[test]
    fn test_jaro_winkler_rewards_common_prefix() {
        let with_prefix = jaro_winkler_similarity("martha", "marhta");
        assert!((with_prefix - 0.9611).abs() < 1e-3, "got {}", with_prefix);
        assert!(jaro_winkler_similarity("dixon", "dicksonx") > 0.8);
        assert!(jaro_winkler_similarity("abc", "xyz") < 0.1);
    }

    #[test]
    fn test_lcs_ratio() {
        // lcs("acme corp", "acme corporation") = 9 -> 18 / 25
        assert!((lcs_similarity("acme corp", "acme corporation") - 0.72).abs() < EPS);
        assert_eq!(longest_common_subsequence(&['a', 'b', 'c'], &['x', 'b', 'c']), 2);
        assert_eq!(lcs_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_ngrams_degrade_for_short_strings() {
        let grams = char_ngrams("ab", 3);
        assert_eq!(grams.len(), 1);
        assert!(grams.contains("ab"));
        assert!(char_ngrams("", 2).is_empty());
        assert_eq!(char_ngrams("abcd", 2).len(), 3);
        // "ab" vs "abc" at n=3: {"ab"} vs {"abc"}
        assert_eq!(ngram_similarity("ab", "abc", 3), 0.0);
        assert!(ngram_similarity("кабель", "кабели", 2) > 0.5);
    }

    #[test]
    fn test_token_jaccard() {
        assert!((token_jaccard_similarity("acme corp", "acme corporation") - 1.0 / 3.0).abs() < EPS);
        assert_eq!(token_jaccard_similarity("Рога и Копыта", "копыта, и рога!"), 1.0);
        assert_eq!(token_jaccard_similarity("---", "acme"), 0.0);
    }

    #[test]
    fn test_phonetic_is_binary() {
        assert_eq!(phonetic_similarity("Robert", "Rupert"), 1.0);
        assert_eq!(phonetic_similarity("Smith", "Smyth"), 1.0);
        assert_eq!(phonetic_similarity("Acme", "Totally Different"), 0.0);
        // digits only encode to nothing and never agree unless identical
        assert_eq!(phonetic_similarity("123", "456"), 0.0);
        let agreement = phonetic_agreement("Robert", "Rupert");
        assert!(agreement.soundex);
    }
}
