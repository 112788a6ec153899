//! Parameter fingerprint extraction and cross-update coherence (spec
//! §2/3, §4.3).
//!
//! The fingerprint is a deterministic 128-component summary of one update:
//! caller-supplied metrics, lightweight linguistic features, a semantic
//! embedding slice, behavioral signals, and ethical/drift signals. Nothing
//! here touches the network — the 64-dim embedding slice is supplied by the
//! caller (`sentinel-collab` owns generating it, deterministically by
//! default); this module only knows how to assemble and compare the whole
//! vector.

/// Total fingerprint dimensionality (spec §2/3).
pub const FINGERPRINT_DIM: usize = 128;

const CORE_RANGE: std::ops::Range<usize> = 0..6;
const LINGUISTIC_RANGE: std::ops::Range<usize> = 6..26;
const EMBEDDING_RANGE: std::ops::Range<usize> = 26..90;
const BEHAVIORAL_RANGE: std::ops::Range<usize> = 90..110;
const DRIFT_RANGE: std::ops::Range<usize> = 110..128;

/// The 128-dim deterministic fingerprint vector.
pub type Fingerprint = Vec<f64>;

/// A fixed-size slice of `values` into `dest[range]`, zero-padded or
/// truncated to fit exactly.
fn place(dest: &mut [f64], range: std::ops::Range<usize>, values: &[f64]) {
    for (slot, idx) in range.enumerate() {
        dest[idx] = values.get(slot).copied().unwrap_or(0.0);
    }
}

/// Extract the 128-dim fingerprint for one update.
///
/// - `core_metrics`: caller-supplied numeric `parameters` (spec
///   `process_update.parameters`), placed in slots 0-5.
/// - `response_text`: the update's `response_text`, source of the
///   linguistic (6-25) and behavioral (90-109) feature bands.
/// - `embedding`: a 64-dim deterministic semantic embedding of
///   `response_text` (slots 26-89); `sentinel-collab`'s
///   `SemanticEmbedder` trait produces this.
/// - `drift`: the caller's `ethical_drift` vector, source of the
///   ethical/drift signal band (110-127).
///
/// Pure and idempotent: identical inputs always produce an identical
/// vector (spec §8, "round-trip").
pub fn extract(core_metrics: &[f64], response_text: &str, embedding: &[f64], drift: &[f64]) -> Fingerprint {
    let mut v = vec![0.0; FINGERPRINT_DIM];
    place(&mut v, CORE_RANGE, core_metrics);
    place(&mut v, LINGUISTIC_RANGE, &linguistic_features(response_text));
    place(&mut v, EMBEDDING_RANGE, embedding);
    place(&mut v, BEHAVIORAL_RANGE, &behavioral_features(response_text));
    place(&mut v, DRIFT_RANGE, drift);
    v
}

fn linguistic_features(text: &str) -> Vec<f64> {
    let len = text.len() as f64;
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len() as f64;
    let char_count = text.chars().count().max(1) as f64;
    let avg_word_len = if word_count > 0.0 {
        words.iter().map(|w| w.len() as f64).sum::<f64>() / word_count
    } else {
        0.0
    };
    let count_of = |pred: fn(char) -> bool| text.chars().filter(|c| pred(*c)).count() as f64;

    let periods = count_of(|c| c == '.');
    let commas = count_of(|c| c == ',');
    let questions = count_of(|c| c == '?');
    let exclaims = count_of(|c| c == '!');
    let digits = count_of(|c| c.is_ascii_digit());
    let uppercase = count_of(|c| c.is_ascii_uppercase());
    let code_fence = if text.contains("```") { 1.0 } else { 0.0 };
    let list_markers = text
        .lines()
        .filter(|l| {
            let t = l.trim_start();
            t.starts_with("- ") || t.starts_with("* ") || t.starts_with(|c: char| c.is_ascii_digit())
        })
        .count() as f64;

    vec![
        len.ln_1p(),
        word_count.ln_1p(),
        avg_word_len,
        periods / char_count,
        commas / char_count,
        questions / char_count,
        exclaims / char_count,
        digits / char_count,
        uppercase / char_count,
        code_fence,
        list_markers.ln_1p(),
        questions,
    ]
}

const HEDGING_WORDS: &[&str] = &[
    "maybe", "perhaps", "might", "could", "possibly", "seems", "appears", "likely", "roughly",
    "somewhat",
];
const CERTAINTY_WORDS: &[&str] = &[
    "definitely", "certainly", "always", "never", "must", "clearly", "obviously", "guaranteed",
];
const TOOL_WORDS: &[&str] = &["tool", "function", "api", "call", "invoke", "execute"];

fn behavioral_features(text: &str) -> Vec<f64> {
    let lower = text.to_ascii_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let word_count = (words.len() as f64).max(1.0);

    let count_any = |dict: &[&str]| -> f64 {
        words
            .iter()
            .filter(|w| dict.iter().any(|d| w.contains(d)))
            .count() as f64
    };

    let hedging = count_any(HEDGING_WORDS) / word_count;
    let certainty = count_any(CERTAINTY_WORDS) / word_count;
    let tool_mentions = count_any(TOOL_WORDS) / word_count;

    vec![hedging, certainty, tool_mentions]
}

/// Sigma chosen so a fingerprint delta of approximately 1.0 maps to
/// coherence of approximately 0.37 (spec §4.3): `exp(-1/1.0) = 0.3679`.
pub const COHERENCE_SIGMA: f64 = 1.0;

/// Cross-update coherence: `exp(-||theta_t - theta_{t-1}||_2 / sigma)`
/// (spec §4.3). Callers handle the "first update" special case themselves
/// (there is no previous fingerprint to compare against); this function
/// only ever compares two full vectors.
pub fn coherence(previous: &[f64], current: &[f64], sigma: f64) -> f64 {
    let dist_sq: f64 = previous
        .iter()
        .zip(current.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    (-dist_sq.sqrt() / sigma).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_round_trip() {
        let a = extract(&[1.0, 2.0], "hello world", &[0.1; 64], &[0.0, 0.1]);
        let b = extract(&[1.0, 2.0], "hello world", &[0.1; 64], &[0.0, 0.1]);
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_dimension() {
        let v = extract(&[], "", &[], &[]);
        assert_eq!(v.len(), FINGERPRINT_DIM);
    }

    #[test]
    fn identical_fingerprints_have_coherence_one() {
        let v = extract(&[1.0], "text", &[0.2; 64], &[0.1]);
        assert!((coherence(&v, &v, COHERENCE_SIGMA) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unit_delta_maps_near_037() {
        let mut prev = vec![0.0; FINGERPRINT_DIM];
        let mut cur = vec![0.0; FINGERPRINT_DIM];
        cur[0] = 1.0;
        prev[0] = 0.0;
        let c = coherence(&prev, &cur, COHERENCE_SIGMA);
        assert!((c - 0.3679).abs() < 0.01);
    }

    #[test]
    fn truncates_oversized_core_metrics() {
        let v = extract(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], "x", &[], &[]);
        assert_eq!(&v[0..6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
