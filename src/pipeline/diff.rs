//! Dissimilarity between a new snapshot and its baseline.
//!
//! The score compares the sums of the code points of both strings:
//!
//! ```text
//! score = 100 * (1 - min(sum_a, sum_b) / max(sum_a, sum_b))
//! ```
//!
//! It is cheap and order-insensitive: permuted content, anagrams included,
//! scores 0. Replacing it with an edit distance would change when existing
//! thresholds fire, so the formula is kept as is.

/// Sum of the code points of every character.
fn code_point_sum(s: &str) -> f64 {
    s.chars().map(|c| f64::from(u32::from(c))).sum()
}

/// Dissimilarity score in `[0, 100]`; 0 when both sums are equal.
pub fn dissimilarity(a: &str, b: &str) -> f64 {
    let sum_a = code_point_sum(a);
    let sum_b = code_point_sum(b);

    if sum_a == sum_b {
        return 0.0;
    }
    let (low, high) = if sum_a < sum_b {
        (sum_a, sum_b)
    } else {
        (sum_b, sum_a)
    };
    100.0 - (low / high) * 100.0
}

/// Whether `score` counts as a change for `threshold`.
pub fn exceeds(score: f64, threshold: f64) -> bool {
    score > threshold
}
