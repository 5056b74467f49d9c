//! String similarity for matching against previously successful queries.
//!
//! Sørensen–Dice coefficient over character bigrams, case-insensitive.
//! Scores land in [0, 1]; identical strings score 1.

use std::collections::HashMap;

fn bigrams(text: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// Dice coefficient between two strings.
///
/// Strings shorter than two characters have no bigrams; they score 1 only
/// when equal (after lowercasing), else 0.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);

    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return if a.to_lowercase() == b.to_lowercase() {
            1.0
        } else {
            0.0
        };
    }

    let a_total: usize = a_bigrams.values().sum();
    let b_total: usize = b_bigrams.values().sum();
    let overlap: usize = a_bigrams
        .iter()
        .map(|(bigram, &count)| count.min(*b_bigrams.get(bigram).unwrap_or(&0)))
        .sum();

    2.0 * overlap as f64 / (a_total + b_total) as f64
}

// ============================================================================
// Tests
// ============================================================================
