// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic bag-of-words embedding used when no backend answers.
//!
//! Each lowercase whitespace token is hashed into one of `dimension` buckets
//! and weighted by `1 / (position + 1)`, then the vector is L2-normalized.
//! The hash is stable across processes so snapshots stay meaningful.

use crate::vector::l2_normalize;

/// Bag-of-words fallback embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackEmbedder {
    dimension: usize,
    max_tokens: usize,
}

impl FallbackEmbedder {
    pub fn new(dimension: usize, max_tokens: usize) -> Self {
        Self {
            dimension,
            max_tokens,
        }
    }

    /// Output dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `text`. Empty or whitespace-only text yields the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return buckets;
        }

        let lowered = text.to_lowercase();
        for (i, word) in lowered.split_whitespace().take(self.max_tokens).enumerate() {
            let position = (djb2(word) % self.dimension as u64) as usize;
            buckets[position] += 1.0 / (i as f32 + 1.0);
        }

        l2_normalize(&buckets)
    }
}

impl Default for FallbackEmbedder {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

/// djb2 string hash.
fn djb2(word: &str) -> u64 {
    word.bytes()
        .fold(5381u64, |hash, b| hash.wrapping_mul(33).wrapping_add(u64::from(b)))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::vector::is_zero;

    #[test]
    fn embedding_has_configured_dimension() {
        let fallback = FallbackEmbedder::new(100, 100);
        assert_eq!(fallback.embed("write a function").len(), 100);
    }

    #[test]
    fn embedding_is_deterministic_and_case_insensitive() {
        let fallback = FallbackEmbedder::default();
        assert_eq!(fallback.embed("Debug THIS code"), fallback.embed("debug this code"));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let fallback = FallbackEmbedder::default();
        assert!(is_zero(&fallback.embed("")));
        assert!(is_zero(&fallback.embed("   \n\t")));
    }

    #[test]
    fn earlier_tokens_weigh_more() {
        let fallback = FallbackEmbedder::new(1000, 100);
        let v = fallback.embed("alpha beta");
        let alpha = (djb2("alpha") % 1000) as usize;
        let beta = (djb2("beta") % 1000) as usize;
        assert_ne!(alpha, beta);
        assert!(v[alpha] > v[beta]);
    }

    #[test]
    fn tokens_beyond_limit_are_ignored() {
        let fallback = FallbackEmbedder::new(100, 2);
        assert_eq!(fallback.embed("one two three four"), fallback.embed("one two"));
    }

    proptest! {
        #[test]
        fn non_empty_text_embeds_to_unit_length(text in "[a-z]{1,8}( [a-z]{1,8}){0,30}") {
            let v = FallbackEmbedder::default().embed(&text);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-4);
        }
    }
}
