//! Pure string-similarity scoring.
//!
//! Ordered precedence, first match wins:
//!
//! 1. exact match (case-insensitive) → 1.0
//! 2. haystack contains needle → 0.9
//! 3. approximate subsequence coverage, scaled by 0.7
//!
//! Containment-class matches (substring, which subsumes prefix and
//! whole-word hits) are far stronger signals than generic subsequence
//! overlap, so they short-circuit before the weak heuristic runs. Any
//! replacement algorithm must keep that precedence: a full containment
//! match never scores below a partial one.

/// Case-insensitive, pure, deterministic similarity scorer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FuzzyMatcher;

impl FuzzyMatcher {
    /// Score how well `needle` matches `haystack`, in `[0, 1]`.
    ///
    /// Empty inputs score 0.
    #[must_use]
    pub fn score(&self, needle: &str, haystack: &str) -> f64 {
        let needle = needle.trim().to_lowercase();
        let haystack = haystack.trim().to_lowercase();

        if needle.is_empty() || haystack.is_empty() {
            return 0.0;
        }
        if needle == haystack {
            return 1.0;
        }
        if haystack.contains(&needle) {
            return 0.9;
        }

        subsequence_coverage(&needle, &haystack) * 0.7
    }
}

/// Fraction of `needle` characters found in order within `haystack`,
/// normalized by the longer of the two lengths.
///
/// The cursor only moves forward: each needle character must appear after
/// the position where the previous one matched.
#[allow(clippy::cast_precision_loss)]
fn subsequence_coverage(needle: &str, haystack: &str) -> f64 {
    let hay: Vec<char> = haystack.chars().collect();
    let needle_len = needle.chars().count();

    let mut cursor = 0usize;
    let mut matched = 0usize;
    for ch in needle.chars() {
        while cursor < hay.len() {
            cursor += 1;
            if hay[cursor - 1] == ch {
                matched += 1;
                break;
            }
        }
        if cursor >= hay.len() {
            break;
        }
    }

    matched as f64 / needle_len.max(hay.len()) as f64
}
