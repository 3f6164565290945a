//! Ratio-based sequence similarity used to fuzzy-match region names.
//!
//! The score of two strings `a` and `b` is `2 * M / (len(a) + len(b))`, where
//! `M` is the number of characters covered by their matching blocks. Matching
//! blocks are found recursively: take the longest common contiguous run
//! (earliest in `a`, then earliest in `b`, on equal length), then repeat on
//! the pieces to its left and to its right. Identical strings score 1.0,
//! strings with no character in common score 0.0, two empty strings score 1.0.
//!
//! No characters are treated as junk and no popularity heuristic is applied,
//! so the result depends only on the two strings.

use std::collections::HashMap;

/// A run of `size` equal characters at `a[a_start..]` and `b[b_start..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// A candidate that cleared the similarity threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'c> {
    pub candidate: &'c str,
    pub score: f64,
}

/// Position index of every character of `b`, in ascending order.
fn index_chars(b: &[char]) -> HashMap<char, Vec<usize>> {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }
    b2j
}

/// Longest common block within `a[alo..ahi]` and `b[blo..bhi]`.
fn find_longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> Block {
    let mut best = Block {
        a_start: alo,
        b_start: blo,
        size: 0,
    };
    // j2len[j] = length of the match ending at a[i - 1] and b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| j2len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, k);
                if k > best.size {
                    best = Block {
                        a_start: i + 1 - k,
                        b_start: j + 1 - k,
                        size: k,
                    };
                }
            }
        }
        j2len = next;
    }

    best
}

/// All matching blocks of `a` and `b`, sorted and with adjacent blocks merged.
pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<Block> {
    let b2j = index_chars(b);
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut blocks = Vec::new();

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let block = find_longest_match(a, &b2j, (alo, ahi), (blo, bhi));
        if block.size == 0 {
            continue;
        }
        blocks.push(block);
        if alo < block.a_start && blo < block.b_start {
            pending.push((alo, block.a_start, blo, block.b_start));
        }
        let a_end = block.a_start + block.size;
        let b_end = block.b_start + block.size;
        if a_end < ahi && b_end < bhi {
            pending.push((a_end, ahi, b_end, bhi));
        }
    }
    blocks.sort();

    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last)
                if last.a_start + last.size == block.a_start
                    && last.b_start + last.size == block.b_start =>
            {
                last.size += block.size;
            }
            _ => merged.push(block),
        }
    }
    merged
}

/// Similarity of `a` and `b` in `[0, 1]`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(&a, &b).iter().map(|block| block.size).sum();
    2.0 * matched as f64 / total as f64
}

/// Closest candidate to `query` with a score of at least `threshold`.
///
/// Equal scores go to the lexicographically lowest candidate, so the result
/// does not depend on iteration order.
pub fn best_match<'c, I>(query: &str, candidates: I, threshold: f64) -> Option<Match<'c>>
where
    I: IntoIterator<Item = &'c str>,
{
    let mut best: Option<Match<'c>> = None;

    for candidate in candidates {
        // candidate on the left, query on the right
        let score = ratio(candidate, query);
        if score < threshold {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                score > current.score
                    || (score == current.score && candidate < current.candidate)
            }
        };
        if better {
            best = Some(Match { candidate, score });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_ratio_known_values() {
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        assert!((ratio("apple", "appel") - 0.8).abs() < 1e-12);
        assert!((ratio("ape", "appel") - 0.75).abs() < 1e-12);
        assert!((ratio("peach", "appel") - 0.4).abs() < 1e-12);
        assert_eq!(ratio("KERALA", "KERALA"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("ABC", ""), 0.0);
        assert_eq!(ratio("ABC", "XYZ"), 0.0);
    }

    #[test]
    fn test_matching_blocks_are_merged_and_sorted() {
        let blocks = matching_blocks(
            &chars("HARYANA DELHI & CHANDIGARH"),
            &chars("HARYANA DELHI AND CHANDIGARH"),
        );
        assert_eq!(
            blocks,
            vec![
                Block { a_start: 0, b_start: 0, size: 14 },
                Block { a_start: 15, b_start: 17, size: 11 },
            ]
        );
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let b = chars("abab");
        let b2j = index_chars(&b);
        let block = find_longest_match(&chars("ab"), &b2j, (0, 2), (0, 4));
        assert_eq!(block, Block { a_start: 0, b_start: 0, size: 2 });
    }

    #[test]
    fn test_best_match_picks_highest_score() {
        let candidates = ["ape", "apple", "peach", "puppy"];
        let found = best_match("appel", candidates.iter().copied(), 0.6).unwrap();
        assert_eq!(found.candidate, "apple");
        assert!((found.score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 3 matching characters out of 10
        assert_eq!(ratio("abcxy", "abcde"), 0.6);
        assert!(best_match("abcde", ["abcxy"], 0.6).is_some());
        assert!(best_match("abcde", ["abcxy"], 0.61).is_none());
    }

    #[test]
    fn test_ties_go_to_lowest_candidate() {
        // both candidates share exactly "AB" with the query
        let forward = best_match("ABX", ["ABZ", "ABY"], 0.6).unwrap();
        let reverse = best_match("ABX", ["ABY", "ABZ"], 0.6).unwrap();
        assert_eq!(forward.candidate, "ABY");
        assert_eq!(reverse.candidate, "ABY");
    }

    #[test]
    fn test_nothing_above_threshold() {
        let candidates = ["KERALA", "PUNJAB", "WEST RAJASTHAN"];
        assert!(best_match("ATLANTIS", candidates, 0.6).is_none());
    }
}
