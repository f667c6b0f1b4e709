//! Gestalt pattern matching (Ratcliff/Obershelp) similarity.
//!
//! `ratio = 2 * M / (len(a) + len(b))` where `M` is the number of characters
//! in matching blocks found by recursively taking the longest common
//! substring and recursing on both sides of it.

use std::collections::HashMap;

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties resolve to the earliest start in `a`, then in `b`.
fn find_longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate().take(bhi).skip(blo) {
        b_index.entry(c).or_default().push(j);
    }

    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    let mut lengths: HashMap<usize, usize> = HashMap::new();
    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_index.get(c) {
            for &j in positions {
                let len = if j > 0 { lengths.get(&(j - 1)).copied().unwrap_or(0) } else { 0 } + 1;
                next.insert(j, len);
                if len > best_len {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_len = len;
                }
            }
        }
        lengths = next;
    }
    (best_i, best_j, best_len)
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut queue = vec![((0, a.len()), (0, b.len()))];
    while let Some(((alo, ahi), (blo, bhi))) = queue.pop() {
        let (i, j, len) = find_longest_match(a, b, (alo, ahi), (blo, bhi));
        if len == 0 {
            continue;
        }
        total += len;
        if alo < i && blo < j {
            queue.push(((alo, i), (blo, j)));
        }
        if i + len < ahi && j + len < bhi {
            queue.push(((i + len, ahi), (j + len, bhi)));
        }
    }
    total
}

/// Similarity of two strings in `[0, 1]`; two empty strings score 1.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}
