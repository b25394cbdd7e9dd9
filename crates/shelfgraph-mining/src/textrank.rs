//! Graph-based term weighting (TextRank).
//!
//! Builds an undirected weighted co-occurrence graph over the candidate
//! token sequence (sliding window), runs damped iterative rank over it, and
//! normalizes scores to the maximum. Dangling terms (no co-occurrence edge)
//! redistribute their mass uniformly.
//!
//! Nodes are dense indices in first-seen order and edges accumulate in a
//! sorted map, so the float arithmetic happens in a fixed order and scores
//! reproduce exactly run to run.

use ahash::AHashMap;
use std::collections::BTreeMap;

const WINDOW: usize = 5;
const DAMPING: f64 = 0.85;
const ITERATIONS: usize = 10;

/// Centrality pass over the co-occurrence graph, top `top_k` terms.
pub fn extract(terms: &[String], top_k: usize) -> Vec<(String, f64)> {
    if terms.is_empty() {
        return Vec::new();
    }

    // Dense node ids in first-seen order.
    let mut id_of: AHashMap<&str, usize> = AHashMap::new();
    let mut nodes: Vec<&str> = Vec::new();
    for term in terms {
        id_of.entry(term.as_str()).or_insert_with(|| {
            nodes.push(term.as_str());
            nodes.len() - 1
        });
    }
    let n = nodes.len();

    // Sliding-window co-occurrence, symmetric.
    let mut edge_weight: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, head) in terms.iter().enumerate() {
        let a = id_of[head.as_str()];
        for tail in terms.iter().skip(i + 1).take(WINDOW - 1) {
            let b = id_of[tail.as_str()];
            if a == b {
                continue;
            }
            *edge_weight.entry((a, b)).or_insert(0.0) += 1.0;
            *edge_weight.entry((b, a)).or_insert(0.0) += 1.0;
        }
    }

    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut out_weight: Vec<f64> = vec![0.0; n];
    for (&(a, b), &w) in &edge_weight {
        adjacency[a].push((b, w));
        out_weight[a] += w;
    }

    let mut scores: Vec<f64> = vec![1.0 / n as f64; n];
    for _ in 0..ITERATIONS {
        let mut next: Vec<f64> = vec![(1.0 - DAMPING) / n as f64; n];
        for a in 0..n {
            if out_weight[a] > 0.0 {
                for &(b, w) in &adjacency[a] {
                    next[b] += DAMPING * scores[a] * w / out_weight[a];
                }
            } else {
                // Dangling node: spread uniformly.
                let share = DAMPING * scores[a] / n as f64;
                for v in next.iter_mut() {
                    *v += share;
                }
            }
        }
        scores = next;
    }

    let max = scores.iter().fold(0.0f64, |acc, &v| acc.max(v));
    if max <= 0.0 {
        return Vec::new();
    }

    let mut ranked: Vec<(String, f64)> = nodes
        .iter()
        .zip(&scores)
        .map(|(&term, &score)| (term.to_string(), score / max))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn hub_term_ranks_first() {
        // "ship" co-occurs with everything; the satellites only with "ship".
        let seq = terms(&[
            "ship", "crew", "ship", "alien", "ship", "engine", "ship", "orbit",
        ]);
        let out = extract(&seq, 10);
        assert_eq!(out[0].0, "ship");
        // Normalized to the max.
        assert!((out[0].1 - 1.0).abs() < 1e-12);
        assert!(out.iter().all(|(_, w)| *w <= 1.0 + 1e-12));
    }

    #[test]
    fn scores_are_deterministic() {
        let seq = terms(&["a", "b", "c", "a", "c", "b", "d", "a"]);
        assert_eq!(extract(&seq, 10), extract(&seq, 10));
    }

    #[test]
    fn truncates_to_top_k() {
        let seq = terms(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(extract(&seq, 3).len(), 3);
    }

    #[test]
    fn empty_and_singleton_inputs() {
        assert!(extract(&[], 10).is_empty());
        // A single dangling term still gets a (normalized) score.
        let out = extract(&terms(&["alone"]), 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "alone");
    }
}
