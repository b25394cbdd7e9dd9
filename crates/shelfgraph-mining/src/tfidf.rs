//! Statistical term weighting (TF-IDF).
//!
//! Document frequencies are computed once over the whole corpus (one
//! document = one book's combined comment text) before the parallel phase;
//! workers only read the finished table. Terms unseen at table-build time
//! take the median IDF, so a fresh term is neither free nor punitive.

use ahash::{AHashMap, AHashSet};

/// Corpus-level inverse document frequencies with a median fallback.
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    idf: AHashMap<String, f64>,
    median: f64,
}

impl IdfTable {
    /// Build from per-document distinct-term sets.
    pub fn from_documents<'a>(docs: impl Iterator<Item = &'a AHashSet<String>>) -> Self {
        let mut df: AHashMap<String, usize> = AHashMap::new();
        let mut n_docs = 0usize;
        for terms in docs {
            n_docs += 1;
            for term in terms {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let idf: AHashMap<String, f64> = df
            .into_iter()
            .map(|(term, df)| {
                let idf = ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0;
                (term, idf)
            })
            .collect();

        let mut values: Vec<f64> = idf.values().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        let median = if values.is_empty() {
            1.0
        } else {
            values[values.len() / 2]
        };

        Self { idf, median }
    }

    pub fn get(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(self.median)
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }
}

/// TF-IDF pass: weight = (count / doc_len) × idf, top `top_k` terms,
/// weight-descending with a deterministic term tie-break.
pub fn extract(terms: &[String], idf: &IdfTable, top_k: usize) -> Vec<(String, f64)> {
    if terms.is_empty() {
        return Vec::new();
    }

    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }

    let total = terms.len() as f64;
    let mut weighted: Vec<(String, f64)> = counts
        .into_iter()
        .map(|(term, count)| {
            let tf = count as f64 / total;
            (term.to_string(), tf * idf.get(term))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    weighted.truncate(top_k);
    weighted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn set(words: &[&str]) -> AHashSet<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn rarer_terms_get_higher_idf() {
        let docs = [set(&["ship", "space"]), set(&["ship"]), set(&["ship"])];
        let idf = IdfTable::from_documents(docs.iter());
        assert!(idf.get("space") > idf.get("ship"));
    }

    #[test]
    fn unknown_terms_take_the_median() {
        let docs = [set(&["a", "b"]), set(&["a"])];
        let idf = IdfTable::from_documents(docs.iter());
        let known: Vec<f64> = vec![idf.get("a"), idf.get("b")];
        let unknown = idf.get("zzz");
        assert!(known.iter().any(|v| (*v - unknown).abs() < 1e-12));
    }

    #[test]
    fn extract_ranks_frequent_distinctive_terms_first() {
        let docs = [
            set(&["dragon", "ship"]),
            set(&["ship"]),
            set(&["ship"]),
            set(&["ship"]),
        ];
        let idf = IdfTable::from_documents(docs.iter());

        let terms: Vec<String> = ["dragon", "dragon", "ship"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let out = extract(&terms, &idf, 10);
        assert_eq!(out[0].0, "dragon");
        assert_eq!(out.len(), 2);

        // tf = 2/3 for dragon
        let expected = (2.0 / 3.0) * idf.get("dragon");
        assert_relative_eq!(out[0].1, expected, max_relative = 1e-12);
    }

    #[test]
    fn extract_truncates_and_breaks_ties_by_term() {
        let idf = IdfTable::default();
        let terms: Vec<String> = ["b", "a", "c"].iter().map(|s| (*s).to_string()).collect();
        let out = extract(&terms, &idf, 2);
        // Equal weights: lexicographic order decides.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, "a");
        assert_eq!(out[1].0, "b");
    }

    #[test]
    fn empty_input_yields_nothing() {
        let idf = IdfTable::default();
        assert!(extract(&[], &idf, 10).is_empty());
    }
}
