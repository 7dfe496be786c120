//! Immutable TF-IDF vector index over one document's chunks.
//!
//! Weighting follows the smoothed scheme: `idf = ln((1 + n) / (1 + df)) + 1`,
//! chunk vectors are raw term counts times idf, L2-normalised. Queries are
//! projected with the same frozen vocabulary and idf; unknown terms are dropped.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::sparse::SparseVector;
use crate::tokenize::tokenize;
use docqa_core::{Error, Result};

/// A retrieved chunk with its similarity and original position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk_index: usize,
    pub score: f32,
    pub text: String,
}

/// Vocabulary, idf weights, chunk vectors and chunk texts, fixed at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
    chunk_vectors: Vec<SparseVector>,
    chunk_texts: Vec<String>,
}

impl VectorIndex {
    /// Fit vocabulary and idf on `chunks` and vectorize every chunk.
    pub fn build<I, S>(chunks: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunk_texts: Vec<String> = chunks.into_iter().map(Into::into).collect();
        if chunk_texts.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let term_counts: Vec<HashMap<String, u32>> =
            chunk_texts.iter().map(|t| count_terms(t)).collect();

        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        // Columns follow lexicographic term order.
        let n = chunk_texts.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (col, (term, df)) in doc_freq.iter().enumerate() {
            vocabulary.insert((*term).to_string(), col as u32);
            idf.push(((1.0 + n) / (1.0 + *df as f32)).ln() + 1.0);
        }

        let chunk_vectors: Vec<SparseVector> = term_counts
            .iter()
            .map(|counts| weigh(counts, &vocabulary, &idf))
            .collect();

        debug!(
            "Built TF-IDF index: {} chunks, {} terms, {} non-zero weights",
            chunk_texts.len(),
            vocabulary.len(),
            chunk_vectors.iter().map(SparseVector::nnz).sum::<usize>()
        );

        Ok(Self {
            vocabulary,
            idf,
            chunk_vectors,
            chunk_texts,
        })
    }

    /// Reassemble an index from persisted parts, checking every shape invariant.
    pub(crate) fn from_parts(
        vocabulary: BTreeMap<String, u32>,
        idf: Vec<f32>,
        chunk_vectors: Vec<SparseVector>,
        chunk_texts: Vec<String>,
    ) -> std::result::Result<Self, String> {
        if chunk_texts.is_empty() {
            return Err("index holds no chunks".into());
        }
        if chunk_vectors.len() != chunk_texts.len() {
            return Err(format!(
                "{} chunk vectors for {} chunk texts",
                chunk_vectors.len(),
                chunk_texts.len()
            ));
        }
        let dim = vocabulary.len();
        if idf.len() != dim {
            return Err(format!("{} idf weights for {} terms", idf.len(), dim));
        }
        let mut seen = vec![false; dim];
        for (term, &col) in &vocabulary {
            match seen.get_mut(col as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(format!("term {term:?} has invalid column {col}")),
            }
        }
        if idf.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("idf weights must be finite and non-negative".into());
        }
        for (i, v) in chunk_vectors.iter().enumerate() {
            v.check(dim).map_err(|e| format!("chunk vector {i}: {e}"))?;
        }
        Ok(Self {
            vocabulary,
            idf,
            chunk_vectors,
            chunk_texts,
        })
    }

    /// Project text onto the frozen vocabulary.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        weigh(&count_terms(text), &self.vocabulary, &self.idf)
    }

    /// Rank all chunks by cosine similarity to `query`, keeping the best `top_k`.
    ///
    /// Equal scores keep chunk order, so an all-zero query returns the first
    /// `top_k` chunks.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }

        let query_vec = self.vectorize(query);
        if query_vec.is_zero() {
            debug!("Query has no indexed terms; falling back to chunk order");
        }

        let mut ranked: Vec<(usize, f32)> = self
            .chunk_vectors
            .iter()
            .map(|v| query_vec.cosine(v))
            .enumerate()
            .collect();
        // Stable sort: ties stay in chunk order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk_index: i,
                score,
                text: self.chunk_texts[i].clone(),
            })
            .collect())
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, u32> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    /// idf weight for a term, if it is in the vocabulary.
    pub fn idf_of(&self, term: &str) -> Option<f32> {
        self.vocabulary
            .get(term)
            .map(|&col| self.idf[col as usize])
    }

    pub fn chunk_vectors(&self) -> &[SparseVector] {
        &self.chunk_vectors
    }

    pub fn chunk_texts(&self) -> &[String] {
        &self.chunk_texts
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunk_texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_texts.is_empty()
    }
}

fn count_terms(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for term in tokenize(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn weigh(
    counts: &HashMap<String, u32>,
    vocabulary: &BTreeMap<String, u32>,
    idf: &[f32],
) -> SparseVector {
    let weights: BTreeMap<u32, f32> = counts
        .iter()
        .filter_map(|(term, &tf)| {
            vocabulary
                .get(term)
                .map(|&col| (col, tf as f32 * idf[col as usize]))
        })
        .collect();
    let mut v = SparseVector::from_weights(&weights);
    v.normalize();
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pets() -> VectorIndex {
        VectorIndex::build(["the cat sat", "the dog ran", "cats and dogs play"]).unwrap()
    }

    #[test]
    fn test_exact_term_ranks_first() {
        let index = pets();
        let hits = index.search("cat", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_index, 0);
        assert_eq!(hits[0].text, "the cat sat");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_empty_corpus() {
        let err = VectorIndex::build(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }

    #[test]
    fn test_vocabulary_is_sorted_and_dense() {
        let index = pets();
        let terms: Vec<&str> = index.vocabulary().keys().map(String::as_str).collect();
        assert_eq!(
            terms,
            vec!["and", "cat", "cats", "dog", "dogs", "play", "ran", "sat", "the"]
        );
        let cols: Vec<u32> = index.vocabulary().values().copied().collect();
        assert_eq!(cols, (0..9).collect::<Vec<u32>>());
        assert_eq!(index.idf().len(), 9);
    }

    #[test]
    fn test_idf_decreases_with_document_frequency() {
        let index = VectorIndex::build(["alpha beta", "alpha gamma", "alpha delta"]).unwrap();
        let everywhere = index.idf_of("alpha").unwrap();
        let once = index.idf_of("beta").unwrap();
        assert!(everywhere.is_finite() && everywhere > 0.0);
        assert!(once > everywhere);
        assert!((everywhere - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_chunk_vectors_are_unit_length() {
        let index = pets();
        for v in index.chunk_vectors() {
            assert!((v.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_results_sorted_and_bounded() {
        let index = pets();
        let hits = index.search("the dog", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_index, 1);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_k_larger_than_corpus_returns_everything() {
        let index = VectorIndex::build(["same words", "same words", "same words"]).unwrap();
        let hits = index.search("same", 10).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_unknown_terms_fall_back_to_chunk_order() {
        let index = pets();
        let hits = index.search("zebra quantum", 2).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.chunk_index).collect();
        assert_eq!(order, vec![0, 1]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn test_ties_keep_chunk_order() {
        let index =
            VectorIndex::build(["red apple", "green pear", "red apple", "blue plum"]).unwrap();
        let hits = index.search("apple", 2).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.chunk_index).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        assert!(matches!(
            pets().search("cat", 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_chunk_vectors_store_one_weight_per_distinct_term() {
        let index = VectorIndex::build(["the cat and the cat", "dog"]).unwrap();
        let nnz: Vec<usize> = index.chunk_vectors().iter().map(SparseVector::nnz).collect();
        assert_eq!(nnz, vec![3, 1]);
    }

    #[test]
    fn test_chunk_without_terms_has_zero_vector() {
        let index = VectorIndex::build(["!!", "real words here"]).unwrap();
        assert!(index.chunk_vectors()[0].is_zero());
        let hits = index.search("words", 2).unwrap();
        assert_eq!(hits[0].chunk_index, 1);
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_shapes() {
        let index = pets();
        let mut idf = index.idf().to_vec();
        idf.pop();
        let err = VectorIndex::from_parts(
            index.vocabulary().clone(),
            idf,
            index.chunk_vectors().to_vec(),
            index.chunk_texts().to_vec(),
        );
        assert!(err.is_err());

        let err = VectorIndex::from_parts(
            index.vocabulary().clone(),
            index.idf().to_vec(),
            index.chunk_vectors()[..2].to_vec(),
            index.chunk_texts().to_vec(),
        );
        assert!(err.is_err());
    }
}
