//! Sparse term-weight vectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sparse vector over vocabulary columns. Indices are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Build from a column → weight map; zero weights are skipped.
    pub fn from_weights(weights: &BTreeMap<u32, f32>) -> Self {
        let mut indices = Vec::with_capacity(weights.len());
        let mut values = Vec::with_capacity(weights.len());
        for (&col, &w) in weights {
            if w != 0.0 {
                indices.push(col);
                values.push(w);
            }
        }
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit L2 norm. The zero vector is left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 1e-12 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Dot product by merging the two sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; 0 when either vector is zero.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom < 1e-12 {
            return 0.0;
        }
        self.dot(other) / denom
    }

    /// Check the shape invariants against a vocabulary of `dim` columns.
    pub fn check(&self, dim: usize) -> Result<(), String> {
        if self.indices.len() != self.values.len() {
            return Err(format!(
                "{} indices but {} values",
                self.indices.len(),
                self.values.len()
            ));
        }
        if self.indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err("indices are not strictly increasing".into());
        }
        if let Some(&last) = self.indices.last() {
            if last as usize >= dim {
                return Err(format!("column {last} outside vocabulary of {dim}"));
            }
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err("non-finite weight".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(pairs: &[(u32, f32)]) -> SparseVector {
        SparseVector::from_weights(&pairs.iter().copied().collect())
    }

    #[test]
    fn test_dot_disjoint_and_shared() {
        let a = vec_of(&[(0, 1.0), (3, 2.0)]);
        let b = vec_of(&[(1, 5.0), (3, 0.5)]);
        assert!((a.dot(&b) - 1.0).abs() < 1e-6);
        assert_eq!(a.dot(&vec_of(&[(2, 1.0)])), 0.0);
    }

    #[test]
    fn test_normalize_and_cosine() {
        let mut a = vec_of(&[(0, 3.0), (1, 4.0)]);
        a.normalize();
        assert!((a.norm() - 1.0).abs() < 1e-6);
        assert!((a.cosine(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector() {
        let mut z = SparseVector::default();
        z.normalize();
        assert!(z.is_zero());
        assert_eq!(z.cosine(&vec_of(&[(0, 1.0)])), 0.0);
    }

    #[test]
    fn test_check_rejects_bad_shapes() {
        assert!(vec_of(&[(0, 1.0), (4, 1.0)]).check(5).is_ok());
        assert!(vec_of(&[(5, 1.0)]).check(5).is_err());
        let unsorted = SparseVector {
            indices: vec![2, 1],
            values: vec![1.0, 1.0],
        };
        assert!(unsorted.check(5).is_err());
        let ragged = SparseVector {
            indices: vec![1],
            values: vec![],
        };
        assert!(ragged.check(5).is_err());
    }
}
