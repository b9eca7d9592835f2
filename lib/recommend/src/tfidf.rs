//! TF-IDF vector space over catalog function text.
//!
//! Term weighting follows the common smoothed formulation:
//! `idf = ln((1 + n) / (1 + df)) + 1` with raw term counts and
//! l2-normalized rows, so the cosine similarity of two vectors is their
//! sparse dot product.

use ahash::AHashMap;

/// English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just", "more", "most",
    "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
    "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Sparse term-weight pairs, sorted by term index.
pub type SparseVector = Vec<(usize, f32)>;

/// Tokenize text for indexing: lowercase, split on non-alphanumerics,
/// keep tokens of two or more characters, drop stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() > 1 && !STOP_WORDS.contains(s))
        .map(|s| s.to_string())
        .collect()
}

/// A fitted TF-IDF vectorizer: the vocabulary and per-term idf weights.
/// Immutable after fitting.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    vocabulary: AHashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfIdfVectorizer {
    /// Fit vocabulary and idf weights over the document collection.
    /// Vocabulary indices are assigned in sorted term order, so a fixed
    /// collection always yields the same vector space.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let total_docs = documents.len();
        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        for document in documents {
            let mut terms = tokenize(document.as_ref());
            terms.sort();
            terms.dedup();
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<String> = document_frequency.keys().cloned().collect();
        terms.sort();

        let mut vocabulary = AHashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, term) in terms.into_iter().enumerate() {
            let df = document_frequency[&term];
            let weight = ((1.0 + total_docs as f32) / (1.0 + df as f32)).ln() + 1.0;
            vocabulary.insert(term, index);
            idf.push(weight);
        }

        Self { vocabulary, idf }
    }

    /// Transform text into an l2-normalized sparse vector over the fitted
    /// vocabulary; out-of-vocabulary terms are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: AHashMap<usize, f32> = AHashMap::new();
        for term in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        vector.sort_by_key(|(index, _)| *index);

        let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut vector {
                *weight /= norm;
            }
        }
        vector
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Dot product of two sorted sparse vectors. With l2-normalized inputs
/// this is their cosine similarity.
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_normalizes() {
        assert_eq!(
            tokenize("Moisturizing, Anti-Dandruff & Shine!"),
            vec!["moisturizing", "anti", "dandruff", "shine"]
        );
        // Single characters and stop words are dropped.
        assert_eq!(tokenize("a B and the scalp"), vec!["scalp"]);
    }

    #[test]
    fn test_identical_text_has_unit_similarity() {
        let docs = ["moisture shine", "repair strength", "moisture repair"];
        let vectorizer = TfIdfVectorizer::fit(&docs);

        let a = vectorizer.transform("moisture shine");
        let b = vectorizer.transform("moisture shine");
        assert!((sparse_dot(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_disjoint_text_has_zero_similarity() {
        let docs = ["moisture shine", "repair strength"];
        let vectorizer = TfIdfVectorizer::fit(&docs);

        let a = vectorizer.transform("moisture shine");
        let b = vectorizer.transform("repair strength");
        assert_eq!(sparse_dot(&a, &b), 0.0);
    }

    #[test]
    fn test_out_of_vocabulary_terms_drop() {
        let docs = ["moisture shine"];
        let vectorizer = TfIdfVectorizer::fit(&docs);
        assert!(vectorizer.transform("unseen terms only").is_empty());
    }

    #[test]
    fn test_transform_is_deterministic() {
        let docs = ["moisture shine soft", "repair strength", "shine gloss"];
        let vectorizer = TfIdfVectorizer::fit(&docs);
        assert_eq!(
            vectorizer.transform("shine repair"),
            vectorizer.transform("shine repair")
        );
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let docs = ["moisture shine", "moisture repair", "moisture gloss"];
        let vectorizer = TfIdfVectorizer::fit(&docs);
        let vector = vectorizer.transform("moisture shine");
        // "shine" appears in one document, "moisture" in all three.
        let weights: AHashMap<usize, f32> = vector.into_iter().collect();
        let moisture = vectorizer.vocabulary["moisture"];
        let shine = vectorizer.vocabulary["shine"];
        assert!(weights[&shine] > weights[&moisture]);
    }
}
