//! Lexical similarity primitives: a small TF-IDF vectorizer fitted at
//! training time and persisted with the model artifacts, plus the token-set
//! fallback used when no fitted vectorizer is available.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// TF-IDF vectorizer over a fixed vocabulary. Fitted once during training,
/// read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Builds the vocabulary and smoothed IDF table from a document corpus.
    pub fn fit(documents: &[String]) -> Self {
        let mut vocabulary = BTreeMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens: BTreeSet<String> = tokenize(doc).into_iter().collect();
            for token in tokens {
                let next_id = vocabulary.len();
                vocabulary.entry(token.clone()).or_insert(next_id);
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut idf = vec![0.0; vocabulary.len()];
        for (token, &index) in &vocabulary {
            let df = document_frequency.get(token).copied().unwrap_or(0) as f64;
            idf[index] = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
        }

        Self { vocabulary, idf }
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Maps text onto the fitted vocabulary. Out-of-vocabulary tokens are
    /// dropped; the result has one dimension per vocabulary term.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vector;
        }
        let total = tokens.len() as f64;
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(&token) {
                vector[index] += 1.0;
            }
        }
        for (index, value) in vector.iter_mut().enumerate() {
            *value = (*value / total) * self.idf[index];
        }
        vector
    }
}

/// Cosine similarity between two dense vectors. Zero when either has no
/// magnitude or the lengths disagree.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Jaccard similarity over token sets. The no-vectorizer fallback for the
/// text-similarity feature.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tokens_b: BTreeSet<String> = tokenize(b).into_iter().collect();
    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count() as f64;
    let union = tokens_a.union(&tokens_b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Lowercase alphanumeric tokens, single-character tokens dropped.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "senior rust engineer building distributed systems".to_string(),
            "python django developer with postgres experience".to_string(),
            "frontend react engineer".to_string(),
        ]
    }

    #[test]
    fn test_identical_documents_have_cosine_one() {
        let vectorizer = TfIdfVectorizer::fit(&corpus());
        let a = vectorizer.transform("rust engineer distributed systems");
        let b = vectorizer.transform("rust engineer distributed systems");
        let sim = cosine_similarity(&a, &b);
        assert!((sim - 1.0).abs() < 1e-9, "similarity was {sim}");
    }

    #[test]
    fn test_disjoint_documents_have_cosine_zero() {
        let vectorizer = TfIdfVectorizer::fit(&corpus());
        let a = vectorizer.transform("rust distributed");
        let b = vectorizer.transform("python django");
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_out_of_vocabulary_text_transforms_to_zero_vector() {
        let vectorizer = TfIdfVectorizer::fit(&corpus());
        let v = vectorizer.transform("zig erlang haskell");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_unfitted_vectorizer_reports_unfitted() {
        assert!(!TfIdfVectorizer::default().is_fitted());
        assert!(TfIdfVectorizer::fit(&corpus()).is_fitted());
    }

    #[test]
    fn test_token_set_similarity_partial_overlap() {
        // {rust, engineer} vs {rust, developer}: 1 shared of 3 total.
        let sim = token_set_similarity("Rust engineer", "rust developer");
        assert!((sim - 1.0 / 3.0).abs() < 1e-9, "similarity was {sim}");
    }

    #[test]
    fn test_token_set_similarity_empty_inputs() {
        assert_eq!(token_set_similarity("", ""), 0.0);
        assert_eq!(token_set_similarity("rust", ""), 0.0);
    }

    #[test]
    fn test_serde_round_trip_preserves_transform() {
        let vectorizer = TfIdfVectorizer::fit(&corpus());
        let json = serde_json::to_string(&vectorizer).unwrap();
        let restored: TfIdfVectorizer = serde_json::from_str(&json).unwrap();
        let text = "senior rust engineer";
        assert_eq!(vectorizer.transform(text), restored.transform(text));
    }
}
