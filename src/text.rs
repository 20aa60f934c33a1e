//! Text normalization and batch TF-IDF vectorization
//!
//! One model is fitted over the subject text plus every candidate text, so all
//! vectors share a vocabulary and weighting. The model lives only for the batch
//! it was built from.

use crate::scoring::cosine_similarity;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Vocabulary is capped to the most frequent terms
pub const MAX_FEATURES: usize = 200;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "may", "more", "most",
    "must", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "our", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "upon", "very", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "within", "without", "would", "you", "your",
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VectorizeError {
    #[error("empty corpus")]
    EmptyCorpus,
    #[error("no terms left after stop-word removal")]
    EmptyVocabulary,
}

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Lowercase and strip accents
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Alphanumeric tokens of two or more characters, stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    let stop_words = stop_words();
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| tok.chars().count() >= 2 && !stop_words.contains(tok))
        .map(str::to_string)
        .collect()
}

/// Unigrams followed by adjacent-token bigrams
pub fn terms(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let bigrams: Vec<String> = tokens
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect();
    let mut terms = tokens;
    terms.extend(bigrams);
    terms
}

/// Fitted vocabulary and inverse document frequencies
#[derive(Debug, Clone)]
pub struct TermModel {
    index: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TermModel {
    /// Fit over already-extracted term lists, one per document
    pub fn fit(docs: &[Vec<String>]) -> Result<Self, VectorizeError> {
        if docs.is_empty() {
            return Err(VectorizeError::EmptyCorpus);
        }

        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            let mut seen = HashSet::new();
            for term in doc {
                *corpus_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }
        if corpus_freq.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        // Most frequent first; ties alphabetical so the cut is deterministic
        let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(MAX_FEATURES);

        let n_docs = docs.len() as f32;
        let mut index = HashMap::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (i, (term, _)) in ranked.into_iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            index.insert(term.to_string(), i);
        }

        Ok(Self { index, idf })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized TF-IDF vector; all zeros when no term is in the vocabulary
    pub fn transform(&self, terms: &[String]) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.idf.len()];
        for term in terms {
            if let Some(&i) = self.index.get(term) {
                vec[i] += 1.0;
            }
        }
        for (v, idf) in vec.iter_mut().zip(&self.idf) {
            *v *= idf;
        }
        let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

/// Cosine similarity in [0, 1] of the subject text against every candidate text.
///
/// Fits one model over the whole batch before any score is computed.
pub fn batch_similarity(
    subject_text: &str,
    candidate_texts: &[String],
) -> Result<Vec<f32>, VectorizeError> {
    let mut docs = Vec::with_capacity(candidate_texts.len() + 1);
    docs.push(terms(subject_text));
    docs.extend(candidate_texts.iter().map(|t| terms(t)));

    let model = TermModel::fit(&docs)?;
    let subject_vec = model.transform(&docs[0]);

    Ok(docs[1..]
        .iter()
        .map(|doc| {
            let cand_vec = model.transform(doc);
            cosine_similarity(&subject_vec, &cand_vec).clamp(0.0, 1.0)
        })
        .collect())
}
