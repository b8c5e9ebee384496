use std::collections::{HashMap, HashSet};

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tokenizers::{
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, SplitDelimiterBehavior,
};

use super::error::InferenceError;
use super::normalize::is_separator;
use super::utils::{l1_normalize, l2_normalize};
use super::Vectorizer;

/// Row normalization applied after tf-idf weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_min_token_len() -> usize {
    2
}

/// A fitted TF-IDF vectorizer, deserialized from JSON.
///
/// The on-disk layout mirrors what a fitted scikit-learn `TfidfVectorizer`
/// exposes (`vocabulary_`, `idf_`, `ngram_range`, `sublinear_tf`, `norm`), so
/// exporting one is a matter of dumping those attributes:
///
/// ```json
/// {
///   "vocabulary": {"hate": 0, "love": 1},
///   "idf": [1.69, 1.29],
///   "ngram_range": [1, 2],
///   "min_token_len": 2,
///   "sublinear_tf": false,
///   "norm": "l2"
/// }
/// ```
///
/// Tokens are whitespace-separated words of at least `min_token_len`
/// characters, which matches scikit-learn's default token pattern once the
/// text has gone through [`normalize`](super::normalize).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f32>>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default = "default_min_token_len")]
    min_token_len: usize,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
}

impl TfidfVectorizer {
    /// Creates a unigram vectorizer with l2 normalization.
    pub fn new(vocabulary: HashMap<String, usize>, idf: Option<Vec<f32>>) -> Self {
        Self {
            vocabulary,
            idf,
            ngram_range: default_ngram_range(),
            min_token_len: default_min_token_len(),
            sublinear_tf: false,
            norm: Norm::default(),
        }
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    /// Parses and validates a serialized vectorizer.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        let vectorizer: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    /// Checks the structural invariants a fitted vectorizer must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.vocabulary.len();
        if n == 0 {
            return Err("vocabulary is empty".into());
        }

        let mut seen = HashSet::with_capacity(n);
        for (term, &idx) in &self.vocabulary {
            if idx >= n {
                return Err(format!("term '{}' has index {} outside 0..{}", term, idx, n));
            }
            if !seen.insert(idx) {
                return Err(format!("index {} is assigned to more than one term", idx));
            }
        }

        if let Some(idf) = &self.idf {
            if idf.len() != n {
                return Err(format!("idf has {} weights for {} terms", idf.len(), n));
            }
            if idf.iter().any(|w| !w.is_finite()) {
                return Err("idf contains non-finite weights".into());
            }
        }

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({}, {})", min_n, max_n));
        }
        if self.min_token_len == 0 {
            return Err("min_token_len must be at least 1".into());
        }
        Ok(())
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, InferenceError> {
        let mut pretokenized = PreTokenizedString::from(text);
        SeparatorSplit
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| InferenceError::Vectorization(e.to_string()))?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(token, _, _)| token)
            .filter(|token| token.chars().count() >= self.min_token_len)
            .map(str::to_owned)
            .collect())
    }

    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

/// Splits on the same boundaries the normalizer keeps.
struct SeparatorSplit;

impl PreTokenizer for SeparatorSplit {
    fn pre_tokenize(&self, pretokenized: &mut PreTokenizedString) -> tokenizers::Result<()> {
        pretokenized.split(|_, normalized| {
            normalized.split(is_separator, SplitDelimiterBehavior::Removed)
        })
    }
}

impl Vectorizer for TfidfVectorizer {
    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    fn transform(&self, text: &str) -> Result<Array2<f32>, InferenceError> {
        let tokens = self.tokenize(text)?;

        let mut tf = Array1::<f32>::zeros(self.n_features());
        for term in self.ngrams(&tokens) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                tf[idx] += 1.0;
            }
        }

        if self.sublinear_tf {
            tf.mapv_inplace(|c| if c > 0.0 { 1.0 + c.ln() } else { 0.0 });
        }
        if let Some(idf) = &self.idf {
            for (t, w) in tf.iter_mut().zip(idf) {
                *t *= w;
            }
        }

        let weighted = match self.norm {
            Norm::L2 => l2_normalize(&tf),
            Norm::L1 => l1_normalize(&tf),
            Norm::None => tf,
        };
        Ok(weighted.insert_axis(Axis(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> HashMap<String, usize> {
        terms.iter().enumerate().map(|(i, t)| (t.to_string(), i)).collect()
    }

    #[test]
    fn test_transform_single_row() {
        let v = TfidfVectorizer::new(vocab(&["hate", "love"]), None);
        let x = v.transform("i hate this").unwrap();
        assert_eq!(x.shape(), &[1, 2]);
        assert!((x[[0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(x[[0, 1]], 0.0);
    }

    #[test]
    fn test_short_tokens_ignored() {
        let v = TfidfVectorizer::new(vocab(&["i", "am"]), None);
        let x = v.transform("i am").unwrap();
        assert_eq!(x[[0, 0]], 0.0);
        assert!((x[[0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_information_separators_split_words() {
        let v = TfidfVectorizer::new(vocab(&["hate", "you"]), None).with_norm(Norm::None);
        let x = v.transform("hate\u{1f}you").unwrap();
        assert_eq!(x.row(0).to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_empty_text_gives_zero_row() {
        let v = TfidfVectorizer::new(vocab(&["hate"]), Some(vec![2.0]));
        let x = v.transform("").unwrap();
        assert_eq!(x.shape(), &[1, 1]);
        assert_eq!(x[[0, 0]], 0.0);
    }

    #[test]
    fn test_idf_weighting_and_bigrams() {
        let v = TfidfVectorizer::new(vocab(&["hate", "you", "hate you"]), Some(vec![1.0, 1.0, 2.0]))
            .with_ngram_range(1, 2)
            .with_norm(Norm::None);
        let x = v.transform("hate you").unwrap();
        assert_eq!(x.row(0).to_vec(), vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_sublinear_tf() {
        let v = TfidfVectorizer::new(vocab(&["bad"]), None)
            .with_sublinear_tf(true)
            .with_norm(Norm::None);
        let x = v.transform("bad bad bad").unwrap();
        assert!((x[[0, 0]] - (1.0 + 3f32.ln())).abs() < 1e-6);
    }

    #[test]
    fn test_from_json_defaults() {
        let v = TfidfVectorizer::from_json_slice(br#"{"vocabulary": {"hate": 0}}"#).unwrap();
        assert_eq!(v.n_features(), 1);
        assert_eq!(v.ngram_range, (1, 1));
        assert_eq!(v.min_token_len, 2);
        assert_eq!(v.norm, Norm::L2);
    }

    #[test]
    fn test_validation_rejects_bad_artifacts() {
        assert!(TfidfVectorizer::from_json_slice(b"not json").is_err());
        assert!(TfidfVectorizer::from_json_slice(br#"{"vocabulary": {}}"#).is_err());
        assert!(TfidfVectorizer::from_json_slice(br#"{"vocabulary": {"a": 0, "b": 0}}"#).is_err());
        assert!(TfidfVectorizer::from_json_slice(br#"{"vocabulary": {"a": 3}}"#).is_err());
        assert!(TfidfVectorizer::from_json_slice(br#"{"vocabulary": {"a": 0}, "idf": [1.0, 2.0]}"#).is_err());
        assert!(TfidfVectorizer::from_json_slice(br#"{"vocabulary": {"a": 0}, "ngram_range": [2, 1]}"#).is_err());
    }
}
