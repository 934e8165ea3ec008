//! TF-IDF text vectors.
//!
//! Titles and descriptions are turned into fixed-width vectors with the
//! usual smoothed TF-IDF scheme:
//!
//! - tokens are runs of two or more word characters, lowercased;
//! - the vocabulary keeps the `max_features` terms with the highest corpus
//!   frequency (ties broken alphabetically) and orders its columns
//!   alphabetically;
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1`;
//! - each row is raw counts times idf, L2-normalised.
//!
//! # Example
//!
//! ```
//! use cutrate::TfidfVectorizer;
//!
//! let docs = ["red fox jumps", "lazy red dog"];
//! let model = TfidfVectorizer::new(10).fit(&docs);
//! assert_eq!(model.vocabulary(), ["dog", "fox", "jumps", "lazy", "red"]);
//!
//! let row = model.transform("red red fox");
//! let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
//! assert!((norm - 1.0).abs() < 1e-9);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Split `document` into lowercase tokens of two or more word characters.
///
/// ```
/// assert_eq!(cutrate::tfidf::tokenize("A Día in L.A."), ["día", "in"]);
/// ```
pub fn tokenize(document: &str) -> Vec<String> {
    let lowered = document.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Fits a [`TfidfModel`] on a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl TfidfVectorizer {
    /// Vectorizer keeping at most `max_features` terms.
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Learn the vocabulary and idf weights of `documents`.
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> TfidfModel {
        let mut term_frequency: BTreeMap<String, u64> = BTreeMap::new();
        let mut document_frequency: HashMap<String, u64> = HashMap::new();

        for document in documents {
            let tokens = tokenize(document.as_ref());
            let mut seen = HashSet::new();
            for token in tokens {
                if seen.insert(token.clone()) {
                    *document_frequency.entry(token.clone()).or_default() += 1;
                }
                *term_frequency.entry(token).or_default() += 1;
            }
        }

        // BTreeMap iteration is alphabetical and the sort is stable, so
        // equal frequencies keep alphabetical order.
        let mut ranked: Vec<(String, u64)> = term_frequency.into_iter().collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        let document_count = documents.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + document_count) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();

        log::debug!(
            "Fitted TF-IDF vocabulary of {} term(s) over {} document(s)",
            vocabulary.len(),
            documents.len()
        );

        TfidfModel {
            vocabulary,
            index,
            idf,
        }
    }

    /// Fit on `documents` and transform each of them.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> (TfidfModel, Vec<Vec<f64>>) {
        let model = self.fit(documents);
        let rows = documents
            .iter()
            .map(|document| model.transform(document.as_ref()))
            .collect();
        (model, rows)
    }
}

/// A fitted vocabulary with idf weights.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfModel {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Terms in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Idf weight per column.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// L2-normalised TF-IDF vector of `document`.
    ///
    /// Out-of-vocabulary tokens are ignored; a document with none of the
    /// vocabulary's terms maps to the zero vector.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in tokenize(document) {
            if let Some(&column) = self.index.get(&token) {
                row[column] += 1.0;
            }
        }

        for (value, weight) in row.iter_mut().zip(&self.idf) {
            *value *= weight;
        }

        let norm = row.iter().map(|value| value * value).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }
        row
    }

    /// [`transform`](Self::transform), zero-padded to at least `width`
    /// columns.
    pub fn transform_padded(&self, document: &str, width: usize) -> Vec<f64> {
        let mut row = self.transform(document);
        if row.len() < width {
            row.resize(width, 0.0);
        }
        row
    }
}
