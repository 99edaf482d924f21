//! Content vectorization
//!
//! Turns each catalog record into a weighted text document, fits a TF-IDF model
//! over the whole corpus and produces one unit-length sparse vector per record.
//!
//! Field weighting works by repetition: a field with weight 3 appears three times
//! in the document, which triples its raw term frequency before IDF is applied.
//!
//! IDF is smoothed, `ln((1 + n) / (1 + df)) + 1`, so a term present in every
//! document still keeps a weight of 1.

use std::collections::{BTreeMap, BTreeSet};

use tracing::instrument;

use crate::{
    catalog::Catalog,
    models::{MovieRecord, RowIndex},
    services::stopwords::StopWords,
};

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 10_000;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("cannot fit a content model on an empty catalog")]
    EmptyCorpus,

    #[error("all {documents} documents are empty after stop-word removal")]
    DegenerateVocabulary { documents: usize },

    #[error("model covers {model} rows but the catalog has {catalog}")]
    RowCountMismatch { model: usize, catalog: usize },

    #[error("model build was aborted: {0}")]
    Aborted(String),
}

/// How many times each field is repeated in a record's document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureWeights {
    pub overview: usize,
    pub keywords: usize,
    pub genres: usize,
    pub title: usize,
}

impl FeatureWeights {
    pub const fn full() -> Self {
        Self {
            overview: 3,
            keywords: 3,
            genres: 3,
            title: 1,
        }
    }

    pub const fn balanced() -> Self {
        Self {
            overview: 2,
            keywords: 2,
            genres: 2,
            title: 1,
        }
    }

    /// Degraded mode: overview text only
    pub const fn overview_only() -> Self {
        Self {
            overview: 1,
            keywords: 0,
            genres: 0,
            title: 0,
        }
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerParams {
    pub weights: FeatureWeights,
    /// `None` keeps every observed term
    pub max_features: Option<usize>,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            weights: FeatureWeights::default(),
            max_features: Some(DEFAULT_MAX_FEATURES),
        }
    }
}

/// Builds the weighted text document for one record. Absent fields count as empty.
pub fn build_document(record: &MovieRecord, weights: &FeatureWeights) -> String {
    let fields = [
        (record.overview.as_deref(), weights.overview),
        (record.keywords.as_deref(), weights.keywords),
        (record.genres.as_deref(), weights.genres),
        (record.title.as_deref(), weights.title),
    ];

    let mut document = String::new();
    for (text, repeat) in fields {
        let text = text.unwrap_or_default();
        for _ in 0..repeat {
            document.push_str(text);
            document.push(' ');
        }
    }
    document
}

/// Lower-cases, splits into word tokens of two or more characters, drops stop words
pub fn tokenize(text: &str, stop_words: &StopWords) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !stop_words.contains(token))
        .map(str::to_string)
        .collect()
}

/// Sparse vector over the vocabulary, entries sorted by term id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    entries: Vec<(u32, f64)>,
}

impl FeatureVector {
    fn normalized(mut entries: Vec<(u32, f64)>) -> Self {
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in entries.iter_mut() {
                *weight /= norm;
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product by merging the two sorted entry lists
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (mut a, mut b) = (self.entries.iter().peekable(), other.entries.iter().peekable());
        let mut sum = 0.0;

        while let (Some(&&(ta, wa)), Some(&&(tb, wb))) = (a.peek(), b.peek()) {
            match ta.cmp(&tb) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    a.next();
                    b.next();
                }
            }
        }

        sum
    }
}

/// Fitted term set with IDF weights. Term ids follow alphabetical order.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    terms: BTreeMap<String, u32>,
    idf: Vec<f64>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term_id(&self, term: &str) -> Option<u32> {
        self.terms.get(term).copied()
    }

    pub fn idf(&self, term_id: u32) -> f64 {
        self.idf[term_id as usize]
    }
}

/// Vocabulary plus one feature vector per catalog row
#[derive(Debug, Clone)]
pub struct VectorSpaceModel {
    vocabulary: Vocabulary,
    vectors: Vec<FeatureVector>,
}

impl VectorSpaceModel {
    /// Fits the model over every record in `catalog`
    #[instrument(skip_all, fields(movies = catalog.len()))]
    pub fn fit(catalog: &Catalog, params: &VectorizerParams) -> Result<Self, ModelError> {
        if catalog.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }

        let stop_words = StopWords::english();
        let documents: Vec<Vec<String>> = catalog
            .records()
            .iter()
            .map(|record| tokenize(&build_document(record, &params.weights), &stop_words))
            .collect();

        let vocabulary = fit_vocabulary(&documents, params.max_features)?;

        let vectors: Vec<FeatureVector> = documents
            .iter()
            .map(|tokens| weigh(tokens, &vocabulary))
            .collect();

        let empty_vectors = vectors.iter().filter(|v| v.is_empty()).count();
        if empty_vectors > 0 {
            tracing::warn!(
                count = empty_vectors,
                "Some movies have no vocabulary terms and only match themselves"
            );
        }

        tracing::info!(
            vocabulary = vocabulary.len(),
            max_features = ?params.max_features,
            "Fitted TF-IDF model"
        );

        Ok(Self { vocabulary, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vector(&self, row: RowIndex) -> &FeatureVector {
        &self.vectors[row.get()]
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }
}

fn fit_vocabulary(
    documents: &[Vec<String>],
    max_features: Option<usize>,
) -> Result<Vocabulary, ModelError> {
    let mut term_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();

    for tokens in documents {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for token in tokens {
            *term_counts.entry(token.as_str()).or_insert(0) += 1;
            if seen.insert(token.as_str()) {
                *doc_freq.entry(token.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut kept: Vec<&str> = term_counts.keys().copied().collect();
    if let Some(cap) = max_features {
        if kept.len() > cap {
            // most frequent first, alphabetical among equals
            kept.sort_by(|a, b| term_counts[b].cmp(&term_counts[a]).then_with(|| a.cmp(b)));
            kept.truncate(cap);
            kept.sort_unstable();
        }
    }

    if kept.is_empty() {
        return Err(ModelError::DegenerateVocabulary {
            documents: documents.len(),
        });
    }

    let n = documents.len() as f64;
    let mut terms = BTreeMap::new();
    let mut idf = Vec::with_capacity(kept.len());
    for (id, term) in kept.into_iter().enumerate() {
        let df = doc_freq[term] as f64;
        idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
        terms.insert(term.to_string(), id as u32);
    }

    Ok(Vocabulary { terms, idf })
}

fn weigh(tokens: &[String], vocabulary: &Vocabulary) -> FeatureVector {
    let mut tf: BTreeMap<u32, usize> = BTreeMap::new();
    for token in tokens {
        if let Some(id) = vocabulary.term_id(token) {
            *tf.entry(id).or_insert(0) += 1;
        }
    }

    let entries = tf
        .into_iter()
        .map(|(id, count)| (id, count as f64 * vocabulary.idf(id)))
        .collect();

    FeatureVector::normalized(entries)
}
