//! Topic keywords of a set of reports.
pub mod lda;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::{ProcessingParameters, VectParameters},
    vectorizer::{
        analyzer::Analyzer, build_corpus, token::TokenFrequency, DocumentTermMatrix,
        FittedVectorizer, Weighting,
    },
};

use lda::LatentDirichletAllocation;

/// Why a topic model cannot be fitted on a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("empty vocabulary; perhaps the documents only contain stop words")]
    EmptyVocabulary,

    #[error("max_df corresponds to < documents than min_df")]
    InvalidDocFrequency,

    #[error("after pruning, no terms remain. Try a lower min_df or a higher max_df.")]
    NoTermsRemain,
}

/// Count vectorizer of the topic text, pruned by document frequency.
pub fn vectorize_corpus<T>(
    docs: &[T],
    params: &VectParameters,
) -> Result<(FittedVectorizer, DocumentTermMatrix), TopicError>
where
    T: AsRef<str> + Sync,
{
    let analyzer = Analyzer {
        lowercase: params.lowercase,
        strip_accents: params.strip_accents,
        ngram_range: (params.ngram_range.min, params.ngram_range.max),
    };
    let corpus = build_corpus(&analyzer, docs);
    if corpus.vocab_size() == 0 {
        return Err(TopicError::EmptyVocabulary);
    }
    let n_docs = corpus.get_doc_num() as usize;
    if params.max_df.resolve(n_docs) < params.min_df.resolve(n_docs) {
        return Err(TopicError::InvalidDocFrequency);
    }
    let terms = corpus.pruned_terms(params.min_df, params.max_df);
    if terms.is_empty() {
        return Err(TopicError::NoTermsRemain);
    }
    let vectorizer = FittedVectorizer::from_corpus(analyzer, Weighting::RawCount, &corpus, terms);
    let dt_matrix = vectorizer.transform_all(docs);
    Ok((vectorizer, dt_matrix))
}

/// Fit an LDA on `docs` and return the `n_top_words` heaviest terms of every
/// topic.
pub fn try_extract_topics<T>(
    docs: &[T],
    params: &ProcessingParameters,
    n_top_words: usize,
) -> Result<Vec<Vec<String>>, TopicError>
where
    T: AsRef<str> + Sync,
{
    info!(docs = docs.len(), "vectorizing corpus");
    let (vectorizer, dt_matrix) = vectorize_corpus(docs, &params.vect_parameters)?;
    let model = LatentDirichletAllocation::new(&params.lda_parameters).fit(&dt_matrix);
    let feature_names = vectorizer.feature_names();
    Ok(model
        .top_word_indices(n_top_words)
        .into_iter()
        .map(|idx| idx.into_iter().map(|i| feature_names[i].to_string()).collect())
        .collect())
}

/// The `n_top_words` most frequent terms across `docs`.
pub fn top_words_corpus<T>(docs: &[T], n_top_words: usize) -> Vec<String>
where
    T: AsRef<str>,
{
    let analyzer = Analyzer::default();
    let mut freq = TokenFrequency::new();
    for doc in docs {
        freq.add_tokens_from_freq(&analyzer.frequency(doc.as_ref()));
    }
    freq.most_frequent_tokens(n_top_words)
}

/// `try_extract_topics`, or a single pseudo-topic of the most frequent terms
/// when no model can be fitted. Never fails.
pub fn extract_topics<T>(
    docs: &[T],
    params: &ProcessingParameters,
    n_top_words: usize,
) -> Vec<Vec<String>>
where
    T: AsRef<str> + Sync,
{
    match try_extract_topics(docs, params, n_top_words) {
        Ok(topics) => topics,
        Err(e) => {
            warn!(error = %e, "topic model not fittable, using the most frequent words");
            vec![top_words_corpus(docs, n_top_words)]
        }
    }
}
