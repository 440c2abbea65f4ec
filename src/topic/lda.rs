//! Latent Dirichlet Allocation fitted with variational Bayes.
//!
//! Batch mode runs one E-step over the whole corpus per iteration, online
//! mode updates the topics after every mini-batch. Both priors are
//! `1 / n_components`.
use std::time::Instant;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    config::{LdaParameters, LearningMethod},
    vectorizer::DocumentTermMatrix,
};

const EPS: f64 = f64::EPSILON;
const MAX_DOC_UPDATE_ITER: usize = 100;
const MEAN_CHANGE_TOL: f64 = 1e-3;
const BATCH_SIZE: usize = 128;
const LEARNING_OFFSET: f64 = 10.0;
const LEARNING_DECAY: f64 = 0.7;

/// ψ(x) for x > 0, by recurrence up to 6 then the asymptotic series.
pub fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0
            - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f * (1.0 / 132.0)))))
}

/// exp(E[log X]) for X ~ Dir(alpha)
fn exp_dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let psi_sum = digamma(alpha.iter().sum());
    alpha.iter().map(|&a| (digamma(a) - psi_sum).exp()).collect()
}

/// Non-zero entries of one document.
struct Doc {
    ids: Vec<usize>,
    cts: Vec<f64>,
}

impl Doc {
    fn from_matrix(dt_matrix: &DocumentTermMatrix) -> Vec<Doc> {
        dt_matrix
            .rows
            .iter()
            .map(|row| {
                let (ids, cts) = row.raw_iter().map(|(i, &c)| (i, c)).unzip();
                Doc { ids, cts }
            })
            .collect()
    }
}

/// Variational parameters of one document after its E-step.
struct DocUpdate {
    gamma: Vec<f64>,
    exp_doc_topic: Vec<f64>,
    /// `count / norm_phi` per stored word
    ratio: Vec<f64>,
}

/// Model settings. Fitting is a pure function of them and the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentDirichletAllocation {
    pub n_components: usize,
    pub max_iter: usize,
    pub evaluate_every: i64,
    pub perp_tol: f64,
    pub learning_method: LearningMethod,
    pub random_state: Option<u64>,
    pub batch_size: usize,
    pub learning_offset: f64,
    pub learning_decay: f64,
}

impl LatentDirichletAllocation {
    pub fn new(params: &LdaParameters) -> Self {
        Self {
            n_components: params.n_components,
            max_iter: params.max_iter,
            evaluate_every: params.evaluate_every,
            perp_tol: params.perp_tol,
            learning_method: params.learning_method,
            random_state: params.random_state,
            batch_size: BATCH_SIZE,
            learning_offset: LEARNING_OFFSET,
            learning_decay: LEARNING_DECAY,
        }
    }

    fn prior(&self) -> f64 {
        1.0 / self.n_components as f64
    }

    fn rng(&self) -> StdRng {
        match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn random_rows(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<Vec<f64>> {
        (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(0.9..1.1)).collect())
            .collect()
    }

    pub fn fit(&self, dt_matrix: &DocumentTermMatrix) -> FittedLda {
        let start = Instant::now();
        info!(
            docs = dt_matrix.n_rows(),
            terms = dt_matrix.n_cols,
            topics = self.n_components,
            method = ?self.learning_method,
            "training LDA"
        );
        let docs = Doc::from_matrix(dt_matrix);
        let mut rng = self.rng();
        let mut model = FittedLda {
            components: Self::random_rows(&mut rng, self.n_components, dt_matrix.n_cols),
            n_iter: 0,
            n_batch_iter: 1,
            doc_topic_prior: self.prior(),
        };
        let mut exp_dirichlet = model.exp_dirichlet_component();

        let mut last_bound: Option<f64> = None;
        for i in 0..self.max_iter {
            match self.learning_method {
                LearningMethod::Batch => {
                    self.em_step(&docs, docs.len(), &mut model, &mut exp_dirichlet, &mut rng, false);
                }
                LearningMethod::Online => {
                    for chunk in docs.chunks(self.batch_size.max(1)) {
                        self.em_step(chunk, docs.len(), &mut model, &mut exp_dirichlet, &mut rng, true);
                    }
                }
            }
            model.n_iter += 1;

            if self.evaluate_every > 0 && (i + 1) % self.evaluate_every as usize == 0 {
                let bound = model.perplexity_of(&docs, &exp_dirichlet);
                debug!(iteration = i + 1, perplexity = bound, "LDA evaluation");
                if let Some(last) = last_bound {
                    if (last - bound).abs() < self.perp_tol {
                        break;
                    }
                }
                last_bound = Some(bound);
            }
        }
        info!(
            iterations = model.n_iter,
            seconds = start.elapsed().as_secs_f64(),
            "LDA training time"
        );
        model
    }

    /// E-step over `docs` then the batch or online M-step.
    fn em_step(
        &self,
        docs: &[Doc],
        total_docs: usize,
        model: &mut FittedLda,
        exp_dirichlet: &mut Vec<Vec<f64>>,
        rng: &mut StdRng,
        online: bool,
    ) {
        let init = Self::random_rows(rng, docs.len(), self.n_components);
        let updates = e_step(docs, exp_dirichlet, init, model.doc_topic_prior);

        let n_topics = self.n_components;
        let n_terms = exp_dirichlet.first().map_or(0, Vec::len);
        let mut sstats = vec![vec![0.0; n_terms]; n_topics];
        for (doc, update) in docs.iter().zip(&updates) {
            for (j, &w) in doc.ids.iter().enumerate() {
                for k in 0..n_topics {
                    sstats[k][w] += update.exp_doc_topic[k] * update.ratio[j];
                }
            }
        }

        let eta = self.prior();
        if online {
            let weight = (self.learning_offset + model.n_batch_iter as f64).powf(-self.learning_decay);
            let doc_ratio = total_docs as f64 / docs.len().max(1) as f64;
            for k in 0..n_topics {
                for w in 0..n_terms {
                    let suff = sstats[k][w] * exp_dirichlet[k][w];
                    model.components[k][w] =
                        model.components[k][w] * (1.0 - weight) + weight * (eta + doc_ratio * suff);
                }
            }
            model.n_batch_iter += 1;
        } else {
            for k in 0..n_topics {
                for w in 0..n_terms {
                    model.components[k][w] = eta + sstats[k][w] * exp_dirichlet[k][w];
                }
            }
        }
        *exp_dirichlet = model.exp_dirichlet_component();
    }
}

fn e_step(
    docs: &[Doc],
    exp_dirichlet: &[Vec<f64>],
    init: Vec<Vec<f64>>,
    doc_topic_prior: f64,
) -> Vec<DocUpdate> {
    docs.par_iter()
        .zip(init)
        .map(|(doc, gamma)| update_doc(doc, exp_dirichlet, gamma, doc_topic_prior))
        .collect()
}

fn update_doc(
    doc: &Doc,
    exp_dirichlet: &[Vec<f64>],
    mut gamma: Vec<f64>,
    doc_topic_prior: f64,
) -> DocUpdate {
    let n_topics = gamma.len();
    let norm_phi = |exp_doc_topic: &[f64]| -> Vec<f64> {
        doc.ids
            .iter()
            .map(|&w| {
                (0..n_topics)
                    .map(|k| exp_doc_topic[k] * exp_dirichlet[k][w])
                    .sum::<f64>()
                    + EPS
            })
            .collect()
    };

    let mut exp_doc_topic = exp_dirichlet_expectation(&gamma);
    let mut phi = norm_phi(&exp_doc_topic);
    for _ in 0..MAX_DOC_UPDATE_ITER {
        let last = gamma.clone();
        for k in 0..n_topics {
            let s: f64 = doc
                .ids
                .iter()
                .zip(&doc.cts)
                .zip(&phi)
                .map(|((&w, &c), &p)| c / p * exp_dirichlet[k][w])
                .sum();
            gamma[k] = exp_doc_topic[k] * s + doc_topic_prior;
        }
        exp_doc_topic = exp_dirichlet_expectation(&gamma);
        phi = norm_phi(&exp_doc_topic);
        let mean_change =
            last.iter().zip(&gamma).map(|(a, b)| (a - b).abs()).sum::<f64>() / n_topics as f64;
        if mean_change < MEAN_CHANGE_TOL {
            break;
        }
    }
    let ratio = doc.cts.iter().zip(&phi).map(|(c, p)| c / p).collect();
    DocUpdate {
        gamma,
        exp_doc_topic,
        ratio,
    }
}

/// Topic-word weights of a fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLda {
    /// `n_components x n_terms`, unnormalized
    pub components: Vec<Vec<f64>>,
    pub n_iter: usize,
    n_batch_iter: usize,
    doc_topic_prior: f64,
}

impl FittedLda {
    fn exp_dirichlet_component(&self) -> Vec<Vec<f64>> {
        self.components
            .iter()
            .map(|row| exp_dirichlet_expectation(row))
            .collect()
    }

    /// Column indices of the `n` heaviest terms of every topic, heaviest
    /// first, ties broken by column order.
    pub fn top_word_indices(&self, n: usize) -> Vec<Vec<usize>> {
        self.components
            .iter()
            .map(|row| {
                let mut idx: Vec<usize> = (0..row.len()).collect();
                idx.sort_by(|&a, &b| row[b].total_cmp(&row[a]).then(a.cmp(&b)));
                idx.truncate(n);
                idx
            })
            .collect()
    }

    /// Plug-in perplexity `exp(-Σ c·ln p(w|d) / Σ c)`.
    fn perplexity_of(&self, docs: &[Doc], exp_dirichlet: &[Vec<f64>]) -> f64 {
        let n_topics = self.components.len();
        let init = vec![vec![1.0; n_topics]; docs.len()];
        let updates = e_step(docs, exp_dirichlet, init, self.doc_topic_prior);
        let beta: Vec<Vec<f64>> = self
            .components
            .iter()
            .map(|row| {
                let sum: f64 = row.iter().sum();
                row.iter().map(|v| v / sum).collect()
            })
            .collect();

        let mut log_lik = 0.0;
        let mut total = 0.0;
        for (doc, update) in docs.iter().zip(&updates) {
            let gamma_sum: f64 = update.gamma.iter().sum();
            for (&w, &c) in doc.ids.iter().zip(&doc.cts) {
                let p: f64 = (0..n_topics)
                    .map(|k| update.gamma[k] / gamma_sum * beta[k][w])
                    .sum();
                log_lik += c * (p + EPS).ln();
                total += c;
            }
        }
        if total == 0.0 {
            return 1.0;
        }
        (-log_lik / total).exp()
    }
}
