//! Biased matrix factorization trained with stochastic gradient descent.
//!
//! The estimate for user `u` and item `i` is `mu + b_u + b_i + q_i . p_u`,
//! where `mu` is the global mean rating. Parameters are learned by iterating
//! over the ratings in input order for a fixed number of epochs.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvdParams {
    pub n_factors: usize,
    pub n_epochs: usize,
    pub init_mean: f64,
    pub init_std: f64,
    /// Learning rate for every parameter
    pub lr: f64,
    /// Regularization term for every parameter
    pub reg: f64,
    pub seed: Option<u64>,
    pub rating_min: f64,
    pub rating_max: f64,
}

impl Default for SvdParams {
    fn default() -> Self {
        Self {
            n_factors: 100,
            n_epochs: 20,
            init_mean: 0.0,
            init_std: 0.1,
            lr: 0.005,
            reg: 0.02,
            seed: None,
            rating_min: 1.0,
            rating_max: 5.0,
        }
    }
}

impl SvdParams {
    pub fn validate(&self) -> AppResult<()> {
        if self.n_factors == 0 || self.n_epochs == 0 {
            return Err(AppError::Training(
                "n_factors and n_epochs must be positive".to_string(),
            ));
        }
        if !(self.init_std >= 0.0 && self.init_std.is_finite()) {
            return Err(AppError::Training(format!("invalid init_std {}", self.init_std)));
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) || !(self.reg >= 0.0 && self.reg.is_finite()) {
            return Err(AppError::Training("lr must be positive and reg non-negative".to_string()));
        }
        if self.rating_min >= self.rating_max {
            return Err(AppError::Training("rating scale is empty".to_string()));
        }
        Ok(())
    }
}

/// A single estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub estimate: f64,
    /// User or item was absent from the training data
    pub impossible: bool,
}

/// A fitted factorization model
#[derive(Debug, Clone)]
pub struct Svd {
    params: SvdParams,
    global_mean: f64,
    users: HashMap<String, usize>,
    items: HashMap<String, usize>,
    user_bias: Vec<f64>,
    item_bias: Vec<f64>,
    /// Row-major `n_users x n_factors`
    user_factors: Vec<f64>,
    /// Row-major `n_items x n_factors`
    item_factors: Vec<f64>,
}

impl Svd {
    /// Trains a model on `(user, item, rating)` triples
    pub fn fit<'a, I>(params: SvdParams, ratings: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        params.validate()?;

        let mut users: HashMap<String, usize> = HashMap::new();
        let mut items: HashMap<String, usize> = HashMap::new();
        let mut triples: Vec<(usize, usize, f64)> = Vec::new();

        for (user, item, rating) in ratings {
            if !rating.is_finite() {
                return Err(AppError::Training(format!(
                    "non-finite rating for user {} item {}",
                    user, item
                )));
            }
            let next_user = users.len();
            let u = *users.entry(user.to_string()).or_insert(next_user);
            let next_item = items.len();
            let i = *items.entry(item.to_string()).or_insert(next_item);
            triples.push((u, i, rating));
        }

        if triples.is_empty() {
            return Err(AppError::Training("cannot train on an empty rating set".to_string()));
        }

        let k = params.n_factors;
        let global_mean = triples.iter().map(|t| t.2).sum::<f64>() / triples.len() as f64;

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal = Normal::new(params.init_mean, params.init_std)
            .map_err(|e| AppError::Training(e.to_string()))?;

        let mut user_factors: Vec<f64> = (0..users.len() * k).map(|_| normal.sample(&mut rng)).collect();
        let mut item_factors: Vec<f64> = (0..items.len() * k).map(|_| normal.sample(&mut rng)).collect();
        let mut user_bias = vec![0.0; users.len()];
        let mut item_bias = vec![0.0; items.len()];

        let (lr, reg) = (params.lr, params.reg);

        for _ in 0..params.n_epochs {
            for &(u, i, rating) in &triples {
                let pu = &mut user_factors[u * k..(u + 1) * k];
                let qi = &mut item_factors[i * k..(i + 1) * k];

                let dot: f64 = pu.iter().zip(qi.iter()).map(|(a, b)| a * b).sum();
                let err = rating - (global_mean + user_bias[u] + item_bias[i] + dot);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                item_bias[i] += lr * (err - reg * item_bias[i]);

                for f in 0..k {
                    let puf = pu[f];
                    let qif = qi[f];
                    pu[f] += lr * (err * qif - reg * puf);
                    qi[f] += lr * (err * puf - reg * qif);
                }
            }
        }

        Ok(Self {
            params,
            global_mean,
            users,
            items,
            user_bias,
            item_bias,
            user_factors,
            item_factors,
        })
    }

    /// Estimates the rating `user` would give `item`, clipped to the rating scale
    pub fn predict(&self, user: &str, item: &str) -> Prediction {
        let u = self.users.get(user).copied();
        let i = self.items.get(item).copied();
        let k = self.params.n_factors;

        let mut estimate = self.global_mean;
        if let Some(u) = u {
            estimate += self.user_bias[u];
        }
        if let Some(i) = i {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (u, i) {
            let pu = &self.user_factors[u * k..(u + 1) * k];
            let qi = &self.item_factors[i * k..(i + 1) * k];
            estimate += pu.iter().zip(qi).map(|(a, b)| a * b).sum::<f64>();
        }

        Prediction {
            estimate: estimate.clamp(self.params.rating_min, self.params.rating_max),
            impossible: u.is_none() || i.is_none(),
        }
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }
}
