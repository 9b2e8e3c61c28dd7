//! Random Forest
//!
//! Bagged ensemble of [`DecisionTree`]s. Each tree is grown on a bootstrap
//! sample with its own RNG seeded from the base seed and the tree index, so
//! the fitted forest does not depend on how trees are spread over threads.
//! Class probabilities are the mean of the per-tree leaf distributions.

use crate::config::{ClassWeight, ForestConfig};
use crate::tree::{argmax, DecisionTree, TreeParams, N_CLASSES};
use crate::ClassifierError;
use feature_engine::FEATURE_DIMENSION;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use tracing::{debug, info};

type Row = [f64; FEATURE_DIMENSION];

/// A fitted tree plus which rows were in its bootstrap sample
struct GrownTree {
    tree: DecisionTree,
    in_bag: Vec<bool>,
}

/// A Random Forest classifier.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    oob_score: Option<f64>,
}

impl RandomForest {
    /// Fit a forest on rows `x` with class indices `y`.
    pub fn fit(x: &[Row], y: &[usize], config: &ForestConfig) -> Result<Self, ClassifierError> {
        if x.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(ClassifierError::TrainingFailed(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= N_CLASSES) {
            return Err(ClassifierError::TrainingFailed(format!("class index {} out of range", bad)));
        }
        if config.n_trees == 0 {
            return Err(ClassifierError::TrainingFailed("n_trees must be positive".to_string()));
        }

        let class_weights = class_weights(y, config.class_weight);
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(FEATURE_DIMENSION),
        };

        let workers = config
            .n_jobs
            .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .clamp(1, config.n_trees);

        info!(
            "Growing {} trees on {} rows with {} workers (max_depth={}, max_features={})",
            config.n_trees,
            x.len(),
            workers,
            params.max_depth,
            params.max_features
        );

        let grow = |index: usize| grow_tree(x, y, &class_weights, params, config.seed, index);

        let mut grown: Vec<(usize, GrownTree)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let grow = &grow;
                    scope.spawn(move || {
                        (worker..config.n_trees)
                            .step_by(workers)
                            .map(|i| (i, grow(i)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join())
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|_| ClassifierError::TrainingFailed("tree worker panicked".to_string()))?
        .into_iter()
        .flatten()
        .collect();

        grown.sort_by_key(|(i, _)| *i);

        let oob_score = if config.oob_score {
            oob_accuracy(x, y, &grown)
        } else {
            None
        };

        let trees: Vec<DecisionTree> = grown.into_iter().map(|(_, g)| g.tree).collect();
        debug!(
            "Forest grown: {} trees, {} total nodes",
            trees.len(),
            trees.iter().map(DecisionTree::n_nodes).sum::<usize>()
        );

        Ok(Self { trees, oob_score })
    }

    /// Mean class distribution over all trees
    pub fn predict_proba(&self, features: &Row) -> [f64; N_CLASSES] {
        let mut sum = [0.0; N_CLASSES];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sum.map(|s| s / n)
    }

    /// Predicted class index (lowest index wins ties)
    pub fn predict(&self, features: &Row) -> usize {
        argmax(&self.predict_proba(features))
    }

    /// Out-of-bag accuracy, when computed at fit time
    pub fn oob_score(&self) -> Option<f64> {
        self.oob_score
    }

    /// Number of trees in the forest.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Average tree depth across the forest.
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }
}

fn class_weights(y: &[usize], mode: ClassWeight) -> [f64; N_CLASSES] {
    match mode {
        ClassWeight::Uniform => [1.0; N_CLASSES],
        ClassWeight::Balanced => {
            let mut counts = [0usize; N_CLASSES];
            for &c in y {
                counts[c] += 1;
            }
            let present = counts.iter().filter(|&&c| c > 0).count().max(1) as f64;
            let n = y.len() as f64;
            counts.map(|c| if c == 0 { 1.0 } else { n / (present * c as f64) })
        }
    }
}

fn grow_tree(
    x: &[Row],
    y: &[usize],
    class_weights: &[f64; N_CLASSES],
    params: TreeParams,
    seed: u64,
    index: usize,
) -> GrownTree {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
    let n = x.len();

    let mut draws = vec![0u32; n];
    for _ in 0..n {
        draws[rng.gen_range(0..n)] += 1;
    }

    let weights: Vec<f64> = draws
        .iter()
        .zip(y)
        .map(|(&count, &class)| f64::from(count) * class_weights[class])
        .collect();
    let samples: Vec<usize> = (0..n).filter(|&i| draws[i] > 0).collect();

    let tree = DecisionTree::fit(x, y, &weights, &samples, params, &mut rng);
    GrownTree {
        tree,
        in_bag: draws.iter().map(|&c| c > 0).collect(),
    }
}

fn oob_accuracy(x: &[Row], y: &[usize], grown: &[(usize, GrownTree)]) -> Option<f64> {
    let mut scored = 0usize;
    let mut correct = 0usize;

    for (i, row) in x.iter().enumerate() {
        let mut sum = [0.0; N_CLASSES];
        let mut votes = 0;
        for (_, g) in grown.iter().filter(|(_, g)| !g.in_bag[i]) {
            for (acc, p) in sum.iter_mut().zip(g.tree.predict_proba(row)) {
                *acc += p;
            }
            votes += 1;
        }
        if votes == 0 {
            continue;
        }
        scored += 1;
        if argmax(&sum) == y[i] {
            correct += 1;
        }
    }

    (scored > 0).then(|| correct as f64 / scored as f64)
}
