//! Decision Tree
//!
//! CART classifier with weighted Gini impurity. Nodes live in a flat array;
//! a sample goes left when `value <= threshold`.

use feature_engine::FEATURE_DIMENSION;
use rand::rngs::StdRng;
use rand::seq::index::sample as sample_indices;

/// Size of the label space (low, medium, high)
pub const N_CLASSES: usize = 3;

/// Consecutive sorted values closer than this are not split between
const FEATURE_THRESHOLD: f64 = 1e-7;

type Row = [f64; FEATURE_DIMENSION];

/// A node in the decision tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Feature index to split on (`None` for leaf nodes)
    pub feature: Option<usize>,
    /// Split threshold (features <= threshold go left)
    pub threshold: f64,
    /// Index of left child
    pub left_child: usize,
    /// Index of right child
    pub right_child: usize,
    /// Weighted class distribution of the training samples at this node
    pub distribution: [f64; N_CLASSES],
}

impl TreeNode {
    /// Returns `true` if this node is a leaf (no children).
    pub fn is_leaf(&self) -> bool {
        self.feature.is_none()
    }
}

/// Growth limits
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

/// Training view shared by every node of one tree
struct Training<'a> {
    x: &'a [Row],
    y: &'a [usize],
    weights: &'a [f64],
    params: TreeParams,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// A decision tree classifier.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples`.
    ///
    /// `weights[i]` is the weight of row `i`; rows not in `samples` are
    /// ignored. `y` holds class indices below [`N_CLASSES`].
    pub fn fit(
        x: &[Row],
        y: &[usize],
        weights: &[f64],
        samples: &[usize],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let training = Training { x, y, weights, params };
        let mut tree = Self { nodes: Vec::new() };
        let mut samples = samples.to_vec();
        tree.grow(&training, &mut samples, 0, rng);
        tree
    }

    fn grow(&mut self, t: &Training<'_>, samples: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let distribution = class_totals(t, samples);
        let total: f64 = distribution.iter().sum();
        let node_impurity = weighted_gini(&distribution);

        let idx = self.nodes.len();
        self.nodes.push(TreeNode {
            feature: None,
            threshold: 0.0,
            left_child: 0,
            right_child: 0,
            distribution: normalize(distribution, total),
        });

        let n = samples.len();
        let params = t.params;
        if depth >= params.max_depth
            || n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
            || node_impurity <= f64::EPSILON
        {
            return idx;
        }

        let split = match best_split(t, samples, rng) {
            Some(split) if split.impurity < node_impurity - 1e-12 => split,
            _ => return idx,
        };

        let mut boundary = 0;
        for i in 0..n {
            if t.x[samples[i]][split.feature] <= split.threshold {
                samples.swap(i, boundary);
                boundary += 1;
            }
        }
        let (left, right) = samples.split_at_mut(boundary);

        let left_child = self.grow(t, left, depth + 1, rng);
        let right_child = self.grow(t, right, depth + 1, rng);

        let node = &mut self.nodes[idx];
        node.feature = Some(split.feature);
        node.threshold = split.threshold;
        node.left_child = left_child;
        node.right_child = right_child;
        idx
    }

    /// Class distribution of the leaf reached by `features`
    pub fn predict_proba(&self, features: &Row) -> &[f64; N_CLASSES] {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            match node.feature {
                None => return &node.distribution,
                Some(feature) => {
                    idx = if features[feature] <= node.threshold {
                        node.left_child
                    } else {
                        node.right_child
                    };
                }
            }
        }
    }

    /// Classify a single sample (lowest index wins ties)
    pub fn predict(&self, features: &Row) -> usize {
        argmax(self.predict_proba(features))
    }

    /// Number of nodes in the tree.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Access a node by index.
    pub fn node_at(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    /// Tree depth (longest root-to-leaf path).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return 0;
        }
        1 + self.node_depth(node.left_child).max(self.node_depth(node.right_child))
    }
}

/// Index of the largest entry; the first one wins ties
pub(crate) fn argmax(values: &[f64; N_CLASSES]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn class_totals(t: &Training<'_>, samples: &[usize]) -> [f64; N_CLASSES] {
    let mut totals = [0.0; N_CLASSES];
    for &s in samples {
        totals[t.y[s]] += t.weights[s];
    }
    totals
}

fn normalize(distribution: [f64; N_CLASSES], total: f64) -> [f64; N_CLASSES] {
    if total <= 0.0 {
        return [1.0 / N_CLASSES as f64; N_CLASSES];
    }
    distribution.map(|w| w / total)
}

/// Gini impurity scaled by node weight: W * (1 - sum(p_k^2))
fn weighted_gini(totals: &[f64; N_CLASSES]) -> f64 {
    let total: f64 = totals.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    total - totals.iter().map(|w| w * w).sum::<f64>() / total
}

fn best_split(t: &Training<'_>, samples: &[usize], rng: &mut StdRng) -> Option<Split> {
    let n = samples.len();
    let min_leaf = t.params.min_samples_leaf.max(1);
    let candidates = sample_indices(rng, FEATURE_DIMENSION, t.params.max_features.min(FEATURE_DIMENSION));

    let mut best: Option<Split> = None;
    let mut order: Vec<usize> = samples.to_vec();

    for feature in candidates.iter() {
        order.sort_by(|&a, &b| t.x[a][feature].total_cmp(&t.x[b][feature]));

        let mut left = [0.0; N_CLASSES];
        let mut right = class_totals(t, &order);

        for i in 0..n - 1 {
            let s = order[i];
            left[t.y[s]] += t.weights[s];
            right[t.y[s]] -= t.weights[s];

            let here = t.x[s][feature];
            let next = t.x[order[i + 1]][feature];
            if next <= here + FEATURE_THRESHOLD {
                continue;
            }
            let n_left = i + 1;
            if n_left < min_leaf || n - n_left < min_leaf {
                continue;
            }

            let impurity = weighted_gini(&left) + weighted_gini(&right);
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Split {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    impurity,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn row(first: f64, second: f64) -> Row {
        let mut r = [0.0; FEATURE_DIMENSION];
        r[0] = first;
        r[1] = second;
        r
    }

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: FEATURE_DIMENSION,
        }
    }

    fn fit(x: &[Row], y: &[usize], params: TreeParams) -> DecisionTree {
        let weights = vec![1.0; x.len()];
        let samples: Vec<usize> = (0..x.len()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        DecisionTree::fit(x, y, &weights, &samples, params, &mut rng)
    }

    #[test]
    fn simple_split() {
        // f[0] <= 0.5 -> class 0, else class 2
        let x = vec![row(0.1, 0.0), row(0.2, 0.0), row(0.8, 0.0), row(0.9, 0.0)];
        let y = vec![0, 0, 2, 2];
        let tree = fit(&x, &y, params(4));

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.node_at(0).feature, Some(0));
        assert!((tree.node_at(0).threshold - 0.5).abs() < 1e-12);
        assert_eq!(tree.predict(&row(0.3, 0.0)), 0);
        assert_eq!(tree.predict(&row(0.7, 0.0)), 2);
        assert_eq!(tree.predict_proba(&row(0.95, 0.0)), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn depth_limit_makes_mixed_leaf() {
        let x = vec![row(0.1, 0.0), row(0.2, 0.0), row(0.8, 0.0), row(0.9, 0.0)];
        let y = vec![0, 1, 1, 1];
        let tree = fit(&x, &y, params(0));

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&row(0.1, 0.0)), &[0.25, 0.75, 0.0]);
        assert_eq!(tree.predict(&row(0.1, 0.0)), 1);
    }

    #[test]
    fn min_samples_leaf_respected() {
        let x = vec![row(0.1, 0.0), row(0.5, 0.0), row(0.6, 0.0), row(0.7, 0.0)];
        let y = vec![0, 1, 1, 1];
        let tree = fit(
            &x,
            &y,
            TreeParams {
                min_samples_leaf: 2,
                ..params(4)
            },
        );
        // The only pure split isolates one sample, which the leaf limit forbids
        assert!(tree.n_nodes() == 1 || tree.node_at(0).threshold > 0.5);
    }

    #[test]
    fn weights_shift_leaf_distribution() {
        let x = vec![row(0.1, 0.0), row(0.1, 0.0)];
        let y = vec![0, 2];
        let weights = vec![1.0, 3.0];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, &weights, &[0, 1], params(3), &mut rng);

        assert_eq!(tree.predict_proba(&row(0.1, 0.0)), &[0.25, 0.0, 0.75]);
    }

    #[test]
    fn second_feature_split() {
        let x = vec![row(0.0, 1.0), row(0.0, 2.0), row(0.0, 8.0), row(0.0, 9.0)];
        let y = vec![2, 2, 0, 0];
        let tree = fit(&x, &y, params(4));
        assert_eq!(tree.node_at(0).feature, Some(1));
        assert_eq!(tree.predict(&row(0.0, 1.5)), 2);
        assert_eq!(tree.predict(&row(0.0, 8.5)), 0);
    }

    #[test]
    fn argmax_prefers_lowest_index_on_tie() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), 2);
    }
}
