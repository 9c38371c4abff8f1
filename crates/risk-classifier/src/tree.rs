//! Decision Tree
//!
//! CART classifier grown on binned features with Gini impurity.

use crate::binning::BinnedMatrix;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::index;

/// Minimum impurity decrease for a split to be kept
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        /// Class distribution of the training rows that reached the leaf
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: usize,
    pub n_classes: usize,
}

/// A fitted decision tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

struct Candidate {
    feature: usize,
    bin: usize,
    child_impurity: f64,
}

struct Builder<'a> {
    data: &'a BinnedMatrix,
    labels: &'a [usize],
    weights: &'a [u32],
    params: &'a TreeParams,
    rng: StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

/// Move rows matching `goes_left` to the front, returning the split point
fn partition(rows: &mut [u32], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for i in 0..rows.len() {
        if goes_left(rows[i] as usize) {
            rows.swap(mid, i);
            mid += 1;
        }
    }
    mid
}

impl<'a> Builder<'a> {
    fn class_weights(&self, rows: &[u32]) -> Vec<f64> {
        let mut counts = vec![0.0; self.params.n_classes];
        for &row in rows {
            let row = row as usize;
            counts[self.labels[row]] += f64::from(self.weights[row]);
        }
        counts
    }

    fn grow(&mut self, rows: &mut [u32], depth: usize) -> usize {
        let counts = self.class_weights(rows);
        let total: f64 = counts.iter().sum();
        let impurity = gini(&counts, total);

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: counts.iter().map(|c| c / total).collect(),
        });

        if depth >= self.params.max_depth
            || total < self.params.min_samples_split as f64
            || impurity <= 0.0
        {
            return index;
        }

        let Some(best) = self.best_split(rows, &counts, total, impurity) else {
            return index;
        };

        let data = self.data;
        let mid = partition(rows, |row| data.bin(best.feature, row) <= best.bin);
        self.importances[best.feature] += total * impurity - best.child_impurity;

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);

        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: data.threshold(best.feature, best.bin),
            left,
            right,
        };
        index
    }

    /// Best split among a random subset of features.
    ///
    /// `child_impurity` is the weight-scaled impurity of both children.
    fn best_split(&mut self, rows: &[u32], counts: &[f64], total: f64, impurity: f64) -> Option<Candidate> {
        let n_classes = self.params.n_classes;
        let n_features = self.data.n_features();
        let features = index::sample(&mut self.rng, n_features, self.params.max_features.min(n_features));

        let mut best: Option<Candidate> = None;
        let mut best_score = total * impurity - MIN_GAIN;

        for feature in features.iter() {
            let n_bins = self.data.n_bins(feature);
            if n_bins < 2 {
                continue;
            }

            let mut histogram = vec![0.0; n_bins * n_classes];
            for &row in rows {
                let row = row as usize;
                histogram[self.data.bin(feature, row) * n_classes + self.labels[row]] +=
                    f64::from(self.weights[row]);
            }

            let mut left = vec![0.0; n_classes];
            let mut right = vec![0.0; n_classes];
            for bin in 0..n_bins - 1 {
                for class in 0..n_classes {
                    left[class] += histogram[bin * n_classes + class];
                }
                let left_total: f64 = left.iter().sum();
                let right_total = total - left_total;
                if left_total <= 0.0 || right_total <= 0.0 {
                    continue;
                }
                for class in 0..n_classes {
                    right[class] = counts[class] - left[class];
                }

                let score = left_total * gini(&left, left_total) + right_total * gini(&right, right_total);
                if score < best_score {
                    best_score = score;
                    best = Some(Candidate {
                        feature,
                        bin,
                        child_impurity: score,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    /// Grow a tree on the rows with non-zero weight
    pub(crate) fn fit(
        data: &BinnedMatrix,
        labels: &[usize],
        weights: &[u32],
        params: &TreeParams,
        rng: StdRng,
    ) -> Self {
        let mut rows: Vec<u32> = weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0)
            .map(|(i, _)| i as u32)
            .collect();

        let mut builder = Builder {
            data,
            labels,
            weights,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; data.n_features()],
        };
        if !rows.is_empty() {
            builder.grow(&mut rows, 0);
        }

        let mut importances = builder.importances;
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            importances.iter_mut().for_each(|v| *v /= sum);
        }

        Self {
            nodes: builder.nodes,
            importances,
        }
    }

    /// Class distribution of the leaf `row` falls into
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Option<&[f64]> {
        let mut index = 0;
        loop {
            match self.nodes.get(index)? {
                Node::Leaf { proba } => return Some(proba.as_slice()),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Normalised impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Number of nodes (splits and leaves)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::SeedableRng;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            max_features: 2,
            n_classes: 2,
        }
    }

    #[test]
    fn test_separable_split() {
        // label is 1 when the first feature exceeds 5
        let x: Array2<f64> = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 / 4.0 } else { 1.0 });
        let labels: Vec<usize> = (0..40).map(|i| usize::from(i as f64 / 4.0 > 5.0)).collect();
        let weights = vec![1; 40];
        let data = BinnedMatrix::from_matrix(x.view());

        let tree = DecisionTree::fit(&data, &labels, &weights, &params(4), StdRng::seed_from_u64(1));

        assert_eq!(tree.predict_proba_row(array![2.0, 1.0].view()), Some(&[1.0, 0.0][..]));
        assert_eq!(tree.predict_proba_row(array![9.0, 1.0].view()), Some(&[0.0, 1.0][..]));
        assert_eq!(tree.depth(), 1);
        assert!((tree.feature_importances()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_depth_limit() {
        let x: Array2<f64> = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let labels: Vec<usize> = (0..64).map(|i| i % 2).collect();
        let data = BinnedMatrix::from_matrix(x.view());

        let tree = DecisionTree::fit(&data, &labels, &vec![1; 64], &params(3), StdRng::seed_from_u64(2));
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_min_samples_split_makes_leaf() {
        let x: Array2<f64> = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let labels: Vec<usize> = (0..10).map(|i| usize::from(i >= 5)).collect();
        let data = BinnedMatrix::from_matrix(x.view());
        let p = TreeParams {
            min_samples_split: 20,
            ..params(10)
        };

        let tree = DecisionTree::fit(&data, &labels, &vec![1; 10], &p, StdRng::seed_from_u64(3));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_proba_row(array![0.0].view()), Some(&[0.5, 0.5][..]));
    }

    #[test]
    fn test_zero_weight_rows_ignored() {
        let x: Array2<f64> = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let labels = vec![0, 0, 1, 1];
        let data = BinnedMatrix::from_matrix(x.view());

        let tree = DecisionTree::fit(&data, &labels, &[1, 1, 0, 0], &params(5), StdRng::seed_from_u64(4));
        assert_eq!(tree.predict_proba_row(array![3.0].view()), Some(&[1.0, 0.0][..]));
    }
}
