//! Random Forest Ensemble
//!
//! Bagged decision trees with per-split feature subsampling. Trees are grown
//! in parallel; each tree owns a seed derived from the forest seed, so the
//! fitted forest does not depend on thread scheduling.

use crate::binning::BinnedMatrix;
use crate::classifier::{check_width, Capability, Classifier, ProbabilisticClassifier};
use crate::config::ForestConfig;
use crate::tree::{DecisionTree, TreeParams};
use crate::ClassifierError;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

/// Random forest classifier
#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Observed labels, ascending; probability columns follow this order
    classes: Vec<u8>,
    /// Width of the training matrix
    n_features: usize,
}

fn bootstrap_weights(rng: &mut StdRng, n: usize) -> Vec<u32> {
    let mut weights = vec![0u32; n];
    for _ in 0..n {
        weights[rng.gen_range(0..n)] += 1;
    }
    weights
}

impl RandomForest {
    /// Fit a forest on `x` (rows = samples) and labels `y`
    pub fn fit(config: &ForestConfig, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<Self, ClassifierError> {
        if config.n_trees == 0 {
            return Err(ClassifierError::InvalidConfig("n_trees must be > 0".to_string()));
        }
        if x.nrows() == 0 {
            return Err(ClassifierError::EmptyDataset);
        }
        if x.ncols() == 0 {
            return Err(ClassifierError::InvalidConfig("no feature columns".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let labels: Vec<usize> = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_else(|i| i))
            .collect();

        let n_rows = x.nrows();
        let n_features = x.ncols();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: config.max_features.resolve(n_features),
            n_classes: classes.len(),
        };

        info!(
            "Training random forest: {} trees, max_depth={}, min_samples_split={}, {} rows x {} features",
            config.n_trees, config.max_depth, config.min_samples_split, n_rows, n_features
        );

        let data = BinnedMatrix::from_matrix(x);
        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(t as u64));
                let weights = if config.bootstrap {
                    bootstrap_weights(&mut rng, n_rows)
                } else {
                    vec![1; n_rows]
                };
                DecisionTree::fit(&data, &labels, &weights, &params, rng)
            })
            .collect();

        debug!(
            "Forest grown: {} nodes total, max depth {}",
            trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        Ok(Self {
            trees,
            classes,
            n_features,
        })
    }

    /// Averaged class distribution for one row
    fn proba_row(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, ClassifierError> {
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let proba = tree
                .predict_proba_row(row)
                .ok_or_else(|| ClassifierError::InferenceFailed("empty tree".to_string()))?;
            for (acc, p) in sum.iter_mut().zip(proba) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.iter_mut().for_each(|v| *v /= n);
        Ok(sum)
    }

    /// Mean of the per-tree normalised importances, renormalised
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            importances.iter_mut().for_each(|v| *v /= sum);
        }
        importances
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>, ClassifierError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                // first maximum wins ties
                let mut best = 0;
                for (i, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = i;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    fn capability(&self) -> Capability<'_> {
        Capability::Probabilistic(self)
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn classes(&self) -> &[u8] {
        &self.classes
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        if self.trees.is_empty() {
            return Err(ClassifierError::NotFitted);
        }
        check_width(&x, self.n_features)?;

        let mut out = Array2::zeros((x.nrows(), self.classes.len()));
        for (row, mut target) in x.rows().into_iter().zip(out.rows_mut()) {
            for (slot, p) in target.iter_mut().zip(self.proba_row(row)?) {
                *slot = p;
            }
        }
        Ok(out)
    }
}
