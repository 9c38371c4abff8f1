//! Classifier capability contract
//!
//! Every classifier can produce labels. Some can also produce class
//! probabilities; callers ask for the capability instead of probing for it.

use crate::ClassifierError;
use ndarray::{Array2, ArrayView2};

/// What a classifier can produce beyond labels
pub enum Capability<'a> {
    /// Class-probability output is available
    Probabilistic(&'a dyn ProbabilisticClassifier),
    /// Only hard labels
    LabelOnly,
}

/// A trained binary/multiclass classifier over a fixed feature vector
pub trait Classifier: Send + Sync {
    /// Number of input features expected per row
    fn n_features(&self) -> usize;

    /// Predict a label for every row of `x`
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>, ClassifierError>;

    /// Probability capability of this classifier
    fn capability(&self) -> Capability<'_>;
}

/// A classifier that can output class probabilities
pub trait ProbabilisticClassifier: Classifier {
    /// Labels of the probability columns, ascending
    fn classes(&self) -> &[u8];

    /// One row per input row, one column per entry of [`classes`](Self::classes)
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError>;
}

/// Check the column count of an input matrix
pub(crate) fn check_width(x: &ArrayView2<'_, f64>, expected: usize) -> Result<(), ClassifierError> {
    if x.ncols() != expected {
        return Err(ClassifierError::InvalidInputShape {
            expected: format!("[*, {expected}]"),
            actual: format!("[{}, {}]", x.nrows(), x.ncols()),
        });
    }
    Ok(())
}
