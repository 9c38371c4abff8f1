//! Feature quantisation for split search
//!
//! Each feature is reduced to at most 256 ordered bins so that a split search
//! is one pass over the node's rows instead of a sort.

use ndarray::ArrayView2;

/// Maximum number of bins per feature
pub(crate) const MAX_BINS: usize = 256;

/// Column-major bin indices plus the raw threshold behind each bin edge.
///
/// `bin(v) <= b` holds exactly when `v <= threshold(b)`, so a split found on
/// bins is applied to raw values at prediction time.
pub(crate) struct BinnedMatrix {
    bins: Vec<Vec<u8>>,
    thresholds: Vec<Vec<f64>>,
}

impl BinnedMatrix {
    pub(crate) fn from_matrix(x: ArrayView2<'_, f64>) -> Self {
        let mut bins = Vec::with_capacity(x.ncols());
        let mut thresholds = Vec::with_capacity(x.ncols());

        for column in x.columns() {
            let edges = candidate_thresholds(column.iter().copied());
            bins.push(column.iter().map(|&v| bin_of(&edges, v)).collect());
            thresholds.push(edges);
        }

        Self { bins, thresholds }
    }

    pub(crate) fn n_features(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub(crate) fn bin(&self, feature: usize, row: usize) -> usize {
        self.bins[feature][row] as usize
    }

    pub(crate) fn n_bins(&self, feature: usize) -> usize {
        self.thresholds[feature].len() + 1
    }

    pub(crate) fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.thresholds[feature][bin]
    }
}

/// Split candidates: midpoints between distinct values when there are few,
/// otherwise evenly spaced order statistics.
fn candidate_thresholds(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut distinct = sorted.clone();
    distinct.dedup();

    if distinct.len() <= MAX_BINS {
        return distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let mut edges: Vec<f64> = (1..MAX_BINS)
        .map(|k| sorted[k * sorted.len() / MAX_BINS])
        .collect();
    edges.dedup();
    edges
}

fn bin_of(edges: &[f64], value: f64) -> u8 {
    // at most MAX_BINS - 1 edges, so the index fits
    edges.partition_point(|&t| t < value) as u8
}
