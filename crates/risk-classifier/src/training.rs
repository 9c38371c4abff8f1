//! End-to-end training stage

use crate::config::TrainingConfig;
use crate::dataset::LabeledDataset;
use crate::forest::RandomForest;
use crate::metrics::{rank_importances, ClassificationMetrics, FeatureImportance};
use crate::{Classifier, ClassifierError};
use feature_engine::{FeatureColumn, FeatureTable};
use rand::prelude::*;
use tracing::info;

/// A fitted risk model with its evaluation
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub forest: RandomForest,
    /// Input columns, in matrix order
    pub columns: Vec<FeatureColumn>,
    /// Hold-out metrics
    pub metrics: ClassificationMetrics,
    /// Features by importance, descending
    pub importances: Vec<FeatureImportance>,
    /// Rows added by minority-class synthesis
    pub synthesized_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Build the dataset, balance it, split, fit and evaluate
pub fn train_risk_model(table: &FeatureTable, config: &TrainingConfig) -> Result<TrainedModel, ClassifierError> {
    let mut dataset = LabeledDataset::from_table(table, &config.columns)?;
    info!(
        "Training data: {} rows, {} high-risk",
        dataset.len(),
        dataset.positives()
    );

    let mut rng = StdRng::seed_from_u64(config.synthesis.seed);
    let synthesized_rows = dataset
        .ensure_both_classes(&config.synthesis, &mut rng)?
        .map_or(0, |report| report.added);

    let split = dataset.stratified_split(config.test_fraction, config.split_seed)?;
    let forest = RandomForest::fit(&config.forest, split.train.features.view(), &split.train.labels)?;
    info!(
        "Fitted {} trees on {} rows, evaluating on {}",
        forest.n_trees(),
        split.train.len(),
        split.test.len()
    );

    let predicted = forest.predict(split.test.features.view())?;
    let metrics = ClassificationMetrics::compute(&split.test.labels, &predicted);

    info!("Accuracy: {:.3}", metrics.accuracy);
    info!("Precision: {:.3}", metrics.precision);
    info!("Recall: {:.3}", metrics.recall);

    let importances = rank_importances(&config.columns, &forest.feature_importances());
    for feature in importances.iter().take(5) {
        info!("Top feature: {:<22} {:.4}", feature.column.name(), feature.importance);
    }

    Ok(TrainedModel {
        forest,
        columns: config.columns.clone(),
        metrics,
        importances,
        synthesized_rows,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::ProbabilisticClassifier;
    use chrono::NaiveDate;
    use feature_engine::FeatureDeriver;
    use telemetry_sim::{SimulationConfig, TelemetrySynthesizer};

    fn table(devices: u32, hours: u32) -> FeatureTable {
        let config = SimulationConfig {
            reference_time: NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
            ..SimulationConfig::small(devices, hours)
        };
        let fleet = TelemetrySynthesizer::new(config).unwrap().generate();
        FeatureDeriver::default().derive(&fleet.readings).unwrap()
    }

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            forest: ForestConfig {
                n_trees: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_train_on_degrading_fleet() {
        // 20 devices, the first two degrade after hour 1800
        let table = table(20, 2160);
        let model = train_risk_model(&table, &quick_config()).unwrap();

        assert_eq!(model.forest.classes(), &[0, 1]);
        assert_eq!(model.forest.n_trees(), 10);
        assert_eq!(model.train_rows + model.test_rows, table.len() + model.synthesized_rows);
        assert_eq!(model.importances.len(), 8);
        assert!(model
            .importances
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
        assert!(model.metrics.accuracy > 0.9);
    }

    #[test]
    fn test_single_class_input_trains() {
        // 48 hours, no degradation: every row is healthy
        let table = table(10, 48);
        assert!(table.iter().all(|r| r.high_risk == 0));

        let model = train_risk_model(&table, &quick_config()).unwrap();
        assert_eq!(model.synthesized_rows, 48);
        assert_eq!(model.forest.classes(), &[0, 1]);
    }
}
