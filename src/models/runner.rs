//! Обучение и предсказание поверх таблиц признаков

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::classifier::ClassifierConfig;
use crate::models::evaluation::{evaluate, Evaluation, Holdout};
use crate::preprocessing::FeatureEncoder;
use crate::types::{FeatureTables, PredictionRow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub classifier: String,
    pub columns: Vec<String>,
    pub training_rows: usize,
    pub predicted_rows: usize,
    pub holdout: Option<Evaluation>,
    pub predicted_positive: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub report: ModelReport,
    pub predictions: Vec<PredictionRow>,
}

/// Оценка на отложенной части, затем обучение на всей размеченной партиции
/// и предсказание неразмеченной в её исходном порядке
pub fn fit_and_predict(
    tables: &FeatureTables,
    config: &ClassifierConfig,
) -> Result<RunOutput, ModelError> {
    if tables.labeled.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }

    // Словари категорий по обеим партициям, метки не участвуют
    let encoder = FeatureEncoder::fit(tables.labeled.iter().chain(&tables.unlabeled));
    let train_x = encoder.transform(&tables.labeled);
    let test_x = encoder.transform(&tables.unlabeled);

    let holdout = Holdout::split(train_x.nrows(), config.holdout_fraction, config.seed);
    let mut probe = config.build();
    let evaluation = evaluate(probe.as_mut(), &train_x, &tables.labels, &holdout)?;

    let mut classifier = config.build();
    classifier.fit(&train_x, &tables.labels)?;
    let predicted = classifier.predict(&test_x)?;

    let predictions: Vec<PredictionRow> = tables
        .unlabeled
        .iter()
        .zip(predicted)
        .map(|(row, transported)| PredictionRow {
            id: row.id.clone(),
            transported,
        })
        .collect();

    let report = ModelReport {
        classifier: classifier.name().to_string(),
        columns: encoder.column_names(),
        training_rows: train_x.nrows(),
        predicted_rows: predictions.len(),
        holdout: evaluation,
        predicted_positive: predictions.iter().filter(|p| p.transported).count(),
    };

    tracing::info!(
        "Model {} fitted on {} rows, {} predictions",
        report.classifier,
        report.training_rows,
        report.predicted_rows
    );

    Ok(RunOutput {
        report,
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::ClassifierKind;
    use crate::types::{AgeGroup, FeatureRow, SpendTier};

    fn row(id: &str, total_spend: f64) -> FeatureRow {
        FeatureRow {
            id: id.to_string(),
            home_planet: "Earth".to_string(),
            cryo_sleep: total_spend == 0.0,
            destination: "TRAPPIST-1e".to_string(),
            age: 30.0,
            vip: false,
            spend: [total_spend, 0.0, 0.0, 0.0, 0.0],
            total_spend,
            spend_tier: SpendTier::Medium,
            age_group: AgeGroup::Adult,
            group_size: 1,
            family_size: 1,
            deck: "F".to_string(),
            cabin_num: 1.0,
            cabin_side: "S".to_string(),
        }
    }

    fn tables() -> FeatureTables {
        let labeled: Vec<FeatureRow> = (0..20)
            .map(|i| row(&format!("{:04}_01", i), if i % 2 == 0 { 0.0 } else { 500.0 }))
            .collect();
        let labels = (0..20).map(|i| i % 2 == 0).collect();
        let unlabeled = vec![row("0100_01", 800.0), row("0101_01", 0.0)];
        FeatureTables {
            labeled,
            labels,
            unlabeled,
        }
    }

    #[test]
    fn predicts_unlabeled_rows_in_order() {
        let config = ClassifierConfig::default();
        let output = fit_and_predict(&tables(), &config).unwrap();

        let ids: Vec<&str> = output.predictions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["0100_01", "0101_01"]);
        assert!(!output.predictions[0].transported);
        assert!(output.predictions[1].transported);

        let holdout = output.report.holdout.unwrap();
        assert_eq!(holdout.test_rows, 4);
        assert_eq!(holdout.accuracy, 1.0);
        assert_eq!(output.report.training_rows, 20);
    }

    #[test]
    fn empty_labeled_partition_fails() {
        let mut tables = tables();
        tables.labeled.clear();
        tables.labels.clear();
        let config = ClassifierConfig {
            kind: ClassifierKind::Majority,
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            fit_and_predict(&tables, &config),
            Err(ModelError::EmptyTrainingSet)
        ));
    }
}
