//! Оценка на отложенной выборке

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::classifier::Classifier;

/// Индексы строк обучающей и отложенной частей
#[derive(Debug, Clone, PartialEq)]
pub struct Holdout {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Holdout {
    /// Воспроизводимое перемешивание; в обучении остаётся хотя бы одна строка
    pub fn split(rows: usize, fraction: f64, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let fraction = fraction.clamp(0.0, 1.0);
        let test_len = ((rows as f64) * fraction).round() as usize;
        let test_len = test_len.min(rows.saturating_sub(1));

        let train = indices.split_off(test_len);
        Self {
            train,
            test: indices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub train_rows: usize,
    pub test_rows: usize,
    pub accuracy: f64,
}

pub fn accuracy(predicted: &[bool], actual: &[bool]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

/// Обучает на train-части и считает точность на test-части.
/// Пустая test-часть оценки не даёт.
pub fn evaluate(
    classifier: &mut dyn Classifier,
    features: &Array2<f64>,
    labels: &[bool],
    holdout: &Holdout,
) -> Result<Option<Evaluation>, ModelError> {
    if features.nrows() != labels.len() {
        return Err(ModelError::ShapeMismatch {
            rows: features.nrows(),
            labels: labels.len(),
        });
    }
    if holdout.test.is_empty() {
        return Ok(None);
    }

    let select = |indices: &[usize]| -> Vec<bool> { indices.iter().map(|&i| labels[i]).collect() };

    let train_x = features.select(Axis(0), &holdout.train);
    let test_x = features.select(Axis(0), &holdout.test);
    let train_y = select(&holdout.train);
    let test_y = select(&holdout.test);

    classifier.fit(&train_x, &train_y)?;
    let predicted = classifier.predict(&test_x)?;
    let accuracy = accuracy(&predicted, &test_y);

    tracing::info!(
        "Holdout evaluation ({}): accuracy {:.4} on {} rows",
        classifier.name(),
        accuracy,
        test_y.len()
    );

    Ok(Some(Evaluation {
        train_rows: train_y.len(),
        test_rows: test_y.len(),
        accuracy,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::MajorityClassifier;

    #[test]
    fn split_is_seeded_and_disjoint() {
        let a = Holdout::split(50, 0.2, 42);
        let b = Holdout::split(50, 0.2, 42);
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 10);
        assert_eq!(a.train.len(), 40);

        let mut all: Vec<usize> = a.train.iter().chain(&a.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn split_keeps_a_training_row() {
        let holdout = Holdout::split(1, 0.9, 7);
        assert_eq!(holdout.train, vec![0]);
        assert!(holdout.test.is_empty());
    }

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[true, false, true, true], &[true, true, true, false]), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn evaluates_on_held_out_rows() {
        let features = Array2::zeros((10, 2));
        let labels = vec![true; 10];
        let holdout = Holdout::split(10, 0.2, 42);
        let mut model = MajorityClassifier::new();

        let evaluation = evaluate(&mut model, &features, &labels, &holdout)
            .unwrap()
            .unwrap();
        assert_eq!(evaluation.test_rows, 2);
        assert_eq!(evaluation.train_rows, 8);
        assert_eq!(evaluation.accuracy, 1.0);
    }
}
