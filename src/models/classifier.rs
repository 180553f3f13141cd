//! Классификаторы за контрактом fit/predict

use linfa::prelude::*;
use linfa_tree::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Контракт внешнего обучателя: матрица признаков и булевы метки
pub trait Classifier: Send {
    fn name(&self) -> &'static str;
    fn fit(&mut self, features: &Array2<f64>, labels: &[bool]) -> Result<(), ModelError>;
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<bool>, ModelError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    DecisionTree,
    Majority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub kind: ClassifierKind,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_weight_split")]
    pub min_weight_split: f32,
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_max_depth() -> usize {
    8
}

fn default_min_weight_split() -> f32 {
    10.0
}

fn default_holdout_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::default(),
            max_depth: default_max_depth(),
            min_weight_split: default_min_weight_split(),
            holdout_fraction: default_holdout_fraction(),
            seed: default_seed(),
        }
    }
}

impl ClassifierConfig {
    pub fn build(&self) -> Box<dyn Classifier> {
        match self.kind {
            ClassifierKind::DecisionTree => Box::new(DecisionTreeClassifier::new(
                self.max_depth,
                self.min_weight_split,
            )),
            ClassifierKind::Majority => Box::new(MajorityClassifier::new()),
        }
    }
}

fn check_shape(features: &Array2<f64>, labels: &[bool]) -> Result<(), ModelError> {
    if features.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if features.nrows() != labels.len() {
        return Err(ModelError::ShapeMismatch {
            rows: features.nrows(),
            labels: labels.len(),
        });
    }
    Ok(())
}

/// Дерево решений (Gini) из linfa-tree
pub struct DecisionTreeClassifier {
    max_depth: usize,
    min_weight_split: f32,
    n_features: Option<usize>,
    tree: Option<DecisionTree<f64, usize>>,
}

impl DecisionTreeClassifier {
    pub fn new(max_depth: usize, min_weight_split: f32) -> Self {
        Self {
            max_depth,
            min_weight_split,
            n_features: None,
            tree: None,
        }
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new(default_max_depth(), default_min_weight_split())
    }
}

impl Classifier for DecisionTreeClassifier {
    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn fit(&mut self, features: &Array2<f64>, labels: &[bool]) -> Result<(), ModelError> {
        check_shape(features, labels)?;

        let targets: Array1<usize> = labels.iter().map(|&l| usize::from(l)).collect();
        let dataset = Dataset::new(features.clone(), targets);

        let tree = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(Some(self.max_depth))
            .min_weight_split(self.min_weight_split)
            .fit(&dataset)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        tracing::info!(
            "Decision tree trained on {} rows x {} features",
            features.nrows(),
            features.ncols()
        );

        self.n_features = Some(features.ncols());
        self.tree = Some(tree);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<bool>, ModelError> {
        let (tree, expected) = match (&self.tree, self.n_features) {
            (Some(tree), Some(n)) => (tree, n),
            _ => return Err(ModelError::NotTrained),
        };
        if features.ncols() != expected {
            return Err(ModelError::ColumnMismatch {
                expected,
                actual: features.ncols(),
            });
        }
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }

        let predicted: Array1<usize> = tree.predict(features);
        Ok(predicted.iter().map(|&class| class == 1).collect())
    }
}

/// Базовая линия: всегда самый частый класс обучающей выборки
#[derive(Debug, Clone, Default)]
pub struct MajorityClassifier {
    n_features: Option<usize>,
    majority: Option<bool>,
}

impl MajorityClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for MajorityClassifier {
    fn name(&self) -> &'static str {
        "majority"
    }

    fn fit(&mut self, features: &Array2<f64>, labels: &[bool]) -> Result<(), ModelError> {
        check_shape(features, labels)?;
        let positives = labels.iter().filter(|&&l| l).count();
        // При равенстве побеждает true
        self.majority = Some(positives * 2 >= labels.len());
        self.n_features = Some(features.ncols());
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<bool>, ModelError> {
        let (majority, expected) = match (self.majority, self.n_features) {
            (Some(m), Some(n)) => (m, n),
            _ => return Err(ModelError::NotTrained),
        };
        if features.ncols() != expected {
            return Err(ModelError::ColumnMismatch {
                expected,
                actual: features.ncols(),
            });
        }
        Ok(vec![majority; features.nrows()])
    }
}
