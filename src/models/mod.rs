/// Классификатор, оценка и предсказание

pub mod classifier;
pub mod evaluation;
pub mod runner;

pub use classifier::{Classifier, ClassifierConfig, ClassifierKind, DecisionTreeClassifier, MajorityClassifier};
pub use evaluation::{Evaluation, Holdout};
pub use runner::{fit_and_predict, ModelReport, RunOutput};
