//! Passenger ML - конвейер признаков и классификатор для задачи о транспортировке пассажиров

pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod session;
pub mod types;

pub use error::{ModelError, PipelineError};
pub use models::{fit_and_predict, Classifier, ClassifierConfig, RunOutput};
pub use preprocessing::{FeatureEncoder, FeaturePipeline, FlagEncoding, PipelineConfig, PipelineOutput};
pub use types::*;
