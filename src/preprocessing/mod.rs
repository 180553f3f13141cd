/// Модуль предобработки данных

pub mod age;
pub mod cabin;
pub mod encoding;
pub mod finalize;
pub mod group;
pub mod identity;
pub mod pipeline;
pub mod profile;
pub mod rules;
pub mod spending;
pub mod stats;
pub mod union;

#[cfg(test)]
pub(crate) mod test_support;

pub use encoding::FeatureEncoder;
pub use finalize::FlagEncoding;
pub use pipeline::{FeaturePipeline, PipelineConfig, PipelineOutput, PipelineReport};
pub use profile::DataProfile;
pub use rules::{Fill, ImputationPolicy, Predicate, Rule};
