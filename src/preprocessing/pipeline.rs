//! Конвейер признаков: от двух сырых партиций до двух таблиц признаков

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::preprocessing::cabin::{self, UNKNOWN_CATEGORY};
use crate::preprocessing::finalize::{self, FlagEncoding};
use crate::preprocessing::group::{self, GroupIndex};
use crate::preprocessing::rules::{apply_rules, ImputationPolicy, RuleOutcome};
use crate::preprocessing::union::union;
use crate::preprocessing::{age, identity, spending};
use crate::types::{FeatureTables, RawTable, Record};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub flag_encoding: FlagEncoding,
    #[serde(default)]
    pub policy: ImputationPolicy,
}

/// Сводка одного прогона: сколько и чем заполнено
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub labeled_rows: usize,
    pub unlabeled_rows: usize,
    pub groups: usize,
    pub families: usize,
    pub malformed_cabins: usize,
    pub cryo_sleep: RuleOutcome,
    pub vip: RuleOutcome,
    pub destination: RuleOutcome,
    pub age_median: Option<f64>,
    pub ages_filled: usize,
    pub home_planet_from_group: usize,
    pub home_planet_from_family: usize,
    pub home_planet_from_population: usize,
    pub cabin_fields_from_group: usize,
    pub cabin_num_median: Option<f64>,
    pub warnings: Vec<String>,
}

impl PipelineReport {
    fn unresolved(&mut self, field: &'static str, count: usize, fallback: impl ToString) {
        if count == 0 {
            return;
        }
        let warning = PipelineError::UnresolvedCategory {
            field,
            count,
            fallback: fallback.to_string(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub tables: FeatureTables,
    pub report: PipelineReport,
}

#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, labeled: &RawTable, unlabeled: &RawTable) -> Result<PipelineOutput> {
        let unified = union(labeled, unlabeled)?;
        let mut records = unified.records;

        let mut report = PipelineReport {
            labeled_rows: unified.provenance.labeled_len,
            unlabeled_rows: unified.provenance.unlabeled_len,
            ..PipelineReport::default()
        };

        self.impute(&mut records, &mut report);

        let tables = finalize::split(records, &unified.provenance)?;

        tracing::info!(
            "Feature pipeline finished: {} labeled, {} unlabeled, {} groups, {} warnings",
            tables.labeled.len(),
            tables.unlabeled.len(),
            report.groups,
            report.warnings.len()
        );

        Ok(PipelineOutput { tables, report })
    }

    /// Все стадии заполнения по порядку; каждая видит результат предыдущих
    fn impute(&self, records: &mut [Record], report: &mut PipelineReport) {
        let policy = &self.config.policy;

        spending::aggregate(records);
        tracing::debug!("Spending aggregated");

        report.cryo_sleep = apply_rules(
            records,
            &policy.cryo_sleep,
            |r| r.cryo_sleep.as_ref(),
            |r| &mut r.cryo_sleep,
        );
        let residual = fill_residual(records, |r| &mut r.cryo_sleep, false);
        report.unresolved("cryo_sleep", residual, false);

        let ages = age::resolve(records);
        report.age_median = ages.median;
        report.ages_filled = ages.filled;
        if ages.median.is_none() {
            report.unresolved("age", ages.filled, age::DEFAULT_AGE);
        }

        report.vip = apply_rules(records, &policy.vip, |r| r.vip.as_ref(), |r| &mut r.vip);
        let residual = fill_residual(records, |r| &mut r.vip, false);
        report.unresolved("vip", residual, false);

        report.destination = apply_rules(
            records,
            &policy.destination,
            |r| r.destination.as_ref(),
            |r| &mut r.destination,
        );
        let residual = fill_residual(records, |r| &mut r.destination, UNKNOWN_CATEGORY.to_string());
        report.unresolved("destination", residual, UNKNOWN_CATEGORY);
        tracing::debug!("Conditional rules applied");

        report.malformed_cabins = cabin::decompose(records);

        let index = GroupIndex::build(records);
        let groups = group::resolve(records, &index);
        report.groups = groups.groups;
        report.home_planet_from_group = groups.home_planet;
        report.cabin_fields_from_group = groups.deck + groups.cabin_num + groups.cabin_side;
        tracing::debug!("Resolved {} groups", groups.groups);

        let identity = identity::resolve(records, &index);
        report.families = identity.families;
        report.home_planet_from_family = identity.planet_from_family;
        report.home_planet_from_population = identity.planet_from_population;
        if identity.planet_fallback.is_none() {
            report.unresolved("home_planet", identity.planet_from_population, UNKNOWN_CATEGORY);
        }

        let cabins = cabin::finish(records);
        report.cabin_num_median = cabins.num_median;
        if cabins.deck_fallback.is_none() {
            report.unresolved("deck", cabins.deck_filled, UNKNOWN_CATEGORY);
        }
        if cabins.side_fallback.is_none() {
            report.unresolved("cabin_side", cabins.side_filled, UNKNOWN_CATEGORY);
        }
        if cabins.num_median.is_none() {
            report.unresolved("cabin_num", cabins.num_filled, 0.0);
        }
        tracing::debug!("Cabins resolved");
    }
}

/// Терминальное значение для того, что не закрыло ни одно правило
fn fill_residual<T, F>(records: &mut [Record], field: F, value: T) -> usize
where
    T: Clone,
    F: Fn(&mut Record) -> &mut Option<T>,
{
    let mut filled = 0;
    for record in records.iter_mut() {
        let slot = field(record);
        if slot.is_none() {
            *slot = Some(value.clone());
            filled += 1;
        }
    }
    filled
}
