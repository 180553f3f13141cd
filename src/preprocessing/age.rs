//! Заполнение возраста и возрастные группы

use crate::preprocessing::stats::median;
use crate::types::{AgeGroup, Record};

/// Возраст, если в выборке нет ни одного известного значения
pub const DEFAULT_AGE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeOutcome {
    pub median: Option<f64>,
    pub filled: usize,
}

/// Медиана считается один раз до любых изменений
pub fn resolve(records: &mut [Record]) -> AgeOutcome {
    let known: Vec<f64> = records.iter().filter_map(|r| r.age).collect();
    let population_median = median(&known);
    let fill = population_median.unwrap_or(DEFAULT_AGE);

    let mut filled = 0;
    for record in records.iter_mut() {
        let age = *record.age.get_or_insert_with(|| {
            filled += 1;
            fill
        });
        record.age_group = Some(AgeGroup::from_age(age));
    }

    AgeOutcome {
        median: population_median,
        filled,
    }
}
