//! Условное заполнение пропусков упорядоченными правилами
//!
//! Правило: предикат + значение. Для каждого поля правила проверяются по
//! порядку, срабатывает первое подходящее и только там, где поле ещё пусто.

use serde::{Deserialize, Serialize};

use crate::preprocessing::stats::mode;
use crate::types::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    SpendPositive,
    SpendZero,
    AgeAtMost { age: f64 },
    HomePlanetIs { planet: String },
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::SpendPositive => record.total_spend > 0.0,
            Predicate::SpendZero => record.total_spend == 0.0,
            Predicate::AgeAtMost { age } => record.age.is_some_and(|a| a <= *age),
            Predicate::HomePlanetIs { planet } => record.home_planet.as_deref() == Some(planet.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill<T> {
    Value(T),
    /// Самое частое значение поля по объединённой выборке
    PopulationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule<T> {
    #[serde(flatten)]
    pub when: Predicate,
    pub fill: Fill<T>,
}

impl<T> Rule<T> {
    pub fn new(when: Predicate, fill: Fill<T>) -> Self {
        Self { when, fill }
    }

    pub fn value(when: Predicate, value: T) -> Self {
        Self::new(when, Fill::Value(value))
    }
}

/// Политика заполнения по полям
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationPolicy {
    #[serde(default = "default_cryo_sleep_rules")]
    pub cryo_sleep: Vec<Rule<bool>>,
    #[serde(default = "default_vip_rules")]
    pub vip: Vec<Rule<bool>>,
    #[serde(default = "default_destination_rules")]
    pub destination: Vec<Rule<String>>,
}

fn default_cryo_sleep_rules() -> Vec<Rule<bool>> {
    vec![
        Rule::value(Predicate::SpendPositive, false),
        Rule::value(Predicate::SpendZero, true),
        Rule::value(Predicate::Always, false),
    ]
}

fn default_vip_rules() -> Vec<Rule<bool>> {
    vec![
        Rule::value(Predicate::SpendZero, false),
        Rule::value(Predicate::AgeAtMost { age: 19.0 }, false),
        Rule::value(
            Predicate::HomePlanetIs {
                planet: "Earth".to_string(),
            },
            false,
        ),
        Rule::value(Predicate::Always, false),
    ]
}

fn default_destination_rules() -> Vec<Rule<String>> {
    vec![Rule::new(Predicate::Always, Fill::PopulationMode)]
}

impl Default for ImputationPolicy {
    fn default() -> Self {
        Self {
            cryo_sleep: default_cryo_sleep_rules(),
            vip: default_vip_rules(),
            destination: default_destination_rules(),
        }
    }
}

/// Итог применения правил к одному полю
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Сколько записей заполнило каждое правило, по порядку
    pub fired: Vec<usize>,
    /// Сколько записей осталось пустыми
    pub unresolved: usize,
}

impl RuleOutcome {
    pub fn filled(&self) -> usize {
        self.fired.iter().sum()
    }
}

/// Один проход интерпретатора правил по всем записям.
///
/// Значения `PopulationMode` считаются один раз до прохода.
pub fn apply_rules<T, G, S>(records: &mut [Record], rules: &[Rule<T>], get: G, slot: S) -> RuleOutcome
where
    T: Ord + Clone,
    G: Fn(&Record) -> Option<&T>,
    S: Fn(&mut Record) -> &mut Option<T>,
{
    let population_mode: Option<T> = if rules.iter().any(|r| matches!(r.fill, Fill::PopulationMode)) {
        mode(records.iter().filter_map(&get))
    } else {
        None
    };

    let resolved: Vec<Option<T>> = rules
        .iter()
        .map(|rule| match &rule.fill {
            Fill::Value(v) => Some(v.clone()),
            Fill::PopulationMode => population_mode.clone(),
        })
        .collect();

    let mut outcome = RuleOutcome {
        fired: vec![0; rules.len()],
        unresolved: 0,
    };

    for record in records.iter_mut() {
        if get(&*record).is_some() {
            continue;
        }

        let hit = rules
            .iter()
            .zip(&resolved)
            .enumerate()
            .find(|(_, (rule, value))| value.is_some() && rule.when.matches(&*record));

        match hit {
            Some((i, (_, value))) => {
                *slot(record) = value.clone();
                outcome.fired[i] += 1;
            }
            None => outcome.unresolved += 1,
        }
    }

    outcome
}
