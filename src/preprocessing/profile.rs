//! Профиль сырой таблицы: размер, пропуски, статистики числовых колонок

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::types::{RawRecord, RawTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub present: usize,
    pub missing: usize,
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

enum Column {
    Text(fn(&RawRecord) -> Option<&str>),
    Flag(fn(&RawRecord) -> Option<bool>),
    Number(fn(&RawRecord) -> Option<f64>),
}

fn columns() -> Vec<(&'static str, Column)> {
    vec![
        ("PassengerId", Column::Text(|r| Some(r.id.as_str()))),
        ("HomePlanet", Column::Text(|r| r.home_planet.as_deref())),
        ("CryoSleep", Column::Flag(|r| r.cryo_sleep)),
        ("Cabin", Column::Text(|r| r.cabin.as_deref())),
        ("Destination", Column::Text(|r| r.destination.as_deref())),
        ("Age", Column::Number(|r| r.age)),
        ("VIP", Column::Flag(|r| r.vip)),
        ("RoomService", Column::Number(|r| r.room_service)),
        ("FoodCourt", Column::Number(|r| r.food_court)),
        ("ShoppingMall", Column::Number(|r| r.shopping_mall)),
        ("Spa", Column::Number(|r| r.spa)),
        ("VRDeck", Column::Number(|r| r.vr_deck)),
        ("Name", Column::Text(|r| r.name.as_deref())),
        ("Transported", Column::Flag(|r| r.label)),
    ]
}

impl DataProfile {
    /// Колонки, которых нет в заголовке, в профиль не попадают
    pub fn of(table: &RawTable) -> Self {
        let columns = columns()
            .into_iter()
            .filter(|(name, _)| table.has_column(name))
            .map(|(name, column)| profile_column(name, &column, &table.rows))
            .collect();

        Self {
            rows: table.len(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn profile_column(name: &str, column: &Column, rows: &[RawRecord]) -> ColumnProfile {
    let (present, numeric) = match column {
        Column::Text(get) => (rows.iter().filter(|r| get(r).is_some()).count(), None),
        Column::Flag(get) => {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|r| get(r))
                .map(|v| if v { 1.0 } else { 0.0 })
                .collect();
            (values.len(), summarize(values))
        }
        Column::Number(get) => {
            let values: Vec<f64> = rows.iter().filter_map(|r| get(r)).collect();
            (values.len(), summarize(values))
        }
    };

    ColumnProfile {
        name: name.to_string(),
        present,
        missing: rows.len() - present,
        numeric,
    }
}

fn summarize(values: Vec<f64>) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }

    let values = Array1::from(values);
    let mean = values.mean()?;
    // Выборочное отклонение, как в describe()
    let std = if values.len() > 1 { values.std(1.0) } else { 0.0 };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(NumericSummary { mean, std, min, max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::test_support::{raw, table};

    #[test]
    fn profiles_missing_and_numeric_columns() {
        let mut a = raw("0001_01");
        a.age = Some(10.0);
        a.home_planet = Some("Earth".to_string());
        let mut b = raw("0002_01");
        b.age = Some(20.0);
        let c = raw("0003_01");

        let profile = DataProfile::of(&table(vec![a, b, c], false));
        assert_eq!(profile.rows, 3);

        let age = profile.column("Age").unwrap();
        assert_eq!(age.present, 2);
        assert_eq!(age.missing, 1);
        let summary = age.numeric.as_ref().unwrap();
        assert_eq!(summary.mean, 15.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 20.0);

        let planet = profile.column("HomePlanet").unwrap();
        assert_eq!(planet.missing, 2);
        assert!(planet.numeric.is_none());
        assert!(profile.column("Transported").is_none());
    }
}
