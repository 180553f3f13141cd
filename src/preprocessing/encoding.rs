//! Кодирование строк признаков в матрицу для классификатора

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::types::{FeatureRow, SPEND_COLUMNS};

/// Числовые колонки перед one-hot блоками
const NUMERIC_COLUMNS: [&str; 9] = [
    "CryoSleep",
    "Age",
    "VIP",
    "TotalSpending",
    "SpendingGroup",
    "AgeGroup",
    "GroupSize",
    "FamilySize",
    "Num",
];

/// Словари категорий фиксируются один раз по обеим партициям (без меток),
/// поэтому набор колонок одинаков для `fit` и каждого `predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    home_planets: Vec<String>,
    destinations: Vec<String>,
    decks: Vec<String>,
    sides: Vec<String>,
}

impl FeatureEncoder {
    pub fn fit<'a>(rows: impl IntoIterator<Item = &'a FeatureRow>) -> Self {
        let mut home_planets = BTreeSet::new();
        let mut destinations = BTreeSet::new();
        let mut decks = BTreeSet::new();
        let mut sides = BTreeSet::new();

        for row in rows {
            home_planets.insert(row.home_planet.clone());
            destinations.insert(row.destination.clone());
            decks.insert(row.deck.clone());
            sides.insert(row.cabin_side.clone());
        }

        Self {
            home_planets: home_planets.into_iter().collect(),
            destinations: destinations.into_iter().collect(),
            decks: decks.into_iter().collect(),
            sides: sides.into_iter().collect(),
        }
    }

    pub fn n_features(&self) -> usize {
        NUMERIC_COLUMNS.len()
            + SPEND_COLUMNS.len()
            + self.home_planets.len()
            + self.destinations.len()
            + self.decks.len()
            + self.sides.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        names.extend(SPEND_COLUMNS.iter().map(|c| c.to_string()));
        names.extend(self.home_planets.iter().map(|v| format!("HomePlanet={v}")));
        names.extend(self.destinations.iter().map(|v| format!("Destination={v}")));
        names.extend(self.decks.iter().map(|v| format!("Deck={v}")));
        names.extend(self.sides.iter().map(|v| format!("Side={v}")));
        names
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let mut features = Array2::zeros((rows.len(), self.n_features()));

        for (i, row) in rows.iter().enumerate() {
            let mut feature_idx = 0;

            // Флаги всегда 0/1
            features[[i, feature_idx]] = flag(row.cryo_sleep);
            feature_idx += 1;
            features[[i, feature_idx]] = row.age;
            feature_idx += 1;
            features[[i, feature_idx]] = flag(row.vip);
            feature_idx += 1;
            features[[i, feature_idx]] = row.total_spend;
            feature_idx += 1;

            // Порядковые
            features[[i, feature_idx]] = row.spend_tier.ordinal() as f64;
            feature_idx += 1;
            features[[i, feature_idx]] = row.age_group.ordinal() as f64;
            feature_idx += 1;

            features[[i, feature_idx]] = row.group_size as f64;
            feature_idx += 1;
            features[[i, feature_idx]] = row.family_size as f64;
            feature_idx += 1;
            features[[i, feature_idx]] = row.cabin_num;
            feature_idx += 1;

            for amount in row.spend {
                features[[i, feature_idx]] = amount;
                feature_idx += 1;
            }

            // One-hot; неизвестная категория даёт нулевой блок
            for (vocabulary, value) in [
                (&self.home_planets, &row.home_planet),
                (&self.destinations, &row.destination),
                (&self.decks, &row.deck),
                (&self.sides, &row.cabin_side),
            ] {
                if let Ok(pos) = vocabulary.binary_search(value) {
                    features[[i, feature_idx + pos]] = 1.0;
                }
                feature_idx += vocabulary.len();
            }
        }

        features
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
