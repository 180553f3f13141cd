//! Суммарные расходы и уровни расходов

use crate::preprocessing::stats::quantile;
use crate::types::{Record, SpendTier};

const TIER_QUANTILES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Пропущенные статьи расходов считаются нулём
pub fn aggregate(records: &mut [Record]) {
    for record in records.iter_mut() {
        record.total_spend = record
            .spend
            .iter()
            .map(|s| s.unwrap_or(0.0).max(0.0))
            .sum();
    }

    let bins = TierBins::fit(records.iter().map(|r| r.total_spend));
    for record in records.iter_mut() {
        record.spend_tier = bins.as_ref().map(|b| b.tier(record.total_spend));
    }
}

/// Границы квантильных корзин по всей объединённой выборке.
///
/// Совпадающие границы (много нулевых расходов) схлопываются; корзина
/// получает уровень первой квантильной позиции своей нижней границы.
#[derive(Debug, Clone, PartialEq)]
pub struct TierBins {
    edges: Vec<f64>,
    tiers: Vec<SpendTier>,
}

impl TierBins {
    pub fn fit(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let raw_edges: Vec<f64> = TIER_QUANTILES
            .iter()
            .filter_map(|&q| quantile(&sorted, q))
            .collect();

        // (значение, первая позиция среди квантилей)
        let mut unique: Vec<(f64, usize)> = Vec::with_capacity(raw_edges.len());
        for (pos, &edge) in raw_edges.iter().enumerate() {
            if unique.last().map_or(true, |&(last, _)| edge > last) {
                unique.push((edge, pos));
            }
        }

        let edges: Vec<f64> = unique.iter().map(|&(e, _)| e).collect();
        let tiers: Vec<SpendTier> = if unique.len() == 1 {
            vec![SpendTier::VeryLow]
        } else {
            unique[..unique.len() - 1]
                .iter()
                .map(|&(_, pos)| SpendTier::from_index(pos))
                .collect()
        };

        Some(Self { edges, tiers })
    }

    pub fn bin_count(&self) -> usize {
        self.tiers.len()
    }

    /// Правые границы включительно, нижняя граница первой корзины тоже
    pub fn tier(&self, value: f64) -> SpendTier {
        for (i, tier) in self.tiers.iter().enumerate() {
            if let Some(&upper) = self.edges.get(i + 1) {
                if value <= upper {
                    return *tier;
                }
            }
        }
        self.tiers.last().copied().unwrap_or(SpendTier::VeryLow)
    }
}
