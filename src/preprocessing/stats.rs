//! Популяционные статистики для заполнения пропусков

use std::collections::BTreeMap;

/// Медиана; среднее двух центральных значений при чётном количестве
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Квантиль с линейной интерполяцией по отсортированным значениям
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Самое частое значение; при равенстве побеждает наименьшее в порядке `Ord`
pub fn mode<'a, T, I>(values: I) -> Option<T>
where
    T: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&T, usize)> = None;
    for (value, count) in counts {
        // BTreeMap обходится по возрастанию, поэтому строгое сравнение
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn quantile_interpolates() {
        let sorted = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(quantile(&sorted, 0.0), Some(0.0));
        assert_eq!(quantile(&sorted, 0.5), Some(20.0));
        assert_eq!(quantile(&sorted, 0.2), Some(8.0));
        assert_eq!(quantile(&sorted, 1.0), Some(40.0));
    }

    #[test]
    fn mode_breaks_ties_lexically() {
        let values = vec!["Mars".to_string(), "Earth".to_string(), "Mars".to_string(), "Earth".to_string()];
        assert_eq!(mode(&values), Some("Earth".to_string()));

        let values = vec!["Europa".to_string(), "Mars".to_string(), "Mars".to_string()];
        assert_eq!(mode(&values), Some("Mars".to_string()));

        let empty: Vec<String> = Vec::new();
        assert_eq!(mode(&empty), None);
    }
}
