//! Разбор каюты на палубу, номер и борт

use crate::error::{PipelineError, Result};
use crate::preprocessing::stats::{median, mode};
use crate::types::Record;

/// Значение категории, если в выборке нет ни одного известного
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Пустой компонент остаётся `None` и заполняется позже
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabinParts {
    pub deck: Option<String>,
    pub num: Option<String>,
    pub side: Option<String>,
}

fn component(value: &str) -> Option<String> {
    Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Ровно три компонента через `/`
pub fn parse(id: &str, cabin: &str) -> Result<CabinParts> {
    let parts: Vec<&str> = cabin.split('/').collect();
    match parts.as_slice() {
        [deck, num, side] => Ok(CabinParts {
            deck: component(deck),
            num: component(num),
            side: component(side),
        }),
        _ => Err(PipelineError::MalformedCabin {
            id: id.to_string(),
            cabin: cabin.to_string(),
        }),
    }
}

/// Разбор до протяжки по группам; битая каюта оставляет компоненты пустыми.
///
/// Возвращает количество некорректных строк.
pub fn decompose(records: &mut [Record]) -> usize {
    let mut malformed = 0;
    for record in records.iter_mut() {
        let Some(cabin) = record.cabin.as_deref() else {
            continue;
        };

        match parse(&record.id, cabin) {
            Ok(parts) => {
                record.deck = parts.deck;
                record.cabin_num = parts.num;
                record.cabin_side = parts.side;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                malformed += 1;
            }
        }
    }
    malformed
}

#[derive(Debug, Clone, PartialEq)]
pub struct CabinOutcome {
    pub deck_filled: usize,
    pub side_filled: usize,
    pub num_filled: usize,
    pub num_median: Option<f64>,
    pub deck_fallback: Option<String>,
    pub side_fallback: Option<String>,
}

/// Финальные значения после протяжки по группам: палуба и борт по моде
/// выборки, номер приводится к числу, остаток по медиане приведённых.
pub fn finish(records: &mut [Record]) -> CabinOutcome {
    let deck_mode = mode(records.iter().filter_map(|r| r.deck.as_ref()));
    let side_mode = mode(records.iter().filter_map(|r| r.cabin_side.as_ref()));

    let deck_filled = fill_missing(records, |r| &mut r.deck, deck_mode.as_deref());
    let side_filled = fill_missing(records, |r| &mut r.cabin_side, side_mode.as_deref());

    for record in records.iter_mut() {
        record.cabin_number = record
            .cabin_num
            .as_deref()
            .and_then(|n| n.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite());
    }

    let coerced: Vec<f64> = records.iter().filter_map(|r| r.cabin_number).collect();
    let num_median = median(&coerced);
    let mut num_filled = 0;
    for record in records.iter_mut() {
        if record.cabin_number.is_none() {
            record.cabin_number = Some(num_median.unwrap_or(0.0));
            num_filled += 1;
        }
    }

    CabinOutcome {
        deck_filled,
        side_filled,
        num_filled,
        num_median,
        deck_fallback: deck_mode,
        side_fallback: side_mode,
    }
}

fn fill_missing<F>(records: &mut [Record], field: F, fallback: Option<&str>) -> usize
where
    F: Fn(&mut Record) -> &mut Option<String>,
{
    let value = fallback.unwrap_or(UNKNOWN_CATEGORY);
    let mut filled = 0;
    for record in records.iter_mut() {
        let slot = field(record);
        if slot.is_none() {
            *slot = Some(value.to_string());
            filled += 1;
        }
    }
    filled
}
