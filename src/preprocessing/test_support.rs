//! Конструкторы записей для тестов стадий

use crate::types::{Partition, RawRecord, RawTable, Record, LABEL_COLUMN, REQUIRED_COLUMNS};

pub fn raw(id: &str) -> RawRecord {
    RawRecord {
        id: id.to_string(),
        ..RawRecord::default()
    }
}

/// Размеченной таблице недостающие метки проставляются как `false`
pub fn table(mut rows: Vec<RawRecord>, labeled: bool) -> RawTable {
    let mut columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    if labeled {
        columns.push(LABEL_COLUMN.to_string());
        for row in rows.iter_mut() {
            row.label.get_or_insert(false);
        }
    }
    RawTable { columns, rows }
}

pub fn record(id: &str) -> Record {
    Record::from_raw(&raw(id), Partition::Labeled, 0)
}

/// Запись, прошедшая все стадии заполнения
pub fn complete_record(id: &str, partition: Partition, offset: usize) -> Record {
    let mut record = Record::from_raw(&raw(id), partition, offset);
    record.home_planet = Some("Earth".to_string());
    record.cryo_sleep = Some(false);
    record.destination = Some("TRAPPIST-1e".to_string());
    record.age = Some(24.0);
    record.age_group = Some(crate::types::AgeGroup::Adult);
    record.vip = Some(false);
    record.spend_tier = Some(crate::types::SpendTier::VeryLow);
    record.deck = Some("F".to_string());
    record.cabin_num = Some("1".to_string());
    record.cabin_number = Some(1.0);
    record.cabin_side = Some("S".to_string());
    record
}
