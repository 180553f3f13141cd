//! Объединение размеченной и неразмеченной партиций

use std::collections::{BTreeSet, HashSet};

use crate::error::{PipelineError, Result};
use crate::types::{Partition, RawTable, Record, LABEL_COLUMN, REQUIRED_COLUMNS};

/// Журнал происхождения: размеры партиций и метки размеченных строк.
///
/// Метки живут только здесь, записи конвейера их не видят.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub labeled_len: usize,
    pub unlabeled_len: usize,
    pub labels: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTable {
    pub records: Vec<Record>,
    pub provenance: Provenance,
}

pub fn check_required_columns(table: &RawTable, partition: Partition) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch(format!(
            "{partition} partition is missing columns: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn field_set(table: &RawTable) -> BTreeSet<&str> {
    table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| *c != LABEL_COLUMN)
        .collect()
}

/// Размеченная партиция идёт первой, затем неразмеченная; смещения внутри
/// партиции сохраняются для обратного разбиения.
pub fn union(labeled: &RawTable, unlabeled: &RawTable) -> Result<UnifiedTable> {
    check_required_columns(labeled, Partition::Labeled)?;
    check_required_columns(unlabeled, Partition::Unlabeled)?;

    let labeled_fields = field_set(labeled);
    let unlabeled_fields = field_set(unlabeled);
    if labeled_fields != unlabeled_fields {
        let only_labeled: Vec<&str> = labeled_fields.difference(&unlabeled_fields).copied().collect();
        let only_unlabeled: Vec<&str> = unlabeled_fields.difference(&labeled_fields).copied().collect();
        return Err(PipelineError::SchemaMismatch(format!(
            "partitions differ: only labeled [{}], only unlabeled [{}]",
            only_labeled.join(", "),
            only_unlabeled.join(", ")
        )));
    }

    if !labeled.has_column(LABEL_COLUMN) {
        return Err(PipelineError::SchemaMismatch(format!(
            "labeled partition has no '{LABEL_COLUMN}' column"
        )));
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(labeled.len() + unlabeled.len());
    let mut records = Vec::with_capacity(labeled.len() + unlabeled.len());
    let mut labels = Vec::with_capacity(labeled.len());

    for (offset, raw) in labeled.rows.iter().enumerate() {
        if !seen.insert(raw.id.as_str()) {
            return Err(PipelineError::DuplicateId(raw.id.clone()));
        }
        let label = raw
            .label
            .ok_or_else(|| PipelineError::MissingLabel { id: raw.id.clone() })?;
        labels.push(label);
        records.push(Record::from_raw(raw, Partition::Labeled, offset));
    }

    // Метка неразмеченной партиции (если колонка есть) отбрасывается
    for (offset, raw) in unlabeled.rows.iter().enumerate() {
        if !seen.insert(raw.id.as_str()) {
            return Err(PipelineError::DuplicateId(raw.id.clone()));
        }
        records.push(Record::from_raw(raw, Partition::Unlabeled, offset));
    }

    tracing::debug!(
        "Union: {} labeled + {} unlabeled records",
        labeled.len(),
        unlabeled.len()
    );

    Ok(UnifiedTable {
        records,
        provenance: Provenance {
            labeled_len: labeled.len(),
            unlabeled_len: unlabeled.len(),
            labels,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::test_support::{raw, table};

    #[test]
    fn union_keeps_order_and_offsets() {
        let labeled = table(vec![raw("0001_01"), raw("0002_01")], true);
        let unlabeled = table(vec![raw("0003_01")], false);

        let unified = union(&labeled, &unlabeled).unwrap();
        let ids: Vec<&str> = unified.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0001_01", "0002_01", "0003_01"]);
        assert_eq!(unified.records[1].offset, 1);
        assert_eq!(unified.records[2].partition, Partition::Unlabeled);
        assert_eq!(unified.records[2].offset, 0);
        assert_eq!(unified.provenance.labeled_len, 2);
        assert_eq!(unified.provenance.unlabeled_len, 1);
        assert_eq!(unified.provenance.labels.len(), 2);
    }

    #[test]
    fn union_rejects_missing_columns() {
        let labeled = table(vec![raw("0001_01")], true);
        let mut unlabeled = table(vec![raw("0002_01")], false);
        unlabeled.columns.retain(|c| c != "Cabin");

        let err = union(&labeled, &unlabeled).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(msg) if msg.contains("Cabin")));
    }

    #[test]
    fn union_rejects_differing_field_sets() {
        let labeled = table(vec![raw("0001_01")], true);
        let mut unlabeled = table(vec![raw("0002_01")], false);
        unlabeled.columns.push("Extra".to_string());

        assert!(matches!(
            union(&labeled, &unlabeled),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn union_rejects_duplicate_ids() {
        let labeled = table(vec![raw("0001_01")], true);
        let unlabeled = table(vec![raw("0001_01")], false);

        assert!(matches!(
            union(&labeled, &unlabeled),
            Err(PipelineError::DuplicateId(id)) if id == "0001_01"
        ));
    }

    #[test]
    fn union_requires_labels_on_labeled_rows() {
        let mut labeled = table(vec![raw("0001_01")], true);
        labeled.rows[0].label = None;
        let unlabeled = table(vec![], false);

        assert!(matches!(
            union(&labeled, &unlabeled),
            Err(PipelineError::MissingLabel { .. })
        ));
    }
}
