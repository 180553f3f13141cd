//! Финальная схема и обратное разбиение на партиции

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::preprocessing::union::Provenance;
use crate::types::{FeatureRow, FeatureTables, Partition, Record};

/// Кодирование флагов `CryoSleep`/`VIP` в выгружаемой таблице.
///
/// Матрица признаков для классификатора всегда использует 0/1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlagEncoding {
    #[default]
    Numeric,
    Boolean,
}

impl FlagEncoding {
    pub fn render(self, flag: bool) -> &'static str {
        match (self, flag) {
            (FlagEncoding::Numeric, true) => "1",
            (FlagEncoding::Numeric, false) => "0",
            (FlagEncoding::Boolean, true) => "True",
            (FlagEncoding::Boolean, false) => "False",
        }
    }
}

fn require<T>(value: Option<T>, id: &str, field: &'static str) -> Result<T> {
    value.ok_or_else(|| PipelineError::IncompleteRecord {
        id: id.to_string(),
        field,
    })
}

/// Имя, каюта, фамилия и номер группы отбрасываются здесь
pub fn feature_row(record: Record) -> Result<FeatureRow> {
    let id = record.id;
    Ok(FeatureRow {
        home_planet: require(record.home_planet, &id, "home_planet")?,
        cryo_sleep: require(record.cryo_sleep, &id, "cryo_sleep")?,
        destination: require(record.destination, &id, "destination")?,
        age: require(record.age, &id, "age")?,
        vip: require(record.vip, &id, "vip")?,
        spend: record.spend.map(|s| s.unwrap_or(0.0).max(0.0)),
        total_spend: record.total_spend,
        spend_tier: require(record.spend_tier, &id, "spend_tier")?,
        age_group: require(record.age_group, &id, "age_group")?,
        group_size: record.group_size,
        family_size: record.family_size,
        deck: require(record.deck, &id, "deck")?,
        cabin_num: require(record.cabin_number, &id, "cabin_num")?,
        cabin_side: require(record.cabin_side, &id, "cabin_side")?,
        id,
    })
}

/// Разбиение по метке происхождения; порядок восстанавливается по смещению
pub fn split(records: Vec<Record>, provenance: &Provenance) -> Result<FeatureTables> {
    let mut labeled: Vec<Option<FeatureRow>> = vec![None; provenance.labeled_len];
    let mut unlabeled: Vec<Option<FeatureRow>> = vec![None; provenance.unlabeled_len];
    let mut labeled_seen = 0;
    let mut unlabeled_seen = 0;

    for record in records {
        let (slots, seen) = match record.partition {
            Partition::Labeled => (&mut labeled, &mut labeled_seen),
            Partition::Unlabeled => (&mut unlabeled, &mut unlabeled_seen),
        };
        *seen += 1;

        let partition = record.partition;
        let offset = record.offset;
        let rows = slots.len();
        let Some(slot) = slots.get_mut(offset).filter(|s| s.is_none()) else {
            return Err(PipelineError::OffsetConflict {
                partition,
                offset,
                rows,
            });
        };
        *slot = Some(feature_row(record)?);
    }

    let labeled = collect_partition(labeled, Partition::Labeled, labeled_seen)?;
    let unlabeled = collect_partition(unlabeled, Partition::Unlabeled, unlabeled_seen)?;

    if provenance.labels.len() != labeled.len() {
        return Err(PipelineError::SplitMismatch {
            partition: Partition::Labeled,
            expected: labeled.len(),
            actual: provenance.labels.len(),
        });
    }

    Ok(FeatureTables {
        labeled,
        labels: provenance.labels.clone(),
        unlabeled,
    })
}

fn collect_partition(
    slots: Vec<Option<FeatureRow>>,
    partition: Partition,
    seen: usize,
) -> Result<Vec<FeatureRow>> {
    let expected = slots.len();
    let rows: Vec<FeatureRow> = slots.into_iter().flatten().collect();
    if rows.len() != expected || seen != expected {
        return Err(PipelineError::SplitMismatch {
            partition,
            expected,
            actual: seen,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::test_support::complete_record;

    fn provenance(labeled: usize, unlabeled: usize) -> Provenance {
        Provenance {
            labeled_len: labeled,
            unlabeled_len: unlabeled,
            labels: vec![true; labeled],
        }
    }

    #[test]
    fn split_restores_offsets() {
        let mut a = complete_record("0001_01", Partition::Labeled, 1);
        a.age = Some(30.0);
        let b = complete_record("0002_01", Partition::Labeled, 0);
        let c = complete_record("0003_01", Partition::Unlabeled, 0);

        let tables = split(vec![a, c, b], &provenance(2, 1)).unwrap();
        let ids: Vec<&str> = tables.labeled.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0002_01", "0001_01"]);
        assert_eq!(tables.unlabeled.len(), 1);
        assert_eq!(tables.labels, vec![true, true]);
    }

    #[test]
    fn split_detects_size_mismatch() {
        let a = complete_record("0001_01", Partition::Labeled, 0);
        let err = split(vec![a], &provenance(2, 0)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SplitMismatch {
                partition: Partition::Labeled,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn split_detects_offset_out_of_range() {
        let a = complete_record("0001_01", Partition::Unlabeled, 5);
        assert!(matches!(
            split(vec![a], &provenance(0, 1)),
            Err(PipelineError::OffsetConflict {
                partition: Partition::Unlabeled,
                offset: 5,
                rows: 1
            })
        ));
    }

    #[test]
    fn split_detects_repeated_offset() {
        let a = complete_record("0001_01", Partition::Labeled, 0);
        let b = complete_record("0002_01", Partition::Labeled, 0);
        assert!(matches!(
            split(vec![a, b], &provenance(2, 0)),
            Err(PipelineError::OffsetConflict {
                partition: Partition::Labeled,
                offset: 0,
                rows: 2
            })
        ));
    }

    #[test]
    fn incomplete_record_is_fatal() {
        let mut a = complete_record("0001_01", Partition::Labeled, 0);
        a.deck = None;
        assert!(matches!(
            split(vec![a], &provenance(1, 0)),
            Err(PipelineError::IncompleteRecord { field: "deck", .. })
        ));
    }

    #[test]
    fn flag_encodings_render() {
        assert_eq!(FlagEncoding::Numeric.render(true), "1");
        assert_eq!(FlagEncoding::Boolean.render(false), "False");
    }
}
