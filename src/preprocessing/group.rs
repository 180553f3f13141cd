//! Группы попутчиков: размер группы и протяжка значений внутри группы

use std::collections::BTreeMap;

use crate::types::Record;

/// Индексы записей по группам; внутри группы порядок по номеру участника
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIndex {
    groups: BTreeMap<String, Vec<usize>>,
}

impl GroupIndex {
    pub fn build(records: &[Record]) -> Self {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            groups.entry(record.group_id.clone()).or_default().push(i);
        }

        for members in groups.values_mut() {
            // Сортировка стабильная: равные номера остаются в порядке объединения
            members.sort_by(|&a, &b| records[a].member.cmp(&records[b].member));
        }

        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &[usize]> {
        self.groups.values().map(Vec::as_slice)
    }
}

/// Заполнение пропусков ближайшим предыдущим значением в группе,
/// затем оставшихся ведущих пропусков ближайшим следующим.
///
/// Возвращает количество заполненных ячеек.
pub fn propagate<F>(records: &mut [Record], index: &GroupIndex, field: F) -> usize
where
    F: Fn(&mut Record) -> &mut Option<String>,
{
    let mut filled = 0;
    for members in index.members() {
        filled += fill_direction(records, members.iter().copied(), &field);
        filled += fill_direction(records, members.iter().rev().copied(), &field);
    }
    filled
}

fn fill_direction<I, F>(records: &mut [Record], order: I, field: &F) -> usize
where
    I: Iterator<Item = usize>,
    F: Fn(&mut Record) -> &mut Option<String>,
{
    let mut filled = 0;
    let mut last: Option<String> = None;
    for i in order {
        let slot = field(&mut records[i]);
        if let Some(value) = slot.as_ref() {
            last = Some(value.clone());
            continue;
        }
        if let Some(value) = &last {
            *slot = Some(value.clone());
            filled += 1;
        }
    }
    filled
}

/// Размер группы и протяжка планеты и компонентов каюты
pub fn resolve(records: &mut [Record], index: &GroupIndex) -> GroupOutcome {
    for members in index.members() {
        for &i in members {
            records[i].group_size = members.len();
        }
    }

    GroupOutcome {
        groups: index.len(),
        home_planet: propagate(records, index, |r| &mut r.home_planet),
        deck: propagate(records, index, |r| &mut r.deck),
        cabin_num: propagate(records, index, |r| &mut r.cabin_num),
        cabin_side: propagate(records, index, |r| &mut r.cabin_side),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub groups: usize,
    pub home_planet: usize,
    pub deck: usize,
    pub cabin_num: usize,
    pub cabin_side: usize,
}
