//! Фамилии: размер семьи и планета по фамилии

use std::collections::BTreeMap;

use crate::preprocessing::cabin::UNKNOWN_CATEGORY;
use crate::preprocessing::group::{propagate, GroupIndex};
use crate::preprocessing::stats::mode;
use crate::types::Record;

/// Последнее слово имени
pub fn family_name(name: &str) -> Option<String> {
    name.split_whitespace().last().map(str::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityOutcome {
    pub family_names_propagated: usize,
    pub families: usize,
    pub planet_from_family: usize,
    pub planet_from_population: usize,
    pub planet_fallback: Option<String>,
}

pub fn resolve(records: &mut [Record], index: &GroupIndex) -> IdentityOutcome {
    for record in records.iter_mut() {
        record.family_name = record.name.as_deref().and_then(family_name);
    }
    let family_names_propagated = propagate(records, index, |r| &mut r.family_name);

    let mut family_counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in records.iter().filter_map(|r| r.family_name.as_ref()) {
        *family_counts.entry(name.clone()).or_insert(0) += 1;
    }
    for record in records.iter_mut() {
        record.family_size = record
            .family_name
            .as_ref()
            .and_then(|n| family_counts.get(n).copied())
            .unwrap_or(1);
    }

    let family_planets = family_planet_map(records);
    let mut planet_from_family = 0;
    for record in records.iter_mut() {
        if record.home_planet.is_some() {
            continue;
        }
        let planet = record
            .family_name
            .as_ref()
            .and_then(|n| family_planets.get(n));
        if let Some(planet) = planet {
            record.home_planet = Some(planet.clone());
            planet_from_family += 1;
        }
    }

    let population_planet = mode(records.iter().filter_map(|r| r.home_planet.as_ref()));
    let fallback = population_planet.as_deref().unwrap_or(UNKNOWN_CATEGORY);
    let mut planet_from_population = 0;
    for record in records.iter_mut() {
        if record.home_planet.is_none() {
            record.home_planet = Some(fallback.to_string());
            planet_from_population += 1;
        }
    }

    IdentityOutcome {
        family_names_propagated,
        families: family_counts.len(),
        planet_from_family,
        planet_from_population,
        planet_fallback: population_planet,
    }
}

/// Фамилия → самая частая планета среди записей, где известны оба поля
pub fn family_planet_map(records: &[Record]) -> BTreeMap<String, String> {
    let mut planets_by_family: BTreeMap<&str, Vec<&String>> = BTreeMap::new();
    for record in records {
        if let (Some(family), Some(planet)) = (&record.family_name, &record.home_planet) {
            planets_by_family.entry(family.as_str()).or_default().push(planet);
        }
    }

    planets_by_family
        .into_iter()
        .filter_map(|(family, planets)| {
            mode(planets.iter().copied()).map(|planet| (family.to_string(), planet))
        })
        .collect()
}
