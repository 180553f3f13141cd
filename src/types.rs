/// Типы данных для конвейера признаков

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Колонки расходов в порядке входной таблицы
pub const SPEND_COLUMNS: [&str; 5] = ["RoomService", "FoodCourt", "ShoppingMall", "Spa", "VRDeck"];

pub const ID_COLUMN: &str = "PassengerId";
pub const LABEL_COLUMN: &str = "Transported";

/// Обязательные колонки обеих партиций (метка не входит)
pub const REQUIRED_COLUMNS: [&str; 13] = [
    ID_COLUMN,
    "HomePlanet",
    "CryoSleep",
    "Cabin",
    "Destination",
    "Age",
    "VIP",
    "RoomService",
    "FoodCourt",
    "ShoppingMall",
    "Spa",
    "VRDeck",
    "Name",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Labeled,
    Unlabeled,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Labeled => write!(f, "labeled"),
            Partition::Unlabeled => write!(f, "unlabeled"),
        }
    }
}

/// Строка входной таблицы как она есть
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "PassengerId")]
    pub id: String,
    #[serde(rename = "HomePlanet")]
    pub home_planet: Option<String>,
    #[serde(rename = "CryoSleep", default, deserialize_with = "de_flag")]
    pub cryo_sleep: Option<bool>,
    #[serde(rename = "Cabin")]
    pub cabin: Option<String>,
    #[serde(rename = "Destination")]
    pub destination: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    #[serde(rename = "VIP", default, deserialize_with = "de_flag")]
    pub vip: Option<bool>,
    #[serde(rename = "RoomService")]
    pub room_service: Option<f64>,
    #[serde(rename = "FoodCourt")]
    pub food_court: Option<f64>,
    #[serde(rename = "ShoppingMall")]
    pub shopping_mall: Option<f64>,
    #[serde(rename = "Spa")]
    pub spa: Option<f64>,
    #[serde(rename = "VRDeck")]
    pub vr_deck: Option<f64>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Transported", default, deserialize_with = "de_flag")]
    pub label: Option<bool>,
}

impl RawRecord {
    pub fn spend(&self) -> [Option<f64>; 5] {
        [
            self.room_service,
            self.food_court,
            self.shopping_mall,
            self.spa,
            self.vr_deck,
        ]
    }
}

/// Флаги во входных данных бывают "True"/"False", "true"/"false" или 1/0
fn de_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_flag(v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean '{v}'"))),
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Some(true),
        "false" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

/// Одна партиция: заголовок и строки в исходном порядке
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpendTier {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl SpendTier {
    pub const ALL: [SpendTier; 5] = [
        SpendTier::VeryLow,
        SpendTier::Low,
        SpendTier::Medium,
        SpendTier::High,
        SpendTier::VeryHigh,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SpendTier::VeryLow => "Very Low",
            SpendTier::Low => "Low",
            SpendTier::Medium => "Medium",
            SpendTier::High => "High",
            SpendTier::VeryHigh => "Very High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Baby,
    Child,
    Teenager,
    Adult,
    MiddleAged,
    Senior,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::Baby,
        AgeGroup::Child,
        AgeGroup::Teenager,
        AgeGroup::Adult,
        AgeGroup::MiddleAged,
        AgeGroup::Senior,
    ];

    /// Верхние границы включительно
    pub fn from_age(age: f64) -> Self {
        if age <= 4.0 {
            AgeGroup::Baby
        } else if age <= 12.0 {
            AgeGroup::Child
        } else if age <= 19.0 {
            AgeGroup::Teenager
        } else if age <= 40.0 {
            AgeGroup::Adult
        } else if age <= 60.0 {
            AgeGroup::MiddleAged
        } else {
            AgeGroup::Senior
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Baby => "Baby",
            AgeGroup::Child => "Child",
            AgeGroup::Teenager => "Teenager",
            AgeGroup::Adult => "Adult",
            AgeGroup::MiddleAged => "Middle Aged",
            AgeGroup::Senior => "Senior",
        }
    }
}

/// Запись внутри конвейера.
///
/// Метки здесь нет: она хранится в журнале происхождения объединения
/// и возвращается только при финальном разбиении.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub partition: Partition,
    pub offset: usize,
    pub home_planet: Option<String>,
    pub cryo_sleep: Option<bool>,
    pub cabin: Option<String>,
    pub destination: Option<String>,
    pub age: Option<f64>,
    pub vip: Option<bool>,
    pub spend: [Option<f64>; 5],
    pub name: Option<String>,

    pub total_spend: f64,
    pub spend_tier: Option<SpendTier>,
    pub age_group: Option<AgeGroup>,
    pub group_id: String,
    pub member: String,
    pub group_size: usize,
    pub family_name: Option<String>,
    pub family_size: usize,
    pub deck: Option<String>,
    pub cabin_num: Option<String>,
    pub cabin_number: Option<f64>,
    pub cabin_side: Option<String>,
}

impl Record {
    pub fn from_raw(raw: &RawRecord, partition: Partition, offset: usize) -> Self {
        let (group_id, member) = match raw.id.split_once('_') {
            Some((group, member)) => (group.to_string(), member.to_string()),
            None => (raw.id.clone(), String::new()),
        };

        Self {
            id: raw.id.clone(),
            partition,
            offset,
            home_planet: non_blank(&raw.home_planet),
            cryo_sleep: raw.cryo_sleep,
            cabin: non_blank(&raw.cabin),
            destination: non_blank(&raw.destination),
            age: raw.age.filter(|a| a.is_finite() && *a >= 0.0),
            vip: raw.vip,
            spend: raw.spend(),
            name: non_blank(&raw.name),
            total_spend: 0.0,
            spend_tier: None,
            age_group: None,
            group_id,
            member,
            group_size: 1,
            family_name: None,
            family_size: 1,
            deck: None,
            cabin_num: None,
            cabin_number: None,
            cabin_side: None,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Итоговая строка признаков: все гарантированные поля заполнены
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: String,
    pub home_planet: String,
    pub cryo_sleep: bool,
    pub destination: String,
    pub age: f64,
    pub vip: bool,
    pub spend: [f64; 5],
    pub total_spend: f64,
    pub spend_tier: SpendTier,
    pub age_group: AgeGroup,
    pub group_size: usize,
    pub family_size: usize,
    pub deck: String,
    pub cabin_num: f64,
    pub cabin_side: String,
}

/// Результат разбиения обратно на две партиции
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTables {
    pub labeled: Vec<FeatureRow>,
    pub labels: Vec<bool>,
    pub unlabeled: Vec<FeatureRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub id: String,
    pub transported: bool,
}
