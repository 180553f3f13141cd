//! Чтение и запись CSV-таблиц

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::preprocessing::FlagEncoding;
use crate::types::{
    FeatureRow, PredictionRow, RawRecord, RawTable, ID_COLUMN, LABEL_COLUMN, SPEND_COLUMNS,
};

pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    // Без идентификатора строки не десериализуются, схема проверяется раньше
    if !columns.iter().any(|c| c == ID_COLUMN) {
        return Err(PipelineError::SchemaMismatch(format!(
            "table is missing columns: {ID_COLUMN}"
        )));
    }

    let mut rows = Vec::new();
    for row in rdr.deserialize::<RawRecord>() {
        rows.push(row?);
    }

    Ok(RawTable { columns, rows })
}

pub fn read_table_from_path(path: impl AsRef<Path>) -> Result<RawTable> {
    let file = File::open(path.as_ref())?;
    let table = read_table(file)?;
    tracing::info!(
        "Loaded {} rows from {}",
        table.len(),
        path.as_ref().display()
    );
    Ok(table)
}

fn feature_header(with_label: bool) -> Vec<&'static str> {
    let mut header = vec![ID_COLUMN, "HomePlanet", "CryoSleep", "Destination", "Age", "VIP"];
    header.extend(SPEND_COLUMNS);
    header.extend([
        "TotalSpending",
        "SpendingGroup",
        "AgeGroup",
        "GroupSize",
        "FamilySize",
        "Deck",
        "Num",
        "Side",
    ]);
    if with_label {
        header.push(LABEL_COLUMN);
    }
    header
}

/// Метки пишутся последней колонкой, если переданы
pub fn write_features<W: Write>(
    writer: W,
    rows: &[FeatureRow],
    labels: Option<&[bool]>,
    encoding: FlagEncoding,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(feature_header(labels.is_some()))?;

    for (i, row) in rows.iter().enumerate() {
        let mut record: Vec<String> = vec![
            row.id.clone(),
            row.home_planet.clone(),
            encoding.render(row.cryo_sleep).to_string(),
            row.destination.clone(),
            row.age.to_string(),
            encoding.render(row.vip).to_string(),
        ];
        record.extend(row.spend.iter().map(f64::to_string));
        record.extend([
            row.total_spend.to_string(),
            row.spend_tier.label().to_string(),
            row.age_group.label().to_string(),
            row.group_size.to_string(),
            row.family_size.to_string(),
            row.deck.clone(),
            row.cabin_num.to_string(),
            row.cabin_side.clone(),
        ]);
        if let Some(label) = labels.and_then(|l| l.get(i)) {
            record.push(FlagEncoding::Boolean.render(*label).to_string());
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_predictions<W: Write>(writer: W, predictions: &[PredictionRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([ID_COLUMN, LABEL_COLUMN])?;
    for prediction in predictions {
        wtr.write_record([
            prediction.id.as_str(),
            FlagEncoding::Boolean.render(prediction.transported),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn features_to_string(
    rows: &[FeatureRow],
    labels: Option<&[bool]>,
    encoding: FlagEncoding,
) -> Result<String> {
    let mut buf = Vec::new();
    write_features(&mut buf, rows, labels, encoding)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
