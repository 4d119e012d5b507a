use crate::types::Record;
use std::fs::File;
use std::path::Path;

/// Write the run's records as a pretty-printed JSON list.
pub fn write_json(path: &Path, records: &[Record]) -> crate::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, records)?;
    Ok(())
}

pub fn read_json(path: &Path) -> crate::Result<Vec<Record>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// Flat export for spreadsheet use: one row per price entry.
pub fn write_price_csv(path: &Path, records: &[Record]) -> crate::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Название", "Город", "Позиция", "Цена"])?;
    for record in records {
        for (position, price) in &record.prices {
            writer.write_record([
                record.name.as_str(),
                record.city.as_str(),
                position.as_str(),
                price.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
