use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    BeneficiaryNeed, InventoryLot, InventorySnapshot, LotCategory, LotId, NeedId, NeedPriority,
};

#[derive(Debug)]
pub enum SnapshotImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, message: String },
}

impl std::fmt::Display for SnapshotImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotImportError::Io(err) => write!(f, "failed to read snapshot: {}", err),
            SnapshotImportError::Csv(err) => write!(f, "invalid snapshot CSV data: {}", err),
            SnapshotImportError::InvalidRow { line, message } => {
                write!(f, "invalid snapshot row on line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for SnapshotImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotImportError::Io(err) => Some(err),
            SnapshotImportError::Csv(err) => Some(err),
            SnapshotImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for SnapshotImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SnapshotImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads lots and needs from CSV exports, keeping row order.
pub struct SnapshotImporter;

impl SnapshotImporter {
    pub fn from_paths<L: AsRef<Path>, N: AsRef<Path>>(
        lots: L,
        needs: N,
    ) -> Result<InventorySnapshot, SnapshotImportError> {
        let lots = Self::lots_from_reader(std::fs::File::open(lots)?)?;
        let needs = Self::needs_from_reader(std::fs::File::open(needs)?)?;
        Ok(InventorySnapshot { lots, needs })
    }

    pub fn lots_from_reader<R: Read>(reader: R) -> Result<Vec<InventoryLot>, SnapshotImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut lots = Vec::new();

        for (index, record) in csv_reader.deserialize::<LotRow>().enumerate() {
            let row = record?;
            lots.push(row.into_lot(data_line(index))?);
        }

        Ok(lots)
    }

    pub fn needs_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<BeneficiaryNeed>, SnapshotImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut needs = Vec::new();

        for (index, record) in csv_reader.deserialize::<NeedRow>().enumerate() {
            let row = record?;
            needs.push(row.into_need(data_line(index))?);
        }

        Ok(needs)
    }
}

// Header occupies line 1.
fn data_line(index: usize) -> u64 {
    index as u64 + 2
}

#[derive(Debug, Deserialize)]
struct LotRow {
    id: String,
    item_name: String,
    #[serde(default)]
    category: String,
    quantity: u32,
    unit: String,
    #[serde(default)]
    donor: String,
    expires_at: String,
    received_at: String,
    #[serde(default, deserialize_with = "tag_list")]
    dietary_tags: Vec<String>,
}

impl LotRow {
    fn into_lot(self, line: u64) -> Result<InventoryLot, SnapshotImportError> {
        let expires_at = required_timestamp(&self.expires_at, "expires_at", line)?;
        let received_at = required_timestamp(&self.received_at, "received_at", line)?;

        Ok(InventoryLot::new(
            LotId(self.id),
            self.item_name,
            LotCategory::from_label(&self.category),
            self.quantity,
            self.unit,
            self.donor,
            expires_at,
            received_at,
        )
        .with_dietary_tags(self.dietary_tags))
    }
}

#[derive(Debug, Deserialize)]
struct NeedRow {
    id: String,
    beneficiary_name: String,
    item_name: String,
    quantity_needed: u32,
    unit: String,
    priority: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    capacity: Option<u32>,
    #[serde(default)]
    current_stock: Option<u32>,
    #[serde(default, deserialize_with = "tag_list")]
    dietary_requirements: Vec<String>,
}

impl NeedRow {
    fn into_need(self, line: u64) -> Result<BeneficiaryNeed, SnapshotImportError> {
        let priority =
            NeedPriority::from_label(&self.priority).ok_or_else(|| SnapshotImportError::InvalidRow {
                line,
                message: format!("unknown priority '{}'", self.priority),
            })?;

        Ok(BeneficiaryNeed::new(
            NeedId(self.id),
            self.beneficiary_name,
            self.item_name,
            self.quantity_needed,
            self.unit,
            priority,
        )
        .with_site(
            self.address,
            self.capacity.unwrap_or_default(),
            self.current_stock.unwrap_or_default(),
        )
        .with_dietary_requirements(self.dietary_requirements))
    }
}

fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect())
}

fn required_timestamp(
    raw: &str,
    column: &str,
    line: u64,
) -> Result<DateTime<Utc>, SnapshotImportError> {
    parse_timestamp(raw).ok_or_else(|| SnapshotImportError::InvalidRow {
        line,
        message: format!("{column} '{raw}' is not RFC 3339 or YYYY-MM-DD"),
    })
}

/// Accepts RFC 3339 or a bare date (taken as midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
