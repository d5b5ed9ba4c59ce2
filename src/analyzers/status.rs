use clap::ValueEnum;
use serde::Serialize;

use crate::dataset::{Dataset, parse_number};
use crate::error::ReportError;
use crate::schema::Field;

/// What to do with a status cell that is empty or not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingStatus {
    /// Count the shipment as delivered on time (flag = 1).
    #[default]
    AssumeOnTime,
    /// Leave the shipment out of every rate and count.
    Exclude,
}

/// Normalized on-time flags, one per dataset record.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusColumn {
    on_time: Vec<Option<u8>>,
}

impl StatusColumn {
    pub fn from_raw(values: &[Option<&str>], policy: MissingStatus) -> Self {
        Self {
            on_time: values.iter().map(|v| coerce_flag(*v, policy)).collect(),
        }
    }

    pub fn on_time(&self) -> &[Option<u8>] {
        &self.on_time
    }

    /// `1 - on_time` per record; excluded records stay `None`.
    pub fn late(&self) -> Vec<Option<u8>> {
        self.on_time.iter().map(|v| v.map(|f| 1 - f)).collect()
    }

    pub fn len(&self) -> usize {
        self.on_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.on_time.is_empty()
    }
}

/// Reads the on-time column through the resolved schema and normalizes it.
pub fn normalize(dataset: &Dataset, policy: MissingStatus) -> Result<StatusColumn, ReportError> {
    let raw = dataset.text(Field::ReachedOnTime)?;
    Ok(StatusColumn::from_raw(&raw, policy))
}

/// Numeric coercion, clip to `[0, 1]`, then truncate to an integer flag.
pub fn coerce_flag(raw: Option<&str>, policy: MissingStatus) -> Option<u8> {
    match raw.and_then(parse_number) {
        Some(v) => Some(v.clamp(0.0, 1.0).trunc() as u8),
        None => match policy {
            MissingStatus::AssumeOnTime => Some(1),
            MissingStatus::Exclude => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaMapping;

    #[test]
    fn test_coerce_flag_variants() {
        let p = MissingStatus::AssumeOnTime;
        assert_eq!(coerce_flag(Some("1"), p), Some(1));
        assert_eq!(coerce_flag(Some("0"), p), Some(0));
        assert_eq!(coerce_flag(Some("1.0"), p), Some(1));
        assert_eq!(coerce_flag(Some("7"), p), Some(1));
        assert_eq!(coerce_flag(Some("-3"), p), Some(0));
        assert_eq!(coerce_flag(Some("0.6"), p), Some(0));
        assert_eq!(coerce_flag(Some("yes"), p), Some(1));
        assert_eq!(coerce_flag(None, p), Some(1));
    }

    #[test]
    fn test_exclude_policy_drops_missing() {
        let p = MissingStatus::Exclude;
        assert_eq!(coerce_flag(Some("n/a"), p), None);
        assert_eq!(coerce_flag(None, p), None);
        assert_eq!(coerce_flag(Some("0"), p), Some(0));
    }

    #[test]
    fn test_late_is_complement_of_on_time() {
        let raw = [Some("1"), Some("0"), None, Some("2"), Some("x"), Some("-1")];
        let status = StatusColumn::from_raw(&raw, MissingStatus::AssumeOnTime);
        let late = status.late();

        for (on_time, late) in status.on_time().iter().zip(&late) {
            let on_time = on_time.unwrap();
            assert!(on_time <= 1);
            assert_eq!(late.unwrap(), 1 - on_time);
        }
    }

    #[test]
    fn test_all_missing_means_nobody_late() {
        let raw = [None, Some(""), Some("?"), None];
        let status = StatusColumn::from_raw(&raw, MissingStatus::AssumeOnTime);
        assert!(status.late().iter().all(|l| *l == Some(0)));
    }

    #[test]
    fn test_normalize_uses_resolved_alias() {
        let csv = "reached on time,warehouse_block\n1,A\n0,B\n";
        let ds = Dataset::from_reader(csv.as_bytes(), b',', &SchemaMapping::default()).unwrap();
        let status = normalize(&ds, MissingStatus::AssumeOnTime).unwrap();
        assert_eq!(status.late(), vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_normalize_without_status_column_fails() {
        let ds = Dataset::from_reader("warehouse_block\nA\n".as_bytes(), b',', &SchemaMapping::default())
            .unwrap();
        assert!(matches!(
            normalize(&ds, MissingStatus::AssumeOnTime),
            Err(ReportError::MissingColumn { field: Field::ReachedOnTime, .. })
        ));
    }
}
