//! The named reports behind the dashboard charts.
//!
//! Each report is computed on demand against the loaded [`Dataset`]; a failure
//! aborts that report only.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::aggregate::{class_balance, derive_late_count, late_rate_by, late_share_by};
use crate::analyzers::binning::midpoint_keys;
use crate::analyzers::status::{MissingStatus, normalize};
use crate::analyzers::types::{AggregationResult, GroupKey, GroupOrder};
use crate::analyzers::utility::share;
use crate::dataset::Dataset;
use crate::error::ReportError;
use crate::schema::Field;

pub const DEFAULT_WEIGHT_BIN: f64 = 500.0;
pub const WEIGHT_BIN_RANGE: (f64, f64) = (100.0, 5000.0);
pub const DISCOUNT_BIN: f64 = 5.0;

const MODE_ORDER: [&str; 3] = ["Road", "Ship", "Flight"];
const MODE_SHARE_ORDER: [&str; 3] = ["Flight", "Road", "Ship"];
const IMPORTANCE_ORDER: [&str; 3] = ["medium", "low", "high"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    ClassBalance,
    LateRateByWarehouse,
    LateRateByMode,
    LateShareByMode,
    LateRateByImportance,
    LateRateByWeightBucket,
    LateRateByDiscountBucket,
    LateRateByCallCount,
}

impl ReportKind {
    pub const ALL: [ReportKind; 8] = [
        ReportKind::ClassBalance,
        ReportKind::LateRateByWarehouse,
        ReportKind::LateRateByMode,
        ReportKind::LateShareByMode,
        ReportKind::LateRateByImportance,
        ReportKind::LateRateByWeightBucket,
        ReportKind::LateRateByDiscountBucket,
        ReportKind::LateRateByCallCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::ClassBalance => "class-balance",
            ReportKind::LateRateByWarehouse => "late-rate-by-warehouse",
            ReportKind::LateRateByMode => "late-rate-by-mode",
            ReportKind::LateShareByMode => "late-share-by-mode",
            ReportKind::LateRateByImportance => "late-rate-by-importance",
            ReportKind::LateRateByWeightBucket => "late-rate-by-weight-bucket",
            ReportKind::LateRateByDiscountBucket => "late-rate-by-discount-bucket",
            ReportKind::LateRateByCallCount => "late-rate-by-call-count",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::ClassBalance => "Delivery Status (Class Balance)",
            ReportKind::LateRateByWarehouse => "Late Rate by Warehouse",
            ReportKind::LateRateByMode => "Late Rate by Mode of Shipment",
            ReportKind::LateShareByMode => "Share of Late by Mode of Shipment",
            ReportKind::LateRateByImportance => "Late Rate by Product Importance",
            ReportKind::LateRateByWeightBucket => "Late Rate by Weight",
            ReportKind::LateRateByDiscountBucket => "Late Rate by Discount",
            ReportKind::LateRateByCallCount => "Late Rate by Calls",
        }
    }

    fn key_label(&self, options: &ReportOptions) -> String {
        match self {
            ReportKind::ClassBalance => "Delivery_Status".into(),
            ReportKind::LateRateByWarehouse => "Warehouse".into(),
            ReportKind::LateRateByMode | ReportKind::LateShareByMode => "Mode of Shipment".into(),
            ReportKind::LateRateByImportance => "Product importance".into(),
            ReportKind::LateRateByWeightBucket => {
                format!("Weight_Bin_Midpoint_{}_G", options.weight_bin)
            }
            ReportKind::LateRateByDiscountBucket => "Discount_Midpoint".into(),
            ReportKind::LateRateByCallCount => "Calls".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    pub weight_bin: f64,
    pub discount_bin: f64,
    pub missing_status: MissingStatus,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            weight_bin: DEFAULT_WEIGHT_BIN,
            discount_bin: DISCOUNT_BIN,
            missing_status: MissingStatus::default(),
        }
    }
}

impl ReportOptions {
    /// Range check for the weight bucket width; only the weight report uses it.
    pub fn check_weight_bin(&self) -> Result<(), ReportError> {
        let (lo, hi) = WEIGHT_BIN_RANGE;
        if !(lo..=hi).contains(&self.weight_bin) {
            return Err(ReportError::invalid(
                "weight_bin",
                format!("must be between {lo} and {hi} grams, got {}", self.weight_bin),
            ));
        }
        Ok(())
    }
}

/// One chart-ready row. Fields a report does not produce are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub key: GroupKey,
    pub n: usize,
    pub late_count: Option<u64>,
    pub late_rate: Option<f64>,
    pub share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub key_label: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

/// Runs one named report against the dataset.
#[tracing::instrument(skip(dataset, options), fields(report = kind.name()))]
pub fn run_report(
    kind: ReportKind,
    dataset: &Dataset,
    options: &ReportOptions,
) -> Result<Report, ReportError> {
    let rows = match kind {
        ReportKind::ClassBalance => class_balance_rows(dataset, options)?,
        ReportKind::LateRateByWarehouse => {
            rate_rows(category_keys(dataset, Field::WarehouseBlock, false)?, dataset, options, GroupOrder::RateDesc)?
        }
        ReportKind::LateRateByMode => rate_rows(
            category_keys(dataset, Field::ModeOfShipment, false)?,
            dataset,
            options,
            GroupOrder::fixed(&MODE_ORDER),
        )?,
        ReportKind::LateShareByMode => late_share_rows(kind, dataset, options)?,
        ReportKind::LateRateByImportance => rate_rows(
            category_keys(dataset, Field::ProductImportance, true)?,
            dataset,
            options,
            GroupOrder::fixed(&IMPORTANCE_ORDER),
        )?,
        ReportKind::LateRateByWeightBucket => {
            options.check_weight_bin()?;
            let weights = dataset.numeric(Field::WeightInGms)?;
            rate_rows(midpoint_keys(&weights, options.weight_bin)?, dataset, options, GroupOrder::KeyAsc)?
        }
        ReportKind::LateRateByDiscountBucket => {
            let discounts = dataset.numeric(Field::DiscountOffered)?;
            rate_rows(midpoint_keys(&discounts, options.discount_bin)?, dataset, options, GroupOrder::KeyAsc)?
        }
        ReportKind::LateRateByCallCount => {
            let keys = dataset
                .numeric(Field::CustomerCareCalls)?
                .into_iter()
                .map(|v| v.map(|calls| GroupKey::Number(calls.trunc() + 0.0)))
                .collect();
            rate_rows(keys, dataset, options, GroupOrder::KeyAsc)?
        }
    };

    if rows.is_empty() {
        return Err(ReportError::empty(kind.name(), "no records with a usable value"));
    }
    debug!(groups = rows.len(), "Report computed");

    Ok(Report {
        kind,
        title: kind.title().to_string(),
        key_label: kind.key_label(options),
        generated_at: Utc::now(),
        rows,
    })
}

/// Runs every report, keeping each outcome separate.
pub fn run_all(dataset: &Dataset, options: &ReportOptions) -> Vec<(ReportKind, Result<Report, ReportError>)> {
    ReportKind::ALL
        .iter()
        .map(|kind| (*kind, run_report(*kind, dataset, options)))
        .collect()
}

fn category_keys(
    dataset: &Dataset,
    field: Field,
    lowercase: bool,
) -> Result<Vec<Option<GroupKey>>, ReportError> {
    Ok(dataset
        .text(field)?
        .into_iter()
        .map(|v| {
            v.map(|label| {
                if lowercase {
                    GroupKey::label(label.to_lowercase())
                } else {
                    GroupKey::label(label)
                }
            })
        })
        .collect())
}

fn class_balance_rows(dataset: &Dataset, options: &ReportOptions) -> Result<Vec<ReportRow>, ReportError> {
    let status = normalize(dataset, options.missing_status)?;
    let balance = class_balance(&status);
    let total = balance.total() as f64;

    Ok(balance
        .entries()
        .iter()
        .map(|(label, count)| ReportRow {
            key: GroupKey::label(*label),
            n: *count,
            late_count: None,
            late_rate: None,
            share: Some(share(*count as f64, total)),
        })
        .collect())
}

fn rate_rows(
    keys: Vec<Option<GroupKey>>,
    dataset: &Dataset,
    options: &ReportOptions,
    order: GroupOrder,
) -> Result<Vec<ReportRow>, ReportError> {
    let late = normalize(dataset, options.missing_status)?.late();
    let result: AggregationResult = late_rate_by(&keys, &late, &order);

    Ok(result
        .groups
        .into_iter()
        .map(|g| ReportRow {
            key: g.key,
            n: g.n,
            late_count: Some(g.late as u64),
            late_rate: Some(g.late_rate),
            share: None,
        })
        .collect())
}

/// Late counts per record, from the status column when there is one and from
/// pre-aggregated `late_rate`/`n` or `late_count` columns otherwise.
fn late_counts(dataset: &Dataset, options: &ReportOptions) -> Result<Vec<Option<f64>>, ReportError> {
    let schema = dataset.schema();

    if !schema.has(Field::ReachedOnTime) {
        if uses_rate_and_size(dataset) {
            debug!("No status column, deriving late counts from rate and sample size");
            let rates = dataset.text(Field::LateRate)?;
            let sizes = dataset.numeric(Field::SampleSize)?;
            return Ok(rates
                .into_iter()
                .zip(sizes)
                .map(|(rate, n)| derive_late_count(rate, n))
                .collect());
        }
        if schema.has(Field::LateCount) {
            debug!("No status column, summing late_count");
            return dataset.numeric(Field::LateCount);
        }
    }

    // Without any fallback this reports the missing status column.
    Ok(normalize(dataset, options.missing_status)?
        .late()
        .into_iter()
        .map(|l| l.map(f64::from))
        .collect())
}

/// True when late counts come from `late_rate × n` instead of a status column.
fn uses_rate_and_size(dataset: &Dataset) -> bool {
    let schema = dataset.schema();
    !schema.has(Field::ReachedOnTime) && schema.has(Field::LateRate) && schema.has(Field::SampleSize)
}

fn late_share_rows(
    kind: ReportKind,
    dataset: &Dataset,
    options: &ReportOptions,
) -> Result<Vec<ReportRow>, ReportError> {
    let keys = category_keys(dataset, Field::ModeOfShipment, false)?;
    let counts = late_counts(dataset, options)?;

    // Pre-aggregated rows stand for `n` shipments each.
    let weights: Vec<f64> = if uses_rate_and_size(dataset) {
        dataset
            .numeric(Field::SampleSize)?
            .into_iter()
            .map(|n| n.unwrap_or(0.0).max(0.0))
            .collect()
    } else {
        vec![1.0; keys.len()]
    };

    let mut records = std::collections::BTreeMap::new();
    for (key, weight) in keys.iter().zip(&weights) {
        if let Some(key) = key {
            *records.entry(key).or_insert(0.0) += weight;
        }
    }

    let shares = late_share_by(kind.name(), &keys, &counts, &GroupOrder::fixed(&MODE_SHARE_ORDER))?;
    Ok(shares
        .into_iter()
        .map(|s| ReportRow {
            n: records.get(&s.key).map_or(0, |n: &f64| n.round() as usize),
            key: s.key,
            late_count: Some(s.late_count),
            late_rate: None,
            share: Some(s.share),
        })
        .collect())
}
