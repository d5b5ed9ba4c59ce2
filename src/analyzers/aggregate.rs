use crate::analyzers::status::StatusColumn;
use crate::analyzers::types::{AggregationResult, ClassBalance, GroupKey, GroupOrder, GroupStat, LateShare};
use crate::analyzers::utility::{mean, parse_rate, share};
use crate::error::ReportError;
use std::collections::BTreeMap;

/// Groups late flags by key and computes `late_rate = mean(late)` and the
/// record count `n` per group.
///
/// `keys` and `late` are parallel, one entry per record. Records without a key
/// or with an excluded status are left out of every group.
pub fn late_rate_by(
    keys: &[Option<GroupKey>],
    late: &[Option<u8>],
    order: &GroupOrder,
) -> AggregationResult {
    let mut series: BTreeMap<&GroupKey, Vec<f64>> = BTreeMap::new();

    for (key, flag) in keys.iter().zip(late) {
        let (Some(key), Some(flag)) = (key, flag) else {
            continue;
        };
        series.entry(key).or_default().push(f64::from(*flag));
    }

    let mut groups: Vec<GroupStat> = series
        .into_iter()
        .map(|(key, flags)| GroupStat {
            key: key.clone(),
            late_rate: mean(&flags),
            n: flags.len(),
            late: flags.iter().filter(|f| **f > 0.0).count(),
        })
        .collect();

    groups.sort_by(|a, b| order.compare(a, b));
    AggregationResult { groups }
}

/// Counts Late and On-Time records; excluded records count toward neither.
pub fn class_balance(status: &StatusColumn) -> ClassBalance {
    status
        .on_time()
        .iter()
        .flatten()
        .fold(ClassBalance::default(), |mut acc, flag| {
            if *flag == 1 {
                acc.on_time += 1;
            } else {
                acc.late += 1;
            }
            acc
        })
}

/// Late count for a pre-aggregated row: `round(rate * n)`, never negative.
pub fn derive_late_count(rate: Option<&str>, n: Option<f64>) -> Option<f64> {
    let rate = parse_rate(rate?)?;
    let n = n?;
    Some((rate * n).round().max(0.0))
}

/// Sums per-record late counts by key and expresses each group as a share
/// of all late shipments.
///
/// Fails with [`ReportError::EmptyAggregation`] when there is not a single
/// late shipment to divide by.
pub fn late_share_by(
    report: &str,
    keys: &[Option<GroupKey>],
    late_counts: &[Option<f64>],
    order: &GroupOrder,
) -> Result<Vec<LateShare>, ReportError> {
    let mut sums: BTreeMap<&GroupKey, f64> = BTreeMap::new();

    for (key, count) in keys.iter().zip(late_counts) {
        let Some(key) = key else {
            continue;
        };
        let count = count.filter(|c| c.is_finite()).unwrap_or(0.0).max(0.0);
        *sums.entry(key).or_default() += count;
    }

    // Shares come from the unrounded sums; only the reported counts are rounded.
    let total_late: f64 = sums.values().sum();
    if total_late <= 0.0 {
        return Err(ReportError::empty(report, "no late shipments in this data"));
    }

    let mut shares: Vec<LateShare> = sums
        .into_iter()
        .map(|(key, sum)| LateShare {
            key: key.clone(),
            late_count: sum.round() as u64,
            share: share(sum, total_late),
        })
        .collect();

    shares.sort_by(|a, b| order.compare_by((&a.key, a.share), (&b.key, b.share)));
    Ok(shares)
}
