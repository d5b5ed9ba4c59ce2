//! Data types used by the aggregation pipeline.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Grouping key: a category label or a numeric value such as a bucket midpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Label(String),
    Number(f64),
}

impl GroupKey {
    pub fn label(s: impl Into<String>) -> Self {
        GroupKey::Label(s.into())
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            GroupKey::Label(s) => Some(s.as_str()),
            GroupKey::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            GroupKey::Number(v) => Some(*v),
            GroupKey::Label(_) => None,
        }
    }
}

// Numbers sort before labels; numbers use total ordering with -0 folded into 0.
impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => (a + 0.0).total_cmp(&(b + 0.0)),
            (GroupKey::Label(a), GroupKey::Label(b)) => a.cmp(b),
            (GroupKey::Number(_), GroupKey::Label(_)) => Ordering::Less,
            (GroupKey::Label(_), GroupKey::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Label(s) => f.write_str(s),
            GroupKey::Number(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            GroupKey::Number(v) => write!(f, "{v}"),
        }
    }
}

/// How the groups of one report are ordered.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOrder {
    /// Highest late rate first; equal rates fall back to ascending key.
    RateDesc,
    /// Ascending key.
    KeyAsc,
    /// Declared category order; unlisted keys follow in ascending order.
    Fixed(Vec<String>),
}

impl GroupOrder {
    pub fn fixed(order: &[&str]) -> Self {
        GroupOrder::Fixed(order.iter().map(|s| s.to_string()).collect())
    }

    fn rank(order: &[String], key: &GroupKey) -> usize {
        key.as_label()
            .and_then(|l| order.iter().position(|o| o == l))
            .unwrap_or(order.len())
    }

    pub(crate) fn compare(&self, a: &GroupStat, b: &GroupStat) -> Ordering {
        self.compare_by((&a.key, a.late_rate), (&b.key, b.late_rate))
    }

    /// Compares `(key, rate)` pairs; `rate` only matters for [`GroupOrder::RateDesc`].
    pub(crate) fn compare_by(&self, a: (&GroupKey, f64), b: (&GroupKey, f64)) -> Ordering {
        match self {
            GroupOrder::RateDesc => b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)),
            GroupOrder::KeyAsc => a.0.cmp(b.0),
            GroupOrder::Fixed(order) => Self::rank(order, a.0)
                .cmp(&Self::rank(order, b.0))
                .then_with(|| a.0.cmp(b.0)),
        }
    }
}

/// Late-rate statistics for a single group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: GroupKey,
    pub late_rate: f64,
    pub n: usize,
    pub late: usize,
}

/// Ordered per-group statistics for one report request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    pub groups: Vec<GroupStat>,
}

impl AggregationResult {
    pub fn get(&self, key: &GroupKey) -> Option<&GroupStat> {
        self.groups.iter().find(|g| &g.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn total_n(&self) -> usize {
        self.groups.iter().map(|g| g.n).sum()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Summed late count for one group, with its share of all late shipments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateShare {
    pub key: GroupKey,
    pub late_count: u64,
    pub share: f64,
}

/// Delivery status counts, always reported as Late then On-Time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassBalance {
    pub late: usize,
    pub on_time: usize,
}

impl ClassBalance {
    pub const LATE: &'static str = "Late";
    pub const ON_TIME: &'static str = "On-Time";

    pub fn total(&self) -> usize {
        self.late + self.on_time
    }

    pub fn entries(&self) -> [(&'static str, usize); 2] {
        [(Self::LATE, self.late), (Self::ON_TIME, self.on_time)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(key: GroupKey, late_rate: f64) -> GroupStat {
        GroupStat {
            key,
            late_rate,
            n: 1,
            late: 0,
        }
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let mut keys = vec![
            GroupKey::Number(750.0),
            GroupKey::Number(250.0),
            GroupKey::Number(1250.0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                GroupKey::Number(250.0),
                GroupKey::Number(750.0),
                GroupKey::Number(1250.0)
            ]
        );
    }

    #[test]
    fn test_negative_zero_is_the_same_key() {
        assert_eq!(GroupKey::Number(-0.0), GroupKey::Number(0.0));
        assert!(GroupKey::Number(-1.0) < GroupKey::Number(-0.0));
    }

    #[test]
    fn test_display_drops_trailing_zero_fraction() {
        assert_eq!(GroupKey::Number(250.0).to_string(), "250");
        assert_eq!(GroupKey::Number(2.5).to_string(), "2.5");
        assert_eq!(GroupKey::label("Road").to_string(), "Road");
    }

    #[test]
    fn test_rate_desc_breaks_ties_by_key() {
        let order = GroupOrder::RateDesc;
        let a = stat(GroupKey::label("A"), 0.4);
        let b = stat(GroupKey::label("B"), 0.4);
        let c = stat(GroupKey::label("C"), 0.5);
        assert_eq!(order.compare(&c, &a), Ordering::Less);
        assert_eq!(order.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_fixed_order_puts_unlisted_last() {
        let order = GroupOrder::fixed(&["Road", "Ship", "Flight"]);
        let mut stats = vec![
            stat(GroupKey::label("Rail"), 0.9),
            stat(GroupKey::label("Flight"), 0.1),
            stat(GroupKey::label("Road"), 0.2),
        ];
        stats.sort_by(|a, b| order.compare(a, b));
        let keys: Vec<String> = stats.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["Road", "Flight", "Rail"]);
    }

    #[test]
    fn test_class_balance_entries_order() {
        let balance = ClassBalance { late: 3, on_time: 7 };
        assert_eq!(balance.entries(), [("Late", 3), ("On-Time", 7)]);
        assert_eq!(balance.total(), 10);
    }
}
