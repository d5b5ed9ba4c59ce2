//! Fixed-width bucketing of continuous columns.
//!
//! Buckets are half-open `[start, start + width)`. The first bucket starts at
//! the largest multiple of `width` not above the minimum; the last one ends
//! strictly above the maximum.

use serde::Serialize;

use crate::analyzers::types::GroupKey;
use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub start: f64,
    pub end: f64,
    pub width: f64,
}

impl Bucket {
    pub fn midpoint(&self) -> f64 {
        self.start + self.width / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value < self.end
    }
}

/// Contiguous buckets covering the full range of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketSet {
    start: f64,
    width: f64,
    count: usize,
}

impl BucketSet {
    /// Returns `Ok(None)` when `values` holds no finite number.
    pub fn covering(values: &[f64], width: f64) -> Result<Option<Self>, ReportError> {
        check_width(width)?;

        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let Some(first) = finite.next() else {
            return Ok(None);
        };
        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let mut start = (min / width).floor() * width;
        if start > min {
            start -= width;
        }
        let mut end = (max / width).ceil() * width;
        if end <= max {
            end += width;
        }
        let mut count = ((end - start) / width).round().max(1.0) as usize;
        while start + count as f64 * width <= max {
            count += 1;
        }

        Ok(Some(Self {
            start,
            width,
            count,
        }))
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.bucket(self.count - 1).end
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn bucket(&self, index: usize) -> Bucket {
        Bucket {
            start: self.start + index as f64 * self.width,
            end: self.start + (index + 1) as f64 * self.width,
            width: self.width,
        }
    }

    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        (0..self.count).map(|i| self.bucket(i))
    }

    /// The single bucket holding `value`, if it lies inside the covered range.
    pub fn assign(&self, value: f64) -> Option<Bucket> {
        if !value.is_finite() {
            return None;
        }
        let guess = ((value - self.start) / self.width).floor();
        if guess < -1.0 || guess > self.count as f64 {
            return None;
        }
        // Floating-point division can land one bucket off near a boundary.
        let guess = guess as i64;
        (guess - 1..=guess + 1)
            .filter(|i| *i >= 0 && (*i as usize) < self.count)
            .map(|i| self.bucket(i as usize))
            .find(|b| b.contains(value))
    }
}

fn check_width(width: f64) -> Result<(), ReportError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(ReportError::InvalidBucketWidth(width))
    }
}

/// Replaces each value with the midpoint of its bucket; missing values stay `None`.
pub fn midpoint_keys(values: &[Option<f64>], width: f64) -> Result<Vec<Option<GroupKey>>, ReportError> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(set) = BucketSet::covering(&present, width)? else {
        return Ok(vec![None; values.len()]);
    };

    Ok(values
        .iter()
        .map(|v| {
            v.and_then(|v| set.assign(v))
                .map(|b| GroupKey::Number(b.midpoint()))
        })
        .collect())
}
