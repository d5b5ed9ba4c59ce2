//! Delivery-delay aggregation pipeline.
//!
//! Normalizes the on-time column, buckets continuous columns, groups records
//! and computes late rates, counts and shares for the named reports.

pub mod aggregate;
pub mod binning;
pub mod reports;
pub mod status;
pub mod types;
pub mod utility;
