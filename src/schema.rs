//! Logical fields and the alias table that maps them onto dataset headers.
//!
//! Dataset versions spell the same column differently (`reached_on_time`,
//! `reached on time`, `Reached.on.Time_Y.N`). A [`SchemaMapping`] lists the
//! accepted spellings per [`Field`] in priority order and is resolved once
//! against the header row into a [`CanonicalSchema`].
//!
//! Overrides are stored as a JSON object on disk:
//! ```json
//! {
//!   "reached_on_time": ["Reached.on.Time_Y.N", "reached_on_time"],
//!   "warehouse_block": ["Warehouse_block"]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    WarehouseBlock,
    ModeOfShipment,
    CustomerCareCalls,
    CustomerRating,
    CostOfTheProduct,
    PriorPurchases,
    ProductImportance,
    Gender,
    DiscountOffered,
    WeightInGms,
    ReachedOnTime,
    LateRate,
    SampleSize,
    LateCount,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::WarehouseBlock,
        Field::ModeOfShipment,
        Field::CustomerCareCalls,
        Field::CustomerRating,
        Field::CostOfTheProduct,
        Field::PriorPurchases,
        Field::ProductImportance,
        Field::Gender,
        Field::DiscountOffered,
        Field::WeightInGms,
        Field::ReachedOnTime,
        Field::LateRate,
        Field::SampleSize,
        Field::LateCount,
    ];

    /// Canonical column name, also the key used in override files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::WarehouseBlock => "warehouse_block",
            Field::ModeOfShipment => "mode_of_shipment",
            Field::CustomerCareCalls => "customer_care_calls",
            Field::CustomerRating => "customer_rating",
            Field::CostOfTheProduct => "cost_of_the_product",
            Field::PriorPurchases => "prior_purchases",
            Field::ProductImportance => "product_importance",
            Field::Gender => "gender",
            Field::DiscountOffered => "discount_offered",
            Field::WeightInGms => "weight_in_gms",
            Field::ReachedOnTime => "reached_on_time",
            Field::LateRate => "late_rate",
            Field::SampleSize => "sample_size",
            Field::LateCount => "late_count",
        }
    }

    fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            Field::WarehouseBlock => &["warehouse_block", "Warehouse_block"],
            Field::ModeOfShipment => &["mode_of_shipment", "Mode_of_Shipment"],
            Field::CustomerCareCalls => &["customer_care_calls", "Customer_care_calls"],
            Field::CustomerRating => &["customer_rating", "Customer_rating"],
            Field::CostOfTheProduct => &["cost_of_the_product", "Cost_of_the_Product"],
            Field::PriorPurchases => &["prior_purchases", "Prior_purchases"],
            Field::ProductImportance => &["product_importance", "Product_importance"],
            Field::Gender => &["gender", "Gender"],
            Field::DiscountOffered => &["discount_offered", "Discount_offered"],
            Field::WeightInGms => &["weight_in_gms", "Weight_in_gms"],
            Field::ReachedOnTime => &["reached_on_time", "reached on time", "Reached.on.Time_Y.N"],
            Field::LateRate => &["late_rate", "Late_Rate", "late%"],
            Field::SampleSize => &["n", "count", "Count", "total", "Total", "records", "Records"],
            Field::LateCount => &["late_count"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prioritized list of accepted header spellings per logical field.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMapping {
    aliases: BTreeMap<Field, Vec<String>>,
}

impl Default for SchemaMapping {
    fn default() -> Self {
        let aliases = Field::ALL
            .iter()
            .map(|f| {
                (
                    *f,
                    f.default_aliases().iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();
        Self { aliases }
    }
}

impl SchemaMapping {
    /// Loads alias overrides from a JSON file at `path`, on top of the defaults.
    ///
    /// A field listed in the file has its alias list replaced, not extended.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema mapping '{path}'"))?;
        let overrides: HashMap<Field, Vec<String>> = serde_json::from_str(&content)
            .with_context(|| format!("invalid schema mapping '{path}'"))?;
        Ok(Self::default().with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: HashMap<Field, Vec<String>>) -> Self {
        for (field, list) in overrides {
            if !list.is_empty() {
                self.aliases.insert(field, list);
            }
        }
        self
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Picks, for every field, the first alias present in `headers`.
    pub fn resolve<'a, I>(&self, headers: I) -> CanonicalSchema
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<&str> = headers
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();

        let mut columns = BTreeMap::new();
        for (field, list) in &self.aliases {
            let hit = list
                .iter()
                .find_map(|alias| headers.iter().position(|h| *h == alias.as_str()).map(|i| (i, alias)));
            if let Some((index, alias)) = hit {
                columns.insert(
                    *field,
                    ResolvedColumn {
                        index,
                        name: alias.clone(),
                    },
                );
            }
        }

        CanonicalSchema {
            columns,
            mapping: self.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub name: String,
}

/// Field-to-column assignment for one loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    columns: BTreeMap<Field, ResolvedColumn>,
    mapping: SchemaMapping,
}

impl CanonicalSchema {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).map(|c| c.index)
    }

    pub fn has(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// Header spelling the field resolved to.
    pub fn column_name(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(|c| c.name.as_str())
    }

    pub fn require(&self, field: Field) -> Result<usize, ReportError> {
        self.index(field).ok_or_else(|| ReportError::MissingColumn {
            field,
            aliases: self.mapping.aliases(field).to_vec(),
        })
    }

    pub fn resolved(&self) -> impl Iterator<Item = (Field, &ResolvedColumn)> {
        self.columns.iter().map(|(f, c)| (*f, c))
    }
}
