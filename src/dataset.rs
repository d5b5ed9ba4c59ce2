//! In-memory shipment table, loaded once and read-only afterwards.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::fetch::read_source;
use crate::schema::{CanonicalSchema, Field, SchemaMapping};

#[derive(Debug, Clone)]
pub struct Dataset {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    schema: CanonicalSchema,
}

impl Dataset {
    /// Reads a delimited file from a path or URL and resolves its schema.
    #[tracing::instrument(skip(mapping))]
    pub fn load(source: &str, delimiter: u8, mapping: &SchemaMapping) -> Result<Self> {
        let bytes = read_source(source)?;
        let dataset = Self::from_reader(bytes.as_slice(), delimiter, mapping)
            .with_context(|| format!("failed to parse dataset '{source}'"))?;

        info!(
            rows = dataset.len(),
            columns = dataset.headers.len(),
            resolved = dataset.schema.resolved().count(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8, mapping: &SchemaMapping) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let schema = mapping.resolve(headers.iter());
        for (field, column) in schema.resolved() {
            debug!(field = %field, column = %column.name, index = column.index, "Field resolved");
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            rows.push(result?);
        }

        Ok(Self {
            headers,
            rows,
            schema,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn head(&self, n: usize) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter().take(n)
    }

    /// Cell text per record; empty or absent cells are `None`.
    pub fn text(&self, field: Field) -> Result<Vec<Option<&str>>, ReportError> {
        let index = self.schema.require(field)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).filter(|v| !v.is_empty()))
            .collect())
    }

    /// Cell values coerced to numbers; anything unparsable is `None`.
    pub fn numeric(&self, field: Field) -> Result<Vec<Option<f64>>, ReportError> {
        Ok(self
            .text(field)?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect())
    }

    /// Distinct non-empty values in first-seen order.
    pub fn distinct(&self, field: Field) -> Result<Vec<String>, ReportError> {
        let mut seen: Vec<String> = Vec::new();
        for value in self.text(field)?.into_iter().flatten() {
            if !seen.iter().any(|s| s == value) {
                seen.push(value.to_string());
            }
        }
        Ok(seen)
    }
}

/// Lenient numeric coercion: unparsable and non-finite values become `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
