use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::error::ReportError;
use crate::schema::Field;

/// Model input columns, in the order the artifact expects them.
pub const FEATURE_FIELDS: [Field; 10] = [
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
];

/// Form fields offered as a choice list rather than free input.
pub const CATEGORICAL_FIELDS: [Field; 4] = [
    Field::WarehouseBlock,
    Field::ModeOfShipment,
    Field::ProductImportance,
    Field::Gender,
];

pub fn is_categorical(field: Field) -> bool {
    CATEGORICAL_FIELDS.contains(&field)
}

/// The ten values a user submits on the prediction form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub warehouse_block: String,
    pub mode_of_shipment: String,
    pub customer_care_calls: u32,
    pub customer_rating: u8,
    pub cost_of_the_product: f64,
    pub prior_purchases: u32,
    pub product_importance: String,
    pub gender: String,
    pub discount_offered: u8,
    pub weight_in_gms: f64,
}

impl PredictionInput {
    pub fn validate(&self) -> Result<(), ReportError> {
        for (field, value) in [
            (Field::WarehouseBlock, &self.warehouse_block),
            (Field::ModeOfShipment, &self.mode_of_shipment),
            (Field::ProductImportance, &self.product_importance),
            (Field::Gender, &self.gender),
        ] {
            if value.trim().is_empty() {
                return Err(ReportError::invalid(field.as_str(), "must not be empty"));
            }
        }
        if self.customer_rating > 10 {
            return Err(ReportError::invalid(
                Field::CustomerRating.as_str(),
                format!("must be between 0 and 10, got {}", self.customer_rating),
            ));
        }
        if self.discount_offered > 100 {
            return Err(ReportError::invalid(
                Field::DiscountOffered.as_str(),
                format!("must be between 0 and 100, got {}", self.discount_offered),
            ));
        }
        for (field, value) in [
            (Field::CostOfTheProduct, self.cost_of_the_product),
            (Field::WeightInGms, self.weight_in_gms),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ReportError::invalid(
                    field.as_str(),
                    format!("must be a non-negative number, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Validates and lays the input out as the single model row.
    pub fn to_feature_row(&self) -> Result<FeatureRow, ReportError> {
        self.validate()?;

        let values = vec![
            (Field::WarehouseBlock, FeatureValue::Text(self.warehouse_block.clone())),
            (Field::ModeOfShipment, FeatureValue::Text(self.mode_of_shipment.clone())),
            (Field::CustomerCareCalls, FeatureValue::Number(f64::from(self.customer_care_calls))),
            (Field::CustomerRating, FeatureValue::Number(f64::from(self.customer_rating))),
            (Field::CostOfTheProduct, FeatureValue::Number(self.cost_of_the_product)),
            (Field::PriorPurchases, FeatureValue::Number(f64::from(self.prior_purchases))),
            (Field::ProductImportance, FeatureValue::Text(self.product_importance.clone())),
            (Field::Gender, FeatureValue::Text(self.gender.clone())),
            (Field::DiscountOffered, FeatureValue::Number(f64::from(self.discount_offered))),
            (Field::WeightInGms, FeatureValue::Number(self.weight_in_gms)),
        ];
        debug_assert!(values.iter().map(|(f, _)| *f).eq(FEATURE_FIELDS));

        Ok(FeatureRow { values })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Text(String),
    Number(f64),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s.as_str()),
            FeatureValue::Number(_) => None,
        }
    }
}

/// Exactly one row in the fixed feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<(Field, FeatureValue)>,
}

impl FeatureRow {
    pub fn get(&self, field: Field) -> Option<&FeatureValue> {
        self.values.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FeatureValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Choice lists for the categorical form fields, taken from the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormOptions {
    choices: BTreeMap<Field, Vec<String>>,
}

impl FormOptions {
    /// Distinct values per categorical field; fields missing from the
    /// dataset get no choice list and accept any value.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let choices = CATEGORICAL_FIELDS
            .iter()
            .filter_map(|field| dataset.distinct(*field).ok().map(|values| (*field, values)))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        Self { choices }
    }

    pub fn choices(&self, field: Field) -> &[String] {
        self.choices.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn check(&self, input: &PredictionInput) -> Result<(), ReportError> {
        for (field, value) in [
            (Field::WarehouseBlock, &input.warehouse_block),
            (Field::ModeOfShipment, &input.mode_of_shipment),
            (Field::ProductImportance, &input.product_importance),
            (Field::Gender, &input.gender),
        ] {
            let choices = self.choices(field);
            if !choices.is_empty() && !choices.iter().any(|c| c == value) {
                return Err(ReportError::invalid(
                    field.as_str(),
                    format!("'{value}' is not one of: {}", choices.join(", ")),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::SchemaMapping;

    pub(crate) fn sample_input() -> PredictionInput {
        PredictionInput {
            warehouse_block: "F".into(),
            mode_of_shipment: "Ship".into(),
            customer_care_calls: 4,
            customer_rating: 3,
            cost_of_the_product: 216.0,
            prior_purchases: 2,
            product_importance: "low".into(),
            gender: "M".into(),
            discount_offered: 10,
            weight_in_gms: 1500.0,
        }
    }

    #[test]
    fn test_feature_row_has_ten_fields_in_order() {
        let row = sample_input().to_feature_row().unwrap();
        assert_eq!(row.len(), 10);
        let fields: Vec<Field> = row.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, FEATURE_FIELDS.to_vec());
        assert_eq!(row.get(Field::CustomerRating).unwrap().as_number(), Some(3.0));
        assert_eq!(row.get(Field::Gender).unwrap().as_text(), Some("M"));
    }

    #[test]
    fn test_rating_out_of_range() {
        let input = PredictionInput {
            customer_rating: 11,
            ..sample_input()
        };
        assert!(matches!(
            input.validate(),
            Err(ReportError::InvalidInput { field, .. }) if field == "customer_rating"
        ));
    }

    #[test]
    fn test_discount_out_of_range() {
        let input = PredictionInput {
            discount_offered: 101,
            ..sample_input()
        };
        assert!(input.to_feature_row().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let input = PredictionInput {
            weight_in_gms: -1.0,
            ..sample_input()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_empty_category_rejected() {
        let input = PredictionInput {
            gender: " ".into(),
            ..sample_input()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_form_options_from_dataset() {
        let csv = "warehouse_block,mode_of_shipment,gender\nD,Flight,F\nF,Ship,M\nD,Road,F\n";
        let ds = Dataset::from_reader(csv.as_bytes(), b',', &SchemaMapping::default()).unwrap();
        let options = FormOptions::from_dataset(&ds);

        assert_eq!(options.choices(Field::WarehouseBlock), ["D".to_string(), "F".to_string()]);
        assert!(options.choices(Field::ProductImportance).is_empty());

        assert!(options.check(&sample_input()).is_ok());
        let unknown = PredictionInput {
            warehouse_block: "Z".into(),
            ..sample_input()
        };
        assert!(options.check(&unknown).is_err());
    }
}
