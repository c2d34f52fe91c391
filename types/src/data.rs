//! Backend payloads and table column metadata.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::formatting::{
    format_currency, format_number, format_percent, format_signed_currency, format_signed_number,
};

// ─────────────────────────────────────────────────────────────────────────────
// Query Results
// ─────────────────────────────────────────────────────────────────────────────

/// One cell of a comparison table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Null,
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Null => Ok(()),
        }
    }
}

/// Day-over-day comparison row: `{<field>: value, asofValue, prevValue, change, changePct}`.
pub type FlatRow = BTreeMap<String, CellValue>;

/// One point of a multi-line trend: one row per date x category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub category: String,
    pub value: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Groupable dimension (region, product, ...)
    Categorical,
    /// Numeric measure (revenue, quantity, ...)
    Value,
}

/// A field the backend knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogField {
    pub field: String,
    pub label: String,
    #[serde(rename = "type", alias = "fieldType")]
    pub kind: FieldKind,
}

impl CatalogField {
    /// Display label for `field`, falling back to the raw id when not in the catalog
    pub fn label_for<'a>(catalog: &'a [CatalogField], field: &'a str) -> &'a str {
        catalog
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.label.as_str())
            .unwrap_or(field)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table Columns
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Avg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueFormat {
    Currency,
    /// Currency difference with an explicit `+`
    SignedCurrency,
    Number,
    SignedNumber,
    Percent,
}

impl ValueFormat {
    pub fn format(&self, value: f64, european: bool) -> String {
        match self {
            ValueFormat::Currency => format_currency(value, european),
            ValueFormat::SignedCurrency => format_signed_currency(value, european),
            ValueFormat::Number => format_number(value, european),
            ValueFormat::SignedNumber => format_signed_number(value, european),
            ValueFormat::Percent => format_percent(value, european),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDef {
    pub field: String,
    pub header_name: String,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDef {
    pub field: String,
    pub header_name: String,
    pub agg_func: AggFunc,
    pub formatter: ValueFormat,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumnConfig {
    pub dimensions: Vec<DimensionDef>,
    pub measures: Vec<MeasureDef>,
}

fn measure_label(measure: &str) -> &str {
    match measure {
        "revenue" => "Revenue",
        "quantity" => "Quantity",
        "price" => "Price",
        other => other,
    }
}

/// Money measures render as currency, everything else as plain numbers
fn is_currency_measure(measure: &str) -> bool {
    matches!(measure, "revenue" | "price")
}

/// Columns for a day-over-day comparison table grouped by `field`.
pub fn table_columns(field: &str, field_label: &str, measure: &str) -> TableColumnConfig {
    let m = measure_label(measure);
    let (value_fmt, change_fmt) = if is_currency_measure(measure) {
        (ValueFormat::Currency, ValueFormat::SignedCurrency)
    } else {
        (ValueFormat::Number, ValueFormat::SignedNumber)
    };
    let col = |field: &str, header_name: String, agg_func, formatter, width| MeasureDef {
        field: field.to_string(),
        header_name,
        agg_func,
        formatter,
        width,
    };
    TableColumnConfig {
        dimensions: vec![DimensionDef {
            field: field.to_string(),
            header_name: field_label.to_string(),
            width: Some(130),
        }],
        measures: vec![
            col("asofValue", format!("{m} (AsOf)"), AggFunc::Sum, value_fmt, None),
            col("prevValue", format!("{m} (Prev)"), AggFunc::Sum, value_fmt, None),
            col("change", "Change".to_string(), AggFunc::Sum, change_fmt, None),
            col("changePct", "Chg %".to_string(), AggFunc::Avg, ValueFormat::Percent, Some(85)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_row_deserializes_mixed_cells() {
        let json = r#"{"region": "EMEA", "asofValue": 1200.5, "prevValue": null}"#;
        let row: FlatRow = serde_json::from_str(json).unwrap();
        assert_eq!(row["region"].as_str(), Some("EMEA"));
        assert_eq!(row["asofValue"].as_f64(), Some(1200.5));
        assert_eq!(row["prevValue"], CellValue::Null);
    }

    #[test]
    fn test_catalog_field_accepts_type_and_field_type() {
        let a: CatalogField =
            serde_json::from_str(r#"{"field":"region","label":"Region","type":"categorical"}"#)
                .unwrap();
        let b: CatalogField =
            serde_json::from_str(r#"{"field":"revenue","label":"Revenue","fieldType":"value"}"#)
                .unwrap();
        assert_eq!(a.kind, FieldKind::Categorical);
        assert_eq!(b.kind, FieldKind::Value);
    }

    #[test]
    fn test_label_for_falls_back_to_field() {
        let catalog = vec![CatalogField {
            field: "region".into(),
            label: "Region".into(),
            kind: FieldKind::Categorical,
        }];
        assert_eq!(CatalogField::label_for(&catalog, "region"), "Region");
        assert_eq!(CatalogField::label_for(&catalog, "product"), "product");
    }

    #[test]
    fn test_table_columns_labels() {
        let cols = table_columns("region", "Region", "revenue");
        assert_eq!(cols.dimensions[0].header_name, "Region");
        let headers: Vec<_> = cols.measures.iter().map(|m| m.header_name.as_str()).collect();
        assert_eq!(
            headers,
            ["Revenue (AsOf)", "Revenue (Prev)", "Change", "Chg %"]
        );
        assert_eq!(cols.measures[0].formatter, ValueFormat::Currency);
        assert_eq!(cols.measures[2].formatter, ValueFormat::SignedCurrency);
        assert_eq!(cols.measures[3].formatter, ValueFormat::Percent);
        assert_eq!(cols.measures[2].formatter.format(200.0, false), "+$200");
        assert_eq!(cols.measures[3].formatter.format(20.0, false), "+20.0%");

        let cols = table_columns("region", "Region", "quantity");
        assert_eq!(cols.measures[1].header_name, "Quantity (Prev)");
        assert_eq!(cols.measures[1].formatter, ValueFormat::Number);
        assert_eq!(cols.measures[2].formatter.format(-3.0, false), "-3");

        // Unknown measures use their raw id
        let cols = table_columns("region", "Region", "total_revenue");
        assert_eq!(cols.measures[0].header_name, "total_revenue (AsOf)");
    }
}
