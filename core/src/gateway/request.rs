//! JSON bodies for the query endpoints.

use chrono::NaiveDate;
use dashboard_types::{QuerySnapshot, ValueSets};
use serde::Serialize;

/// Body of `POST /query/table`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRequest<'a> {
    pub field: &'a str,
    pub measure: &'a str,
    pub asof_date: NaiveDate,
    pub prev_date: NaiveDate,
    pub filters: &'a ValueSets,
    pub exclusions: &'a ValueSets,
}

impl<'a> TableRequest<'a> {
    /// `None` when either comparison date is unset; there is nothing to compare.
    pub fn build(
        snapshot: &'a QuerySnapshot,
        field: &'a str,
        default_measure: &'a str,
    ) -> Option<Self> {
        Some(Self {
            field,
            measure: snapshot.measure().unwrap_or(default_measure),
            asof_date: snapshot.asof_date()?,
            prev_date: snapshot.prev_date()?,
            filters: snapshot.filters(),
            exclusions: snapshot.exclusions(),
        })
    }
}

/// Body of `POST /query/trend`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRequest<'a> {
    pub category_field: &'a str,
    pub measure: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filters: &'a ValueSets,
    pub exclusions: &'a ValueSets,
}

impl<'a> TrendRequest<'a> {
    /// `None` when the as-of date is unset. The window ends at the as-of date.
    pub fn build(
        snapshot: &'a QuerySnapshot,
        field: &'a str,
        default_measure: &'a str,
    ) -> Option<Self> {
        let end_date = snapshot.asof_date()?;
        Some(Self {
            category_field: field,
            measure: snapshot.measure().unwrap_or(default_measure),
            start_date: snapshot.chart_window().start_date(end_date),
            end_date,
            filters: snapshot.filters(),
            exclusions: snapshot.exclusions(),
        })
    }
}
