use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// Raw upload: header names plus every record as strings, in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Dataset { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup that tolerates short rows.
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnRole {
    Date,
    Amount,
    Product,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnRole::Date => "date",
            ColumnRole::Amount => "montant",
            ColumnRole::Product => "produit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub index: usize,
    pub name: String,
}

/// Raw detector output; any role may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedColumns {
    pub date: Option<Column>,
    pub amount: Option<Column>,
    pub product: Option<Column>,
}

/// Detector output once the required roles are known to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRoles {
    pub date: Column,
    pub amount: Column,
    pub product: Option<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    /// `YYYY-MM`
    pub month: String,
    pub amount: Decimal,
    pub product: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub retained_rows: usize,
    pub invalid_dates: usize,
    pub invalid_amounts: usize,
}

impl LoadReport {
    pub fn dropped_rows(&self) -> usize {
        self.invalid_dates + self.invalid_amounts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDiagnostic {
    Decline,
    AboveAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub total_revenue: Decimal,
    pub row_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub monthly: Vec<MonthlyRevenue>,
    pub top_products: Option<Vec<ProductRevenue>>,
    pub trend: TrendDiagnostic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub source: String,
    pub columns: ColumnRoles,
    pub load: LoadReport,
    pub total_revenue: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub monthly: Vec<MonthlyRevenue>,
    pub top_products: Option<Vec<ProductRevenue>>,
    pub trend: TrendDiagnostic,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PreviewRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Produit")]
    pub product: String,
    #[tabled(rename = "Montant")]
    pub amount: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyRevenueRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Mois")]
    pub month: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Chiffre d'affaires")]
    pub revenue: String,
    #[serde(skip)]
    #[tabled(rename = "")]
    pub bar: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductRevenueRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "#")]
    pub rank: usize,
    #[serde(rename = "Product")]
    #[tabled(rename = "Produit")]
    pub product: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Chiffre d'affaires")]
    pub revenue: String,
    #[serde(skip)]
    #[tabled(rename = "")]
    pub bar: String,
}
