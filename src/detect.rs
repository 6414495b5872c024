//! Column detection by keyword matching on header names.
//!
//! Matching is case-insensitive substring search; for each role the first
//! header (in file order) containing one of the role's keywords wins.

use log::debug;

use crate::error::{AutomatorError, Result};
use crate::types::{Column, ColumnRole, ColumnRoles, DetectedColumns};

const DATE_KEYWORDS: &[&str] = &["date"];
const AMOUNT_KEYWORDS: &[&str] = &["amount", "total"];
const PRODUCT_KEYWORDS: &[&str] = &["product", "item", "description"];

fn first_match(headers: &[String], keywords: &[&str]) -> Option<Column> {
    headers.iter().enumerate().find_map(|(index, name)| {
        let lower = name.to_lowercase();
        keywords
            .iter()
            .any(|k| lower.contains(k))
            .then(|| Column { index, name: name.clone() })
    })
}

/// Find the Date, Amount and Product columns. Never fails; missing roles are `None`.
pub fn detect_columns(headers: &[String]) -> DetectedColumns {
    let detected = DetectedColumns {
        date: first_match(headers, DATE_KEYWORDS),
        amount: first_match(headers, AMOUNT_KEYWORDS),
        product: first_match(headers, PRODUCT_KEYWORDS),
    };
    debug!(
        "detected columns: date={:?} amount={:?} product={:?}",
        detected.date.as_ref().map(|c| c.name.as_str()),
        detected.amount.as_ref().map(|c| c.name.as_str()),
        detected.product.as_ref().map(|c| c.name.as_str()),
    );
    detected
}

impl DetectedColumns {
    /// Gate for the rest of the pipeline: Date and Amount must both be present.
    pub fn require(self) -> Result<ColumnRoles> {
        let date = self.date.ok_or(AutomatorError::MissingRequiredColumn {
            role: ColumnRole::Date,
        })?;
        let amount = self.amount.ok_or(AutomatorError::MissingRequiredColumn {
            role: ColumnRole::Amount,
        })?;
        Ok(ColumnRoles {
            date,
            amount,
            product: self.product,
        })
    }
}
