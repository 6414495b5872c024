use crate::error::{AutomatorError, Result};
use crate::types::{ColumnRoles, Dataset, LoadReport, NormalizedRow};
use crate::util::{month_key, parse_amount, parse_date_safe};
use csv::ReaderBuilder;
use log::{info, warn};
use std::io::Read;
use std::path::Path;

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    let dataset = read_dataset(file)?;
    info!(
        "loaded {} rows, {} columns from {}",
        dataset.len(),
        dataset.headers.len(),
        path.display()
    );
    Ok(dataset)
}

/// Read a CSV with a header row. Short or long records are kept as-is.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();
    if headers.is_empty() {
        return Err(AutomatorError::EmptyFile);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Dataset::new(headers, rows))
}

/// Turn raw rows into typed rows, dropping any without a usable date or amount.
///
/// The drop counts travel back in the `LoadReport` so callers can show them.
pub fn normalize(dataset: &Dataset, roles: &ColumnRoles) -> (Vec<NormalizedRow>, LoadReport) {
    let mut invalid_dates = 0usize;
    let mut invalid_amounts = 0usize;
    let mut out: Vec<NormalizedRow> = Vec::with_capacity(dataset.len());

    for i in 0..dataset.len() {
        let date = match parse_date_safe(dataset.value(i, roles.date.index)) {
            Some(d) => d,
            None => {
                invalid_dates += 1;
                continue;
            }
        };
        let amount = match parse_amount(dataset.value(i, roles.amount.index)) {
            Some(a) => a,
            None => {
                invalid_amounts += 1;
                continue;
            }
        };
        // Blank product cells stay `None`: counted in revenue, left out of the ranking.
        let product = roles
            .product
            .as_ref()
            .and_then(|col| dataset.value(i, col.index))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        out.push(NormalizedRow {
            date,
            month: month_key(date),
            amount,
            product,
        });
    }

    let report = LoadReport {
        total_rows: dataset.len(),
        retained_rows: out.len(),
        invalid_dates,
        invalid_amounts,
    };
    if report.dropped_rows() > 0 {
        warn!(
            "dropped {} rows ({} unparseable dates, {} missing or invalid amounts)",
            report.dropped_rows(),
            invalid_dates,
            invalid_amounts
        );
    }
    info!("{} of {} rows retained", report.retained_rows, report.total_rows);
    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_columns;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    const SAMPLE: &str = "\
Date,Product,Amount
2024-01-05,Widget,100
N/A,Widget,999
2024-01-20,,50
2024-02-10,Gadget,
2024-02-11,Gadget,abc
2024-02-12,Gadget,SKU-7: 20
";

    #[test]
    fn reads_headers_and_rows() {
        let ds = read_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.headers, vec!["Date", "Product", "Amount"]);
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.value(0, 1), Some("Widget"));
    }

    #[test]
    fn strips_bom_and_whitespace_from_headers() {
        let ds = read_dataset("\u{feff}Date , Amount\n2024-01-01,1\n".as_bytes()).unwrap();
        assert_eq!(ds.headers, vec!["Date", "Amount"]);
    }

    #[test]
    fn tolerates_short_rows() {
        let ds = read_dataset("Date,Amount,Product\n2024-01-01,5\n".as_bytes()).unwrap();
        let roles = detect_columns(&ds.headers).require().unwrap();
        let (rows, report) = normalize(&ds, &roles);
        assert_eq!(report.retained_rows, 1);
        assert_eq!(rows[0].product, None);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = read_dataset("".as_bytes()).unwrap_err();
        assert!(matches!(err, AutomatorError::EmptyFile));
    }

    #[test]
    fn normalize_counts_dropped_rows() {
        let ds = read_dataset(SAMPLE.as_bytes()).unwrap();
        let roles = detect_columns(&ds.headers).require().unwrap();
        let (rows, report) = normalize(&ds, &roles);

        assert_eq!(
            report,
            LoadReport {
                total_rows: 6,
                retained_rows: 2,
                invalid_dates: 1,
                invalid_amounts: 3,
            }
        );
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(rows[0].month, "2024-01");
        assert_eq!(rows[0].amount, Decimal::from(100));
        assert_eq!(rows[0].product.as_deref(), Some("Widget"));
        assert_eq!(rows[1].product, None);
        assert_eq!(rows[1].amount, Decimal::from(50));
    }
}
