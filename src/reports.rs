use crate::error::{AutomatorError, Result};
use crate::types::{Aggregates, MonthlyRevenue, NormalizedRow, ProductRevenue, TrendDiagnostic};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_TOP_N: usize = 5;

fn checked_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

fn add_to(slot: &mut Decimal, amount: Decimal, what: &'static str) -> Result<()> {
    *slot = slot
        .checked_add(amount)
        .ok_or(AutomatorError::RevenueOverflow { what })?;
    Ok(())
}

pub fn total_revenue(rows: &[NormalizedRow]) -> Result<Decimal> {
    checked_sum(rows.iter().map(|r| r.amount))
        .ok_or(AutomatorError::RevenueOverflow { what: "ventes" })
}

/// Revenue per `YYYY-MM`, ascending by month.
pub fn monthly_revenue(rows: &[NormalizedRow]) -> Result<Vec<MonthlyRevenue>> {
    let mut map: BTreeMap<&str, Decimal> = BTreeMap::new();
    for r in rows {
        add_to(map.entry(r.month.as_str()).or_default(), r.amount, "revenus mensuels")?;
    }
    Ok(map
        .into_iter()
        .map(|(month, amount)| MonthlyRevenue {
            month: month.to_string(),
            amount,
        })
        .collect())
}

/// Highest-revenue products, descending; equal revenue sorts by name.
///
/// Rows without a product value count toward the totals but are not ranked.
pub fn top_products(rows: &[NormalizedRow], n: usize) -> Result<Vec<ProductRevenue>> {
    let mut map: HashMap<&str, Decimal> = HashMap::new();
    for r in rows {
        if let Some(p) = r.product.as_deref() {
            add_to(map.entry(p).or_default(), r.amount, "revenus par produit")?;
        }
    }
    let mut ranked: Vec<(&str, Decimal)> = map.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    Ok(ranked
        .into_iter()
        .take(n)
        .map(|(product, amount)| ProductRevenue {
            product: product.to_string(),
            amount,
        })
        .collect())
}

/// Last month against the mean of all months. A tie counts as above average.
pub fn trend_diagnostic(monthly: &[MonthlyRevenue]) -> Option<TrendDiagnostic> {
    let last = monthly.last()?.amount;
    let count = Decimal::from(monthly.len() as u64);
    // Mixed-sign months can overflow the running sum even when the total fits;
    // averaging the shares instead stays in range.
    let mean = match checked_sum(monthly.iter().map(|m| m.amount)) {
        Some(sum) => sum / count,
        None => monthly.iter().map(|m| m.amount / count).sum(),
    };
    if last < mean {
        Some(TrendDiagnostic::Decline)
    } else {
        Some(TrendDiagnostic::AboveAverage)
    }
}

/// Every figure the report needs. Fails when no row survived normalization
/// or when the sums do not fit in a decimal.
///
/// `rank_products` is set when the upload has a Product column; the ranking
/// is then present even if every product cell was blank.
pub fn aggregate(
    rows: &[NormalizedRow],
    rank_products: bool,
    top_n: usize,
    total_rows: usize,
) -> Result<Aggregates> {
    let no_rows = || AutomatorError::NoValidRows { total_rows };
    let first_date = rows.iter().map(|r| r.date).min().ok_or_else(no_rows)?;
    let last_date = rows.iter().map(|r| r.date).max().ok_or_else(no_rows)?;

    let total_revenue = total_revenue(rows)?;
    let monthly = monthly_revenue(rows)?;
    let trend = trend_diagnostic(&monthly).ok_or_else(no_rows)?;
    let top_products = if rank_products {
        Some(top_products(rows, top_n.max(1))?)
    } else {
        None
    };
    debug!(
        "aggregated {} rows into {} months, {} products",
        rows.len(),
        monthly.len(),
        top_products.as_ref().map_or(0, Vec::len)
    );

    Ok(Aggregates {
        total_revenue,
        row_count: rows.len(),
        first_date,
        last_date,
        monthly,
        top_products,
        trend,
    })
}
