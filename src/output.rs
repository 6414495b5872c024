use crate::error::Result;
use crate::session::RunContext;
use crate::summary::{diagnostic_message, CONSOLE_RECOMMENDATION};
use crate::types::{MonthlyRevenueRow, PreviewRow, ProductRevenueRow, TrendDiagnostic};
use crate::util::{format_eur, format_int, text_bar};
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

const BAR_WIDTH: usize = 30;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(aucune ligne)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// First rows of the upload, restricted to the detected columns.
pub fn preview_rows(ctx: &RunContext, max_rows: usize) -> Vec<PreviewRow> {
    let roles = &ctx.roles;
    (0..ctx.dataset.len().min(max_rows))
        .map(|i| PreviewRow {
            date: ctx.dataset.value(i, roles.date.index).unwrap_or("").to_string(),
            product: roles
                .product
                .as_ref()
                .and_then(|c| ctx.dataset.value(i, c.index))
                .unwrap_or("")
                .to_string(),
            amount: ctx.dataset.value(i, roles.amount.index).unwrap_or("").to_string(),
        })
        .collect()
}

pub fn monthly_rows(ctx: &RunContext) -> Vec<MonthlyRevenueRow> {
    let monthly = &ctx.aggregates.monthly;
    let max = monthly.iter().map(|m| m.amount).max().unwrap_or(Decimal::ZERO);
    monthly
        .iter()
        .map(|m| MonthlyRevenueRow {
            month: m.month.clone(),
            revenue: format_eur(m.amount),
            bar: text_bar(m.amount, max, BAR_WIDTH),
        })
        .collect()
}

pub fn product_rows(ctx: &RunContext) -> Vec<ProductRevenueRow> {
    let Some(top) = ctx.aggregates.top_products.as_ref() else {
        return Vec::new();
    };
    let max = top.first().map_or(Decimal::ZERO, |p| p.amount);
    top.iter()
        .enumerate()
        .map(|(idx, p)| ProductRevenueRow {
            rank: idx + 1,
            product: p.product.clone(),
            revenue: format_eur(p.amount),
            bar: text_bar(p.amount, max, BAR_WIDTH),
        })
        .collect()
}

/// Opening lines of the console report: source, row counts, dropped rows.
pub fn load_lines(ctx: &RunContext) -> Vec<String> {
    let load = &ctx.load;
    let mut lines = vec![format!(
        "Analyse de {}... ({} lignes lues, {} retenues)",
        ctx.source,
        format_int(load.total_rows),
        format_int(load.retained_rows)
    )];
    if load.dropped_rows() > 0 {
        lines.push(format!(
            "Note : {} lignes ignorées ({} dates illisibles, {} montants illisibles).",
            format_int(load.dropped_rows()),
            format_int(load.invalid_dates),
            format_int(load.invalid_amounts)
        ));
    }
    lines
}

/// Console rendition of a run: preview, headline metric, charts, diagnostic.
pub fn print_run(ctx: &RunContext, preview: usize) {
    for line in load_lines(ctx) {
        println!("{}", line);
    }

    let detected = format!(
        "colonnes détectées : date = {}, montant = {}, produit = {}",
        ctx.roles.date.name,
        ctx.roles.amount.name,
        ctx.roles.product.as_ref().map_or("-", |c| c.name.as_str())
    );
    preview_table(
        "Aperçu des données",
        Some(detected.as_str()),
        &preview_rows(ctx, preview),
        preview,
    );

    println!(
        "Chiffre d'affaires total : {}\n",
        format_eur(ctx.aggregates.total_revenue)
    );

    let months = monthly_rows(ctx);
    preview_table("Revenus mensuels", None, &months, months.len());

    if ctx.aggregates.top_products.is_some() {
        let products = product_rows(ctx);
        preview_table("Top produits", None, &products, products.len());
    }

    println!("Diagnostic automatique");
    match ctx.aggregates.trend {
        TrendDiagnostic::Decline => {
            println!("[ATTENTION] {}", diagnostic_message(ctx.aggregates.trend))
        }
        TrendDiagnostic::AboveAverage => {
            println!("[OK] {}", diagnostic_message(ctx.aggregates.trend))
        }
    }
    println!("\nRecommandation :\n{}\n", CONSOLE_RECOMMENDATION);
}
