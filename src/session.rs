//! One upload, start to finish: load -> detect -> normalize -> aggregate -> report.
//!
//! Everything a run produces lives in its own [`RunContext`]; loading another
//! file builds a fresh context instead of mutating shared state.

use crate::detect::detect_columns;
use crate::error::Result;
use crate::loader::{load_dataset, normalize, read_dataset};
use crate::output::{monthly_rows, product_rows, write_bytes, write_csv, write_json};
use crate::pdf::{render_pdf, RenderedPdf, DEFAULT_PDF_NAME};
use crate::reports::{aggregate, DEFAULT_TOP_N};
use crate::summary::{build_report, RecommendationMode};
use crate::types::{Aggregates, ColumnRoles, Dataset, LoadReport, Report, SummaryStats};
use log::info;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub top_n: usize,
    pub preview_rows: usize,
    pub recommendation: RecommendationMode,
    pub pdf_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            top_n: DEFAULT_TOP_N,
            preview_rows: 5,
            recommendation: RecommendationMode::default(),
            pdf_path: PathBuf::from(DEFAULT_PDF_NAME),
            json_path: None,
            csv_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunContext {
    pub source: String,
    pub dataset: Dataset,
    pub roles: ColumnRoles,
    pub load: LoadReport,
    pub aggregates: Aggregates,
    pub report: Report,
}

/// Files written by [`RunContext::export`].
#[derive(Debug, Default)]
pub struct Exported {
    pub pdf: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub csv: Vec<PathBuf>,
}

pub fn run(path: &Path, options: &RunOptions) -> Result<RunContext> {
    let dataset = load_dataset(path)?;
    process(path.display().to_string(), dataset, options)
}

pub fn run_from_reader<R: Read>(source: &str, reader: R, options: &RunOptions) -> Result<RunContext> {
    let dataset = read_dataset(reader)?;
    process(source.to_string(), dataset, options)
}

fn process(source: String, dataset: Dataset, options: &RunOptions) -> Result<RunContext> {
    let roles = detect_columns(&dataset.headers).require()?;
    let (rows, load) = normalize(&dataset, &roles);
    let aggregates = aggregate(
        &rows,
        roles.product.is_some(),
        options.top_n,
        load.total_rows,
    )?;
    let report = build_report(&aggregates, &load, options.recommendation);
    info!(
        "report ready for {}: {} months, total {}",
        source,
        aggregates.monthly.len(),
        aggregates.total_revenue
    );
    Ok(RunContext {
        source,
        dataset,
        roles,
        load,
        aggregates,
        report,
    })
}

impl RunContext {
    pub fn summary_stats(&self) -> SummaryStats {
        SummaryStats {
            source: self.source.clone(),
            columns: self.roles.clone(),
            load: self.load.clone(),
            total_revenue: self.aggregates.total_revenue,
            period_start: self.aggregates.first_date,
            period_end: self.aggregates.last_date,
            monthly: self.aggregates.monthly.clone(),
            top_products: self.aggregates.top_products.clone(),
            trend: self.aggregates.trend,
        }
    }

    pub fn render_pdf(&self) -> Result<RenderedPdf> {
        render_pdf(&self.report)
    }

    /// Write the PDF plus whichever optional exports the options ask for.
    pub fn export(&self, options: &RunOptions) -> Result<Exported> {
        let mut exported = Exported::default();

        let pdf = self.render_pdf()?;
        write_bytes(&options.pdf_path, &pdf.bytes)?;
        exported.pdf = Some(options.pdf_path.clone());

        if let Some(path) = &options.json_path {
            write_json(path, &self.summary_stats())?;
            exported.json = Some(path.clone());
        }

        if let Some(dir) = &options.csv_dir {
            std::fs::create_dir_all(dir)?;
            let monthly = dir.join("monthly_revenue.csv");
            write_csv(&monthly, &monthly_rows(self))?;
            exported.csv.push(monthly);
            if self.aggregates.top_products.is_some() {
                let products = dir.join("top_products.csv");
                write_csv(&products, &product_rows(self))?;
                exported.csv.push(products);
            }
        }
        Ok(exported)
    }
}
