//! Sales CSV -> revenue report.
//!
//! The pipeline detects the date/amount/product columns of an upload,
//! aggregates revenue per month and per product, and renders the result as
//! console tables and a PDF summary.

pub mod detect;
pub mod error;
pub mod loader;
pub mod output;
pub mod pdf;
pub mod reports;
pub mod session;
pub mod summary;
pub mod types;
pub mod util;

pub use error::{AutomatorError, Result};
pub use pdf::{DEFAULT_PDF_NAME, PDF_MIME_TYPE};
pub use session::{run, run_from_reader, RunContext, RunOptions};
