// Entry point and high-level CLI flow.
//
// With a CSV path on the command line the binary runs once: console report,
// PDF export, optional JSON/CSV exports. Without one it opens a small menu:
// - Option [1] loads a CSV and prints the report; a new load replaces the
//   previous one.
// - Option [2] prints the current report again.
// - Option [3] exports the current report.
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use insights_automator::output::print_run;
use insights_automator::summary::RecommendationMode;
use insights_automator::util::format_int;
use insights_automator::{run, RunContext, RunOptions, DEFAULT_PDF_NAME, PDF_MIME_TYPE};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sales CSV export (Stripe, Shopify, ...). Opens the menu when omitted.
    input: Option<PathBuf>,

    /// PDF report path
    #[arg(short, long, default_value = DEFAULT_PDF_NAME)]
    output: PathBuf,

    /// Also write a JSON summary to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Also write monthly/product CSV tables into this directory
    #[arg(long, value_name = "DIR")]
    export_csv: Option<PathBuf>,

    /// Rows shown in the data preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Number of products in the ranking
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    top: u16,

    /// Keep the diagnostic sentence out of the PDF recommendation section
    #[arg(long)]
    static_recommendation: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            top_n: usize::from(self.top),
            preview_rows: self.preview_rows,
            recommendation: if self.static_recommendation {
                RecommendationMode::Static
            } else {
                RecommendationMode::WithDiagnostic
            },
            pdf_path: self.output.clone(),
            json_path: self.json.clone(),
            csv_dir: self.export_csv.clone(),
        }
    }
}

/// Read a single line of input after printing `prompt`. `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn export(ctx: &RunContext, options: &RunOptions) -> Result<()> {
    let exported = ctx
        .export(options)
        .with_context(|| format!("échec de l'export du rapport pour {}", ctx.source))?;
    if let Some(pdf) = &exported.pdf {
        println!("Rapport PDF enregistré : {} ({})", pdf.display(), PDF_MIME_TYPE);
    }
    if let Some(json) = &exported.json {
        println!("Résumé JSON : {}", json.display());
    }
    for csv in &exported.csv {
        println!("Table CSV : {}", csv.display());
    }
    println!();
    Ok(())
}

/// Handle option [1]: load a file and show its report.
///
/// A failed load leaves no report behind; the previous one is discarded too.
fn handle_load(current: &mut Option<RunContext>, options: &RunOptions) {
    let path = read_line("Chemin du fichier CSV : ").unwrap_or_default();
    if path.is_empty() {
        println!("Aucun fichier indiqué.\n");
        return;
    }
    *current = None;
    match run(Path::new(&path), options) {
        Ok(ctx) => {
            print_run(&ctx, options.preview_rows);
            *current = Some(ctx);
        }
        Err(e) => {
            eprintln!("Erreur : {}\n", e);
        }
    }
}

fn with_report(current: &Option<RunContext>, f: impl FnOnce(&RunContext)) {
    match current {
        Some(ctx) => f(ctx),
        None => println!("Erreur : aucune donnée chargée. Charge d'abord un fichier CSV (option 1).\n"),
    }
}

fn menu(options: &RunOptions) {
    let mut current: Option<RunContext> = None;
    loop {
        println!("Business Insights Automator+");
        println!("[1] Charger un fichier CSV");
        println!("[2] Afficher le rapport");
        println!("[3] Exporter le PDF");
        println!("[0] Quitter\n");
        let Some(choice) = read_line("Ton choix : ") else {
            println!();
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut current, options),
            "2" => with_report(&current, |ctx| print_run(ctx, options.preview_rows)),
            "3" => with_report(&current, |ctx| {
                if let Err(e) = export(ctx, options) {
                    eprintln!("Erreur : {:#}\n", e);
                }
            }),
            "0" => {
                println!("Au revoir.");
                break;
            }
            _ => println!("Choix invalide. Tape 0, 1, 2 ou 3.\n"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let options = cli.options();
    let Some(input) = cli.input.as_ref() else {
        menu(&options);
        return Ok(());
    };

    let ctx = run(input, &options).with_context(|| format!("impossible de construire le rapport à partir de {}", input.display()))?;
    print_run(&ctx, options.preview_rows);
    export(&ctx, &options)?;
    println!(
        "{} ventes analysées sur {} mois.",
        format_int(ctx.aggregates.row_count),
        ctx.aggregates.monthly.len()
    );
    Ok(())
}
