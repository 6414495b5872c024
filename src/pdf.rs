//! A4 PDF export of a [`Report`].
//!
//! Every page starts with the centred report title and a grey rule; each
//! section is a bold sub-heading followed by its body lines. The built-in
//! Helvetica faces only cover Latin-1, so all text is sanitized first.

use log::{debug, warn};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use crate::error::{AutomatorError, Result};
use crate::types::Report;
use crate::util::sanitize_latin1;

pub const DEFAULT_PDF_NAME: &str = "rapport_automator.pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 15.0;
const LAYER: &str = "Layer 1";

const TITLE_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const BODY_LINE_HEIGHT: f32 = 8.0;
const WRAP_COLUMNS: usize = 95;

// Average Helvetica advance as a fraction of the font size, pt -> mm.
const AVG_CHAR_EM: f32 = 0.55;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub replaced_chars: usize,
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    title: String,
    /// Distance from the bottom edge, in mm.
    y: f32,
    pages: usize,
    replaced: usize,
}

fn pdf_err(e: printpdf::Error) -> AutomatorError {
    AutomatorError::Pdf(e.to_string())
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(line: &str, columns: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > columns {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(columns).collect();
            word = word.chars().skip(columns).collect();
            out.push(head);
        }
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > columns && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (title, replaced) = sanitize_latin1(title);
        let (doc, page, layer) =
            PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        let mut writer = PageWriter {
            doc,
            layer,
            regular,
            bold,
            title,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
            replaced,
        };
        writer.header();
        Ok(writer)
    }

    fn header(&mut self) {
        let width = self.title.chars().count() as f32 * TITLE_SIZE * AVG_CHAR_EM * PT_TO_MM;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        self.layer.set_fill_color(rgb(30, 30, 30));
        self.layer
            .use_text(self.title.clone(), TITLE_SIZE, Mm(x), Mm(self.y - 7.0), &self.bold);
        self.y -= 10.0 + 5.0;

        self.layer.set_outline_color(rgb(200, 200, 200));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(self.y)), false),
            ],
            is_closed: false,
        });
        self.y -= 5.0;
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
        self.header();
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < BOTTOM_MARGIN {
            self.new_page();
        }
    }

    fn section_title(&mut self, title: &str) {
        let (title, replaced) = sanitize_latin1(title);
        self.replaced += replaced;
        // Keep a heading together with at least one body line.
        self.ensure_space(12.0 + BODY_LINE_HEIGHT);
        self.layer.set_fill_color(rgb(60, 60, 60));
        self.layer
            .use_text(title, HEADING_SIZE, Mm(MARGIN), Mm(self.y - 7.0), &self.bold);
        self.y -= 10.0 + 2.0;
    }

    fn section_body(&mut self, body: &str) {
        let (body, replaced) = sanitize_latin1(body);
        self.replaced += replaced;
        self.layer.set_fill_color(rgb(50, 50, 50));
        for raw in body.lines() {
            for line in wrap(raw, WRAP_COLUMNS) {
                if self.y - BODY_LINE_HEIGHT < BOTTOM_MARGIN {
                    self.new_page();
                    self.layer.set_fill_color(rgb(50, 50, 50));
                }
                if !line.is_empty() {
                    self.layer
                        .use_text(line, BODY_SIZE, Mm(MARGIN), Mm(self.y - 5.5), &self.regular);
                }
                self.y -= BODY_LINE_HEIGHT;
            }
        }
        self.y -= 3.0;
    }

    fn finish(self) -> Result<RenderedPdf> {
        debug!("pdf laid out on {} page(s)", self.pages);
        let replaced_chars = self.replaced;
        let bytes = self.doc.save_to_bytes().map_err(pdf_err)?;
        Ok(RenderedPdf { bytes, replaced_chars })
    }
}

/// Lay the report out and return the finished document bytes.
pub fn render_pdf(report: &Report) -> Result<RenderedPdf> {
    let mut writer = PageWriter::new(&report.title)?;
    for section in &report.sections {
        writer.section_title(&section.title);
        writer.section_body(&section.body);
    }
    let rendered = writer.finish()?;
    if rendered.replaced_chars > 0 {
        warn!(
            "{} character(s) outside Latin-1 were replaced in the PDF",
            rendered.replaced_chars
        );
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Section;

    fn report(body: &str) -> Report {
        Report {
            title: "Rapport Business Insights Automator+".to_string(),
            sections: vec![
                Section { title: "Résumé général".into(), body: body.into() },
                Section { title: "Produits".into(), body: "Aucune colonne produit détectée.".into() },
            ],
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap("", 5), vec![""]);
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn renders_a_pdf_document() {
        let rendered = render_pdf(&report("Chiffre d'affaires total : 350.00 EUR")).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.replaced_chars, 0);
    }

    #[test]
    fn non_latin1_text_is_replaced_not_fatal() {
        let rendered = render_pdf(&report("Total : 350 € 📈")).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.replaced_chars, 2);
    }

    #[test]
    fn long_reports_spill_onto_new_pages() {
        let body: Vec<String> = (0..120).map(|i| format!("- 2024-{:02}: {}.00 EUR", i % 12 + 1, i)).collect();
        let rendered = render_pdf(&report(&body.join("\n"))).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }
}
