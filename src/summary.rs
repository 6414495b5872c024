//! Report text assembly: the four titled sections shared by the console
//! view and the PDF export.

use crate::types::{Aggregates, LoadReport, Report, Section, TrendDiagnostic};
use crate::util::{format_eur, format_int};

pub const REPORT_TITLE: &str = "Rapport Business Insights Automator+";

pub const SUMMARY_TITLE: &str = "Résumé général";
pub const TOP_PRODUCTS_TITLE: &str = "Produits les plus rentables";
pub const NO_PRODUCTS_TITLE: &str = "Produits";
pub const NO_PRODUCTS_BODY: &str = "Aucune colonne produit détectée.";
pub const BLANK_PRODUCTS_BODY: &str = "Aucun nom de produit renseigné dans le fichier.";
pub const MONTHLY_TITLE: &str = "Revenus mensuels";
pub const DIAGNOSTIC_TITLE: &str = "Diagnostic & Recommandations";

pub const DECLINE_MESSAGE: &str =
    "Tes ventes du dernier mois sont en baisse par rapport à ta moyenne.";
pub const ABOVE_AVERAGE_MESSAGE: &str = "Tes ventes sont supérieures à la moyenne !";

/// Recommendation printed in the PDF.
pub const RECOMMENDATION: &str = "\
Nous te recommandons de relancer tes meilleures offres avec un message fort ou un pack combiné.
Pense également à identifier les mois les plus faibles pour tester des campagnes ciblées.
Enfin, mets en avant ton produit phare ou crée une offre complémentaire.";

/// Recommendation shown on the console.
pub const CONSOLE_RECOMMENDATION: &str = "\
Pour booster ton chiffre d'affaires, relance ton produit phare en proposant une offre spéciale ou un pack promotionnel.
Pense aussi à diversifier ton catalogue avec des services complémentaires qui répondent aux besoins de tes clients actuels.
Enfin, automatise le suivi de tes clients pour augmenter leur fidélité et leur panier moyen.";

/// Whether the diagnostic sentence is written into the recommendation section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecommendationMode {
    #[default]
    WithDiagnostic,
    Static,
}

pub fn diagnostic_message(trend: TrendDiagnostic) -> &'static str {
    match trend {
        TrendDiagnostic::Decline => DECLINE_MESSAGE,
        TrendDiagnostic::AboveAverage => ABOVE_AVERAGE_MESSAGE,
    }
}

fn summary_section(agg: &Aggregates, load: &LoadReport) -> Section {
    let mut lines = vec![
        format!("Chiffre d'affaires total : {}", format_eur(agg.total_revenue)),
        format!("Nombre de ventes : {}", format_int(agg.row_count)),
        format!(
            "Période couverte : {} à {}",
            agg.first_date.format("%Y-%m-%d"),
            agg.last_date.format("%Y-%m-%d")
        ),
    ];
    if load.dropped_rows() > 0 {
        lines.push(format!(
            "Lignes ignorées : {} (date ou montant illisible)",
            format_int(load.dropped_rows())
        ));
    }
    Section {
        title: SUMMARY_TITLE.to_string(),
        body: lines.join("\n"),
    }
}

fn products_section(agg: &Aggregates) -> Section {
    match &agg.top_products {
        Some(top) if top.is_empty() => Section {
            title: TOP_PRODUCTS_TITLE.to_string(),
            body: BLANK_PRODUCTS_BODY.to_string(),
        },
        Some(top) => Section {
            title: TOP_PRODUCTS_TITLE.to_string(),
            body: top
                .iter()
                .map(|p| format!("- {}: {}", p.product, format_eur(p.amount)))
                .collect::<Vec<_>>()
                .join("\n"),
        },
        None => Section {
            title: NO_PRODUCTS_TITLE.to_string(),
            body: NO_PRODUCTS_BODY.to_string(),
        },
    }
}

fn monthly_section(agg: &Aggregates) -> Section {
    Section {
        title: MONTHLY_TITLE.to_string(),
        body: agg
            .monthly
            .iter()
            .map(|m| format!("- {}: {}", m.month, format_eur(m.amount)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn diagnostic_section(agg: &Aggregates, mode: RecommendationMode) -> Section {
    let body = match mode {
        RecommendationMode::WithDiagnostic => {
            format!("{}\n\n{}", diagnostic_message(agg.trend), RECOMMENDATION)
        }
        RecommendationMode::Static => RECOMMENDATION.to_string(),
    };
    Section {
        title: DIAGNOSTIC_TITLE.to_string(),
        body,
    }
}

/// Sections in fixed order: summary, products, monthly revenue, diagnostic.
pub fn build_report(agg: &Aggregates, load: &LoadReport, mode: RecommendationMode) -> Report {
    Report {
        title: REPORT_TITLE.to_string(),
        sections: vec![
            summary_section(agg, load),
            products_section(agg),
            monthly_section(agg),
            diagnostic_section(agg, mode),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MonthlyRevenue, ProductRevenue};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn aggregates(top_products: Option<Vec<ProductRevenue>>) -> Aggregates {
        Aggregates {
            total_revenue: Decimal::new(123_456_789, 2),
            row_count: 1_204,
            first_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            last_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            monthly: vec![
                MonthlyRevenue { month: "2024-01".into(), amount: Decimal::new(1_000_000, 2) },
                MonthlyRevenue { month: "2024-02".into(), amount: Decimal::new(113_456_789, 2) },
            ],
            top_products,
            trend: TrendDiagnostic::AboveAverage,
        }
    }

    fn load(dropped: usize) -> LoadReport {
        LoadReport {
            total_rows: 1_204 + dropped,
            retained_rows: 1_204,
            invalid_dates: dropped,
            invalid_amounts: 0,
        }
    }

    #[test]
    fn sections_come_in_fixed_order() {
        let report = build_report(&aggregates(None), &load(0), RecommendationMode::default());
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![SUMMARY_TITLE, NO_PRODUCTS_TITLE, MONTHLY_TITLE, DIAGNOSTIC_TITLE]
        );
        assert_eq!(report.sections[1].body, NO_PRODUCTS_BODY);
    }

    #[test]
    fn summary_lists_total_count_and_period() {
        let report = build_report(&aggregates(None), &load(0), RecommendationMode::default());
        assert_eq!(
            report.sections[0].body,
            "Chiffre d'affaires total : 1,234,567.89 EUR\n\
             Nombre de ventes : 1,204\n\
             Période couverte : 2024-01-05 à 2024-02-10"
        );
    }

    #[test]
    fn summary_mentions_dropped_rows() {
        let report = build_report(&aggregates(None), &load(3), RecommendationMode::default());
        assert!(report.sections[0].body.ends_with("Lignes ignorées : 3 (date ou montant illisible)"));
    }

    #[test]
    fn product_and_month_lines() {
        let top = vec![
            ProductRevenue { product: "Widget".into(), amount: Decimal::from(300) },
            ProductRevenue { product: "Gadget".into(), amount: Decimal::new(5_005, 1) },
        ];
        let report = build_report(&aggregates(Some(top)), &load(0), RecommendationMode::default());
        assert_eq!(report.sections[1].title, TOP_PRODUCTS_TITLE);
        assert_eq!(
            report.sections[1].body,
            "- Widget: 300.00 EUR\n- Gadget: 500.50 EUR"
        );
        assert_eq!(
            report.sections[2].body,
            "- 2024-01: 10,000.00 EUR\n- 2024-02: 1,134,567.89 EUR"
        );
    }

    #[test]
    fn product_column_without_names_gets_a_placeholder() {
        let report = build_report(&aggregates(Some(vec![])), &load(0), RecommendationMode::default());
        assert_eq!(report.sections[1].title, TOP_PRODUCTS_TITLE);
        assert_eq!(report.sections[1].body, BLANK_PRODUCTS_BODY);
    }

    #[test]
    fn recommendation_mode_controls_diagnostic_line() {
        let mut agg = aggregates(None);
        agg.trend = TrendDiagnostic::Decline;
        let wired = build_report(&agg, &load(0), RecommendationMode::WithDiagnostic);
        assert!(wired.sections[3].body.starts_with(DECLINE_MESSAGE));
        assert!(wired.sections[3].body.ends_with(RECOMMENDATION));

        let fixed = build_report(&agg, &load(0), RecommendationMode::Static);
        assert_eq!(fixed.sections[3].body, RECOMMENDATION);
    }
}
