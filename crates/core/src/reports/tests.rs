//! Tests for report layout and rendering.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::service::{DEFAULT_PERIOD, ReportService};
use super::types::{
    ExpenseItem, Font, OrderItem, ReportBudget, ReportSnapshot, RevenueItem,
};

fn snapshot(recettes: usize) -> ReportSnapshot {
    ReportSnapshot {
        budget: ReportBudget {
            exercice: "2025".to_string(),
            montant_total: dec!(1_500_000),
            montant_disponible: dec!(1_250_000),
        },
        periode: "T1".to_string(),
        recettes: (0..recettes)
            .map(|i| RevenueItem {
                source: format!("Source {i}"),
                type_recette: "Subvention".to_string(),
                montant: dec!(500_000),
            })
            .collect(),
        depenses: vec![ExpenseItem {
            type_depense: "Fonctionnement".to_string(),
            categorie: "Fournitures".to_string(),
            montant: dec!(50_000),
        }],
        commandes: vec![OrderItem {
            designation: "Ramettes".to_string(),
            quantite: 10,
            total: dec!(10_000),
        }],
        genere_par_nom: "Awa".to_string(),
        genere_par_role: "Comptable".to_string(),
        generated_at: Utc.with_ymd_and_hms(2025, 3, 31, 17, 5, 0).unwrap(),
    }
}

#[test]
fn test_layout_headings_and_footer() {
    let lines = ReportService::layout(&snapshot(1));
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();

    assert_eq!(texts[0], "RAPPORT FINANCIER - 2025");
    assert_eq!(lines[0].font, Font::Bold);
    assert_eq!(lines[0].y, 800);
    assert!(texts.contains(&"Période : T1"));
    assert!(texts.contains(&"Montant Total : 1,500,000 FCFA"));
    assert!(texts.contains(&"Montant Disponible : 1,250,000 FCFA"));
    assert!(texts.contains(&"Recettes :"));
    assert!(texts.contains(&"- Source 0 (Subvention) : 500,000 FCFA"));
    assert!(texts.contains(&"Dépenses validées :"));
    assert!(texts.contains(&"- Fonctionnement (Fournitures) : 50,000 FCFA"));
    assert!(texts.contains(&"Commandes :"));
    assert!(texts.contains(&"- Ramettes (Qté: 10) : 10,000 FCFA"));

    let footer = lines.last().unwrap();
    assert_eq!(footer.text, "Généré par : Awa (Comptable) - 31/03/2025 17:05");
    assert_eq!(footer.font, Font::Oblique);
}

#[test]
fn test_overflow_is_summarised() {
    let lines = ReportService::layout(&snapshot(200));
    assert!(lines.iter().all(|l| l.y >= 40));
    assert!(
        lines
            .iter()
            .any(|l| l.text.ends_with("élément(s) non affiché(s)"))
    );
}

#[test]
fn test_render_names_file_after_period() {
    let rendered = ReportService::render(&snapshot(2));
    assert_eq!(rendered.nom_fichier, "rapport_2025_T1.pdf");
    assert!(rendered.bytes.starts_with(b"%PDF-1.4"));
}

#[test]
fn test_render_replaces_characters_outside_latin1() {
    let mut snap = snapshot(1);
    snap.periode = "Été 😀 Ω (T1)".to_string();
    snap.recettes[0].source = "Œuvre €".to_string();

    let rendered = ReportService::render(&snap);
    let bytes = &rendered.bytes;
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    assert_eq!(rendered.nom_fichier, "rapport_2025_Été 😀 Ω (T1).pdf");

    let has = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(has(b"(P\xE9riode : \xC9t\xE9 ? ? \\(T1\\)) Tj"));
    assert!(has(b"(- ? ? \\(Subvention\\) : 500,000 FCFA) Tj"));
    assert!(!bytes.contains(&0xF0));
    assert!(!bytes.contains(&0xCE));
}

#[test]
fn test_period_default() {
    assert_eq!(ReportService::period_or_default(None), DEFAULT_PERIOD);
    assert_eq!(ReportService::period_or_default(Some("  ")), DEFAULT_PERIOD);
    assert_eq!(ReportService::period_or_default(Some("Mars")), "Mars");
}

#[test]
fn test_format_amount() {
    assert_eq!(ReportService::format_amount(dec!(0)), "0");
    assert_eq!(ReportService::format_amount(dec!(999)), "999");
    assert_eq!(ReportService::format_amount(dec!(1000)), "1,000");
    assert_eq!(ReportService::format_amount(dec!(1500000.50)), "1,500,000.50");
    assert_eq!(ReportService::format_amount(dec!(-12345)), "-12,345");
}

proptest! {
    /// Removing the separators gives back the plain decimal text.
    #[test]
    fn prop_format_amount_only_adds_commas(n in any::<i64>(), scale in 0u32..4) {
        let amount = Decimal::new(n, scale);
        let formatted = ReportService::format_amount(amount);
        prop_assert_eq!(formatted.replace(',', ""), amount.to_string());
    }
}
