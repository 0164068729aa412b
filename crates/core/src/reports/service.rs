//! Report layout and rendering.

use rust_decimal::Decimal;

use super::pdf;
use super::types::{Font, RenderedReport, ReportSnapshot, TextLine};

/// Period label used when the caller gives none.
pub const DEFAULT_PERIOD: &str = "Période non précisée";

/// Lowest baseline used on the page.
const BOTTOM_MARGIN: i32 = 40;
const LEFT: i32 = 100;
const INDENT: i32 = 120;
const ITEM_STEP: i32 = 15;
const SECTION_GAP: i32 = 30;

/// Report service for building and rendering reports.
pub struct ReportService;

impl ReportService {
    /// Returns the period label, falling back to [`DEFAULT_PERIOD`].
    #[must_use]
    pub fn period_or_default(periode: Option<&str>) -> String {
        match periode.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => DEFAULT_PERIOD.to_string(),
        }
    }

    /// File name for a report: `rapport_{exercice}_{periode}.{extension}`.
    #[must_use]
    pub fn file_name(exercice: &str, periode: &str, extension: &str) -> String {
        format!("rapport_{exercice}_{periode}.{extension}")
    }

    /// Formats an amount with comma thousands separators, keeping its scale.
    #[must_use]
    pub fn format_amount(amount: Decimal) -> String {
        let raw = amount.to_string();
        let (sign, unsigned) = raw
            .strip_prefix('-')
            .map_or(("", raw.as_str()), |rest| ("-", rest));
        let (int_part, frac_part) = unsigned
            .split_once('.')
            .map_or((unsigned, None), |(i, f)| (i, Some(f)));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        match frac_part {
            Some(f) => format!("{sign}{grouped}.{f}"),
            None => format!("{sign}{grouped}"),
        }
    }

    /// Lays the snapshot out on one page.
    ///
    /// Items that would fall below the bottom margin are dropped and counted
    /// in a closing line.
    #[must_use]
    pub fn layout(snapshot: &ReportSnapshot) -> Vec<TextLine> {
        let mut page = Page::default();

        page.put(
            Font::Bold,
            16,
            LEFT,
            800,
            format!("RAPPORT FINANCIER - {}", snapshot.budget.exercice),
        );
        page.put(
            Font::Regular,
            12,
            LEFT,
            780,
            format!("Période : {}", snapshot.periode),
        );
        page.put(
            Font::Regular,
            12,
            LEFT,
            750,
            format!(
                "Montant Total : {} FCFA",
                Self::format_amount(snapshot.budget.montant_total)
            ),
        );
        page.put(
            Font::Regular,
            12,
            LEFT,
            735,
            format!(
                "Montant Disponible : {} FCFA",
                Self::format_amount(snapshot.budget.montant_disponible)
            ),
        );

        let mut y = 700;
        page.section(&mut y, "Recettes :", snapshot.recettes.iter().map(|r| {
            format!(
                "- {} ({}) : {} FCFA",
                r.source,
                r.type_recette,
                Self::format_amount(r.montant)
            )
        }));
        y -= SECTION_GAP;
        page.section(&mut y, "Dépenses validées :", snapshot.depenses.iter().map(|d| {
            format!(
                "- {} ({}) : {} FCFA",
                d.type_depense,
                d.categorie,
                Self::format_amount(d.montant)
            )
        }));
        y -= SECTION_GAP;
        page.section(&mut y, "Commandes :", snapshot.commandes.iter().map(|c| {
            format!(
                "- {} (Qté: {}) : {} FCFA",
                c.designation,
                c.quantite,
                Self::format_amount(c.total)
            )
        }));

        y -= SECTION_GAP;
        let footer = format!(
            "Généré par : {} ({}) - {}",
            snapshot.genere_par_nom,
            snapshot.genere_par_role,
            snapshot.generated_at.format("%d/%m/%Y %H:%M")
        );
        page.finish(y, footer)
    }

    /// Renders the snapshot to a PDF artifact.
    #[must_use]
    pub fn render(snapshot: &ReportSnapshot) -> RenderedReport {
        let lines = Self::layout(snapshot);
        let title = format!("Rapport {}", snapshot.budget.exercice);
        RenderedReport {
            nom_fichier: Self::file_name(&snapshot.budget.exercice, &snapshot.periode, "pdf"),
            bytes: pdf::render(&title, &lines),
        }
    }
}

#[derive(Default)]
struct Page {
    lines: Vec<TextLine>,
    dropped: usize,
}

impl Page {
    fn put(&mut self, font: Font, size: u16, x: i32, y: i32, text: String) {
        self.lines.push(TextLine {
            font,
            size,
            x,
            y,
            text,
        });
    }

    fn fits(y: i32) -> bool {
        y >= BOTTOM_MARGIN + SECTION_GAP
    }

    fn section(&mut self, y: &mut i32, heading: &str, items: impl Iterator<Item = String>) {
        if Self::fits(*y) {
            self.put(Font::Bold, 14, LEFT, *y, heading.to_string());
        }
        for item in items {
            *y -= ITEM_STEP;
            if Self::fits(*y) {
                self.put(Font::Regular, 12, INDENT, *y, item);
            } else {
                self.dropped += 1;
            }
        }
    }

    fn finish(mut self, y: i32, footer: String) -> Vec<TextLine> {
        let footer_y = y.max(BOTTOM_MARGIN);
        if self.dropped > 0 {
            self.put(
                Font::Oblique,
                10,
                LEFT,
                footer_y + ITEM_STEP,
                format!("... {} élément(s) non affiché(s)", self.dropped),
            );
        }
        self.put(Font::Oblique, 10, LEFT, footer_y, footer);
        self.lines
    }
}
