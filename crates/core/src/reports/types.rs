//! Report data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget figures printed in the report header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBudget {
    /// Fiscal year label.
    pub exercice: String,
    /// Total funds.
    pub montant_total: Decimal,
    /// Available funds.
    pub montant_disponible: Decimal,
}

/// One recette line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueItem {
    /// Source of funds.
    pub source: String,
    /// Recette kind.
    pub type_recette: String,
    /// Amount.
    pub montant: Decimal,
}

/// One validated expense line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseItem {
    /// Expense kind.
    pub type_depense: String,
    /// Category.
    pub categorie: String,
    /// Amount.
    pub montant: Decimal,
}

/// One purchase order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// What was ordered.
    pub designation: String,
    /// Quantity.
    pub quantite: i32,
    /// Order total.
    pub total: Decimal,
}

/// Everything a report shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// Budget header.
    pub budget: ReportBudget,
    /// Period label.
    pub periode: String,
    /// Recettes of the budget.
    pub recettes: Vec<RevenueItem>,
    /// Validated expenses of the budget.
    pub depenses: Vec<ExpenseItem>,
    /// Orders on the budget's lines.
    pub commandes: Vec<OrderItem>,
    /// Name of the generating user.
    pub genere_par_nom: String,
    /// Role label of the generating user.
    pub genere_par_role: String,
    /// Generation instant.
    pub generated_at: DateTime<Utc>,
}

/// Font faces available to the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
    /// Helvetica-Oblique.
    Oblique,
}

/// A line of text placed on the page, in PDF points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// Face.
    pub font: Font,
    /// Size in points.
    pub size: u16,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Text.
    pub text: String,
}

/// A rendered report artifact.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// File name offered on download.
    pub nom_fichier: String,
    /// PDF bytes.
    pub bytes: Vec<u8>,
}
