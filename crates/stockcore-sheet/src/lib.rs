use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockcore_index::EntryId;

mod sheet;
mod sync;
mod validate;

pub use sheet::{RowEdit, Sheet};
pub use sync::{SelectOutcome, SelectionSync};
pub use validate::{draft_from_row, validate_row, RowIssue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantDraft {
    pub name: String,
    pub price: Option<Decimal>,
}

/// How a staged product is sold. Consumers match on it exhaustively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductMode {
    #[default]
    Normal,
    /// Sold by measure, priced per `unit`.
    Uncountable { unit: String },
    /// One product with several priced variations (sizes, flavours).
    Variation { variants: Vec<VariantDraft> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub id: RowId,
    pub name: String,
    pub category: String,
    pub image_ref: Option<String>,
    pub mode: ProductMode,
    pub selling_price: Option<Decimal>,
    pub buying_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub is_valid: bool,
    pub errors: Vec<RowIssue>,
}

impl SheetRow {
    pub fn blank(id: RowId) -> Self {
        Self {
            id,
            name: String::new(),
            category: String::new(),
            image_ref: None,
            mode: ProductMode::Normal,
            selling_price: None,
            buying_price: None,
            quantity: None,
            is_valid: false,
            errors: Vec::new(),
        }
    }

    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Nothing typed into the row at all.
    pub fn is_blank(&self) -> bool {
        self.has_blank_name()
            && self.category.trim().is_empty()
            && self.image_ref.is_none()
            && self.mode == ProductMode::Normal
            && self.selling_price.is_none()
            && self.buying_price.is_none()
            && self.quantity.is_none()
    }

    pub(crate) fn clear_owned_fields(&mut self) {
        self.name.clear();
        self.category.clear();
        self.image_ref = None;
    }

    pub(crate) fn revalidate(&mut self) {
        if self.is_blank() {
            self.errors.clear();
            self.is_valid = false;
        } else {
            self.errors = validate_row(self);
            self.is_valid = self.errors.is_empty();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftKind {
    Normal { price: Decimal },
    Uncountable { unit: String, price_per_unit: Decimal },
    Variation { variants: Vec<(String, Decimal)> },
}

/// A validated row, ready for inventory creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub image_ref: Option<String>,
    pub kind: DraftKind,
    pub buying_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub source_entry: Option<EntryId>,
}
