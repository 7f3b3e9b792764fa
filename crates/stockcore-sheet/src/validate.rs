use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockcore_index::EntryId;

use crate::{DraftKind, ProductDraft, ProductMode, SheetRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RowIssue {
    #[error("product name is required")]
    MissingName,
    #[error("category is required")]
    MissingCategory,
    #[error("selling price is required")]
    MissingPrice,
    #[error("selling price must be greater than zero")]
    NonPositivePrice,
    #[error("buying price cannot be negative")]
    NegativeBuyingPrice,
    #[error("quantity cannot be negative")]
    NegativeQuantity,
    #[error("unit of measure is required for products sold by measure")]
    MissingUnit,
    #[error("at least one variation is required")]
    NoVariants,
    #[error("variation {number} needs a name")]
    UnnamedVariant { number: usize },
    #[error("variation {number} needs a price greater than zero")]
    VariantPrice { number: usize },
}

fn check_price(price: Option<Decimal>, issues: &mut Vec<RowIssue>) {
    match price {
        None => issues.push(RowIssue::MissingPrice),
        Some(price) if price <= Decimal::ZERO => issues.push(RowIssue::NonPositivePrice),
        Some(_) => {}
    }
}

/// Issues in a fixed order so repeated validation yields identical lists.
pub fn validate_row(row: &SheetRow) -> Vec<RowIssue> {
    let mut issues = Vec::new();

    if row.name.trim().is_empty() {
        issues.push(RowIssue::MissingName);
    }
    if row.category.trim().is_empty() {
        issues.push(RowIssue::MissingCategory);
    }

    match &row.mode {
        ProductMode::Normal => check_price(row.selling_price, &mut issues),
        ProductMode::Uncountable { unit } => {
            check_price(row.selling_price, &mut issues);
            if unit.trim().is_empty() {
                issues.push(RowIssue::MissingUnit);
            }
        }
        ProductMode::Variation { variants } => {
            if variants.is_empty() {
                issues.push(RowIssue::NoVariants);
            }
            for (i, variant) in variants.iter().enumerate() {
                if variant.name.trim().is_empty() {
                    issues.push(RowIssue::UnnamedVariant { number: i + 1 });
                }
                if !matches!(variant.price, Some(price) if price > Decimal::ZERO) {
                    issues.push(RowIssue::VariantPrice { number: i + 1 });
                }
            }
        }
    }

    if matches!(row.buying_price, Some(price) if price < Decimal::ZERO) {
        issues.push(RowIssue::NegativeBuyingPrice);
    }
    if matches!(row.quantity, Some(quantity) if quantity < Decimal::ZERO) {
        issues.push(RowIssue::NegativeQuantity);
    }

    issues
}

/// Builds the commit artifact for a row that passes validation.
pub fn draft_from_row(row: &SheetRow, source_entry: Option<EntryId>) -> Option<ProductDraft> {
    if row.is_blank() || !validate_row(row).is_empty() {
        return None;
    }

    let kind = match &row.mode {
        ProductMode::Normal => DraftKind::Normal {
            price: row.selling_price?,
        },
        ProductMode::Uncountable { unit } => DraftKind::Uncountable {
            unit: unit.trim().to_string(),
            price_per_unit: row.selling_price?,
        },
        ProductMode::Variation { variants } => DraftKind::Variation {
            variants: variants
                .iter()
                .map(|v| Some((v.name.trim().to_string(), v.price?)))
                .collect::<Option<Vec<_>>>()?,
        },
    };

    Some(ProductDraft {
        name: row.name.trim().to_string(),
        category: row.category.trim().to_string(),
        image_ref: row.image_ref.clone(),
        kind,
        buying_price: row.buying_price,
        quantity: row.quantity,
        source_entry,
    })
}
