use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::{ProductMode, RowId, SheetRow};

/// One cell edit coming from the tabular surface.
#[derive(Debug, Clone, PartialEq)]
pub enum RowEdit {
    Name(String),
    Category(String),
    ImageRef(Option<String>),
    SellingPrice(Option<Decimal>),
    BuyingPrice(Option<Decimal>),
    Quantity(Option<Decimal>),
    Mode(ProductMode),
}

impl RowEdit {
    pub(crate) fn apply(self, row: &mut SheetRow) {
        match self {
            RowEdit::Name(name) => row.name = name,
            RowEdit::Category(category) => row.category = category,
            RowEdit::ImageRef(image_ref) => row.image_ref = image_ref,
            RowEdit::SellingPrice(price) => row.selling_price = price,
            RowEdit::BuyingPrice(price) => row.buying_price = price,
            RowEdit::Quantity(quantity) => row.quantity = quantity,
            RowEdit::Mode(mode) => row.mode = mode,
        }
    }
}

/// The bulk-add sheet. Rows are created in blank batches and only removed
/// wholesale by `clear` or by replacing the row list.
#[derive(Debug, Clone)]
pub struct Sheet {
    rows: Vec<SheetRow>,
    next_id: u64,
    batch: usize,
}

impl Sheet {
    pub fn with_blank_rows(batch: usize) -> Self {
        let mut sheet = Self {
            rows: Vec::with_capacity(batch),
            next_id: 1,
            batch,
        };
        sheet.append_blank_rows(batch);
        sheet
    }

    pub fn append_blank_rows(&mut self, count: usize) {
        for _ in 0..count {
            let id = self.allocate_id();
            self.rows.push(SheetRow::blank(id));
        }
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&SheetRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Back to a single blank batch with fresh row ids.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.append_blank_rows(self.batch);
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> Option<&mut SheetRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    /// Id of the first row with a blank name, appending one when none is free.
    pub(crate) fn claim_free_row(&mut self) -> RowId {
        if let Some(row) = self.rows.iter().find(|row| row.has_blank_name()) {
            return row.id;
        }
        let id = self.allocate_id();
        self.rows.push(SheetRow::blank(id));
        id
    }

    /// Takes the surface's row list. The first row carrying an id keeps it;
    /// later rows with the same id are given fresh ones.
    pub(crate) fn replace_rows(&mut self, rows: Vec<SheetRow>) {
        let highest = rows.iter().map(|row| row.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest.saturating_add(1));
        self.rows = rows;

        let mut seen = HashSet::with_capacity(self.rows.len());
        for i in 0..self.rows.len() {
            if !seen.insert(self.rows[i].id) {
                let fresh = self.allocate_id();
                tracing::debug!(
                    row = %self.rows[i].id,
                    fresh = %fresh,
                    "renumbered duplicate row id"
                );
                self.rows[i].id = fresh;
                seen.insert(fresh);
            }
            self.rows[i].revalidate();
        }
    }

    fn allocate_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}
