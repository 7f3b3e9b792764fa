use std::collections::BTreeMap;

use stockcore_index::{CatalogEntry, EntryId};

use crate::{draft_from_row, ProductDraft, RowEdit, RowId, Sheet, SheetRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// An existing row with a blank name was reused.
    Filled(RowId),
    Appended(RowId),
    AlreadySelected(RowId),
    /// The entry has no name to write, nothing was bound.
    Unnamed,
}

impl SelectOutcome {
    pub fn row(&self) -> Option<RowId> {
        match *self {
            SelectOutcome::Filled(row)
            | SelectOutcome::Appended(row)
            | SelectOutcome::AlreadySelected(row) => Some(row),
            SelectOutcome::Unnamed => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    row: RowId,
    name: String,
}

impl Binding {
    fn holds(&self, sheet: &Sheet) -> bool {
        sheet
            .row(self.row)
            .is_some_and(|row| row.name.trim() == self.name)
    }
}

/// Keeps catalog selection and sheet rows in agreement. A binding is keyed
/// by row id; the name written at select time is only used to detect that
/// the operator has since overwritten the row.
#[derive(Debug, Clone, Default)]
pub struct SelectionSync {
    bindings: BTreeMap<EntryId, Binding>,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, sheet: &mut Sheet, entry: &CatalogEntry) -> SelectOutcome {
        if let Some(binding) = self.bindings.get(&entry.id) {
            return SelectOutcome::AlreadySelected(binding.row);
        }

        let name = entry.name.trim();
        if name.is_empty() {
            tracing::debug!(entry = %entry.id, "ignoring selection of unnamed entry");
            return SelectOutcome::Unnamed;
        }

        let rows_before = sheet.len();
        let row_id = sheet.claim_free_row();
        let appended = sheet.len() > rows_before;

        if let Some(row) = sheet.row_mut(row_id) {
            row.name = name.to_string();
            row.category = entry.category.clone().unwrap_or_default();
            row.image_ref = entry.image_ref.clone();
            row.revalidate();
        }

        self.bindings.insert(
            entry.id,
            Binding {
                row: row_id,
                name: name.to_string(),
            },
        );
        tracing::debug!(entry = %entry.id, row = %row_id, appended, "selected entry");

        if appended {
            SelectOutcome::Appended(row_id)
        } else {
            SelectOutcome::Filled(row_id)
        }
    }

    /// Blanks the owned fields of the bound row and frees it for reuse.
    /// Returns false when the entry was not selected.
    pub fn deselect(&mut self, sheet: &mut Sheet, entry_id: EntryId) -> bool {
        let Some(binding) = self.bindings.remove(&entry_id) else {
            return false;
        };
        if let Some(row) = sheet.row_mut(binding.row) {
            row.clear_owned_fields();
            row.revalidate();
        }
        tracing::debug!(entry = %entry_id, row = %binding.row, "deselected entry");
        true
    }

    /// Returns whether the entry is selected afterwards.
    pub fn toggle(&mut self, sheet: &mut Sheet, entry: &CatalogEntry) -> bool {
        if self.is_selected(entry.id) {
            self.deselect(sheet, entry.id);
            false
        } else {
            self.select(sheet, entry).row().is_some()
        }
    }

    /// Accepts a whole new row list from the surface and drops bindings the
    /// edit invalidated. Returns the entries that are no longer selected.
    pub fn on_rows_externally_edited(
        &mut self,
        sheet: &mut Sheet,
        rows: Vec<SheetRow>,
    ) -> Vec<EntryId> {
        sheet.replace_rows(rows);
        self.reconcile(sheet)
    }

    pub fn edit_row(&mut self, sheet: &mut Sheet, row_id: RowId, edit: RowEdit) -> Vec<EntryId> {
        let Some(row) = sheet.row_mut(row_id) else {
            return Vec::new();
        };
        edit.apply(row);
        row.revalidate();
        self.reconcile(sheet)
    }

    pub fn is_selected(&self, entry_id: EntryId) -> bool {
        self.bindings.contains_key(&entry_id)
    }

    pub fn selected_ids(&self) -> Vec<EntryId> {
        self.bindings.keys().copied().collect()
    }

    pub fn bound_row(&self, entry_id: EntryId) -> Option<RowId> {
        self.bindings.get(&entry_id).map(|binding| binding.row)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drafts for every row that passes validation, in sheet order. Blank
    /// rows are skipped, invalid rows stay behind on the sheet.
    pub fn valid_rows(&self, sheet: &Sheet) -> Vec<ProductDraft> {
        sheet
            .rows()
            .iter()
            .filter(|row| row.is_valid)
            .filter_map(|row| draft_from_row(row, self.entry_for_row(row.id)))
            .collect()
    }

    /// Hands over the valid drafts and ends the bulk-add session.
    pub fn commit(&mut self, sheet: &mut Sheet) -> Vec<ProductDraft> {
        let drafts = self.valid_rows(sheet);
        let skipped = sheet
            .rows()
            .iter()
            .filter(|row| !row.is_blank() && !row.is_valid)
            .count();
        tracing::info!(committed = drafts.len(), skipped, "committed sheet");
        self.clear(sheet);
        drafts
    }

    pub fn clear(&mut self, sheet: &mut Sheet) {
        self.bindings.clear();
        sheet.clear();
    }

    fn entry_for_row(&self, row_id: RowId) -> Option<EntryId> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.row == row_id)
            .map(|(id, _)| *id)
    }

    fn reconcile(&mut self, sheet: &Sheet) -> Vec<EntryId> {
        let mut dropped = Vec::new();
        self.bindings.retain(|entry_id, binding| {
            let holds = binding.holds(sheet);
            if !holds {
                tracing::debug!(
                    entry = %entry_id,
                    row = %binding.row,
                    "row no longer carries entry, dropping selection"
                );
                dropped.push(*entry_id);
            }
            holds
        });
        dropped
    }
}
