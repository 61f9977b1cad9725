//! Row-level view of the backing sheet.
//!
//! One sheet row may carry an income facet, an expense facet, both, or
//! neither (only uninterpreted cells). The store splits the facets into
//! independent containers on load and rebuilds rows on save.

use crate::{ExpenseRecord, IncomeRecord, records::Extras};

pub const COL_NAME: &str = "Name";
pub const COL_MONTHLY_INCOME: &str = "Monthly Income";
pub const COL_CATEGORY: &str = "Expense Category";
pub const COL_SUBCATEGORY: &str = "Expense SubCategory";
pub const COL_EXPECTED: &str = "Expected";
pub const COL_ACTUALS: &str = "Actuals";
pub const COL_PAYMENT_DATE: &str = "Payment Date";
pub const COL_DUE_DATE: &str = "Due Date";
pub const COL_PAID: &str = "Paid";

/// Known columns, in the order they are written.
pub const COLUMNS: [&str; 9] = [
    COL_NAME,
    COL_MONTHLY_INCOME,
    COL_CATEGORY,
    COL_SUBCATEGORY,
    COL_EXPECTED,
    COL_ACTUALS,
    COL_PAYMENT_DATE,
    COL_DUE_DATE,
    COL_PAID,
];

/// Columns a sheet must have to be loaded. The others default to empty.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_NAME,
    COL_MONTHLY_INCOME,
    COL_CATEGORY,
    COL_SUBCATEGORY,
    COL_EXPECTED,
    COL_ACTUALS,
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub income: Option<IncomeRecord>,
    pub expense: Option<ExpenseRecord>,
    /// Cells of [`Table::extra_columns`], same length and order.
    pub extras: Extras,
}

impl Row {
    pub fn is_empty(&self) -> bool {
        self.income.is_none()
            && self.expense.is_none()
            && self.extras.iter().all(|cell| cell.trim().is_empty())
    }
}

/// Full content of the backing sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    /// Headers outside [`COLUMNS`], in their original order.
    pub extra_columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn individuals(&self) -> impl Iterator<Item = &IncomeRecord> {
        self.rows.iter().filter_map(|row| row.income.as_ref())
    }

    pub fn expenses(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.rows.iter().filter_map(|row| row.expense.as_ref())
    }
}

/// Pads or truncates `extras` to `width` cells.
pub(crate) fn aligned(mut extras: Extras, width: usize) -> Extras {
    extras.resize(width, String::new());
    extras
}
