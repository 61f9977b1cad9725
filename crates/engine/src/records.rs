//! Typed records held by the store.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::Amount;

/// Cells of columns the engine does not interpret, aligned with
/// [`Table::extra_columns`](crate::Table::extra_columns).
///
/// They ride along with the record that was read from the same row so a
/// load/save cycle writes them back untouched.
pub type Extras = Vec<String>;

/// Monthly income of one individual.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncomeRecord {
    pub individual: String,
    pub monthly_income: Amount,
    pub last_updated: Option<NaiveDate>,
    #[serde(skip)]
    pub extras: Extras,
}

impl IncomeRecord {
    pub fn new(individual: String, monthly_income: Amount) -> Self {
        Self {
            individual,
            monthly_income,
            last_updated: None,
            extras: Vec::new(),
        }
    }
}

/// Composite key of an [`ExpenseRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpenseKey {
    pub category: String,
    pub subcategory: String,
}

impl ExpenseKey {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

impl fmt::Display for ExpenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subcategory)
    }
}

/// One budgeted expense line.
///
/// `paid` and `payment_date` move together: a paid record always carries a
/// payment date and an unpaid one never does. Only [`ExpenseRecord::mark_paid`]
/// and [`ExpenseRecord::mark_unpaid`] touch them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseRecord {
    pub category: String,
    pub subcategory: String,
    pub expected: Amount,
    pub actual: Amount,
    pub due_date: Option<NaiveDate>,
    paid: bool,
    payment_date: Option<NaiveDate>,
    #[serde(skip)]
    pub extras: Extras,
}

impl ExpenseRecord {
    pub fn new(category: String, subcategory: String, expected: Amount, actual: Amount) -> Self {
        Self {
            category,
            subcategory,
            expected,
            actual,
            due_date: None,
            paid: false,
            payment_date: None,
            extras: Vec::new(),
        }
    }

    /// Builds a record from stored cells.
    ///
    /// The `Paid` cell wins: an unpaid row drops any stored payment date and a
    /// paid row without a date is stamped with `fallback`.
    pub(crate) fn from_stored(
        mut record: ExpenseRecord,
        paid: bool,
        payment_date: Option<NaiveDate>,
        fallback: NaiveDate,
    ) -> Self {
        if paid {
            record.mark_paid(payment_date.unwrap_or(fallback));
        } else {
            record.mark_unpaid();
        }
        record
    }

    pub fn key(&self) -> ExpenseKey {
        ExpenseKey::new(self.category.clone(), self.subcategory.clone())
    }

    pub fn matches(&self, category: &str, subcategory: &str) -> bool {
        self.category == category && self.subcategory == subcategory
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    pub fn payment_date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    /// `Unpaid -> Paid` stamps `today`; an already paid record keeps its date.
    pub fn mark_paid(&mut self, today: NaiveDate) {
        if !self.paid || self.payment_date.is_none() {
            self.payment_date = Some(today);
        }
        self.paid = true;
    }

    pub fn mark_unpaid(&mut self) {
        self.paid = false;
        self.payment_date = None;
    }

    /// Open due: future due date and not yet paid.
    pub fn is_open_due(&self, today: NaiveDate) -> bool {
        !self.paid && self.due_date.is_some_and(|due| due > today)
    }

    /// `actual - expected`; positive means overspent.
    pub fn variance(&self) -> Amount {
        self.actual - self.expected
    }
}
