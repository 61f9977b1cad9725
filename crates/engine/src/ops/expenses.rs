use chrono::NaiveDate;

use crate::{
    Amount, EngineError, ExpenseRecord, ResultEngine,
    codec::TableCodec,
    util::{normalize_required_name, today},
};

use super::{Outcome, RecordStore};

impl<C: TableCodec> RecordStore<C> {
    /// Exact match on `(category, subcategory)`.
    pub fn expense(&self, category: &str, subcategory: &str) -> Option<&ExpenseRecord> {
        self.expenses
            .iter()
            .find(|record| record.matches(category, subcategory))
    }

    /// Sets the expected amount. Paid state is left alone.
    pub fn update_expected(
        &mut self,
        category: &str,
        subcategory: &str,
        value: Amount,
    ) -> ResultEngine<Outcome> {
        let value = value.ensure_non_negative()?;
        let record = self.expense_mut(category, subcategory)?;
        record.expected = value;
        self.commit(
            format!("Updated expected of '{subcategory}' under '{category}' to {value}"),
            0,
        )
    }

    /// Sets the actual amount. Paid state is left alone.
    pub fn update_actual(
        &mut self,
        category: &str,
        subcategory: &str,
        value: Amount,
    ) -> ResultEngine<Outcome> {
        let value = value.ensure_non_negative()?;
        let record = self.expense_mut(category, subcategory)?;
        record.actual = value;
        self.commit(
            format!("Updated actual of '{subcategory}' under '{category}' to {value}"),
            0,
        )
    }

    /// Adds an unpaid expense without dates.
    pub fn add_expense(
        &mut self,
        category: &str,
        subcategory: &str,
        expected: Amount,
        actual: Amount,
    ) -> ResultEngine<Outcome> {
        let category = normalize_required_name(category, "category")?;
        let subcategory = normalize_required_name(subcategory, "subcategory")?;
        let expected = expected.ensure_non_negative()?;
        let actual = actual.ensure_non_negative()?;

        if self.expense(&category, &subcategory).is_some() {
            return Err(EngineError::ExistingKey(format!("{category}/{subcategory}")));
        }

        let message = format!("Added '{subcategory}' under '{category}'");
        let mut record = ExpenseRecord::new(category, subcategory, expected, actual);
        record.extras = self.blank_extras();
        self.expenses.push(record);
        self.commit(message, 0)
    }

    pub fn remove_expense(&mut self, category: &str, subcategory: &str) -> ResultEngine<Outcome> {
        let index = self
            .expenses
            .iter()
            .position(|record| record.matches(category, subcategory))
            .ok_or_else(|| EngineError::KeyNotFound(format!("{category}/{subcategory}")))?;
        self.expenses.remove(index);
        self.commit(format!("Removed '{subcategory}' from '{category}'"), 1)
    }

    /// Marks an expense paid (stamping today) or unpaid (clearing the date).
    pub fn set_paid(
        &mut self,
        category: &str,
        subcategory: &str,
        paid: bool,
    ) -> ResultEngine<Outcome> {
        self.set_paid_on(category, subcategory, paid, today())
    }

    /// [`set_paid`](Self::set_paid) with an explicit payment date.
    pub fn set_paid_on(
        &mut self,
        category: &str,
        subcategory: &str,
        paid: bool,
        today: NaiveDate,
    ) -> ResultEngine<Outcome> {
        let record = self.expense_mut(category, subcategory)?;
        let message = if paid {
            record.mark_paid(today);
            let date = record.payment_date().unwrap_or(today);
            format!("Marked '{subcategory}' under '{category}' paid on {date}")
        } else {
            record.mark_unpaid();
            format!("Marked '{subcategory}' under '{category}' unpaid")
        };
        self.commit(message, 0)
    }

    /// Sets or clears the due date.
    pub fn set_due_date(
        &mut self,
        category: &str,
        subcategory: &str,
        due_date: Option<NaiveDate>,
    ) -> ResultEngine<Outcome> {
        let record = self.expense_mut(category, subcategory)?;
        record.due_date = due_date;
        let message = match due_date {
            Some(date) => format!("'{subcategory}' under '{category}' is due on {date}"),
            None => format!("Cleared due date of '{subcategory}' under '{category}'"),
        };
        self.commit(message, 0)
    }
}
